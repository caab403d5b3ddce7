//! Store en memoria para los tests de integración
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use esim_inventory::client::EsimStore;
use esim_inventory::config::environment::EnvironmentConfig;
use esim_inventory::models::esim::{EsimRecord, EsimUpdate, Estado, NewEsimRecord, Producto};
use esim_inventory::state::AppState;
use esim_inventory::utils::errors::{AppError, AppResult};

/// Tabla en memoria que registra las llamadas recibidas
#[derive(Default)]
pub struct InMemoryStore {
    rows: Mutex<Vec<EsimRecord>>,
    next_id: AtomicI64,
    failing: AtomicBool,
    /// Llamada de insert (1-based) que debe fallar
    fail_insert_call: Mutex<Option<usize>>,
    /// Con la compuerta activa, `select_all` toma la foto de la tabla y
    /// espera a `select_release` antes de devolverla
    select_gated: AtomicBool,
    pub select_started: Notify,
    pub select_release: Notify,
    pub select_calls: AtomicUsize,
    pub insert_calls: Mutex<Vec<usize>>,
    pub update_calls: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicI64::new(1),
            ..Default::default()
        })
    }

    pub fn with_records(records: Vec<NewEsimRecord>) -> Arc<Self> {
        let store = Self::new();
        store.push_all(&records);
        store
    }

    fn push_all(&self, records: &[NewEsimRecord]) {
        let mut rows = self.rows.lock().unwrap();
        for record in records {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            rows.push(EsimRecord {
                id,
                iccid: record.iccid.clone(),
                msisdn: record.msisdn.clone(),
                imsi: record.imsi.clone(),
                pin: record.pin.clone(),
                puk: record.puk.clone(),
                serie: record.serie.clone(),
                asignado_a: record.asignado_a.clone(),
                distribuidor: record.distribuidor.clone(),
                ip: record.ip.clone(),
                producto: record.producto,
                estado: record.estado,
                fecha_creacion: record.fecha_creacion.clone(),
                fecha_ultimo_cambio: record.fecha_ultimo_cambio.clone(),
                image_index: record.image_index.clone(),
            });
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn gate_selects(&self, gated: bool) {
        self.select_gated.store(gated, Ordering::SeqCst);
    }

    pub fn fail_insert_on_call(&self, call: usize) {
        *self.fail_insert_call.lock().unwrap() = Some(call);
    }

    pub fn rows(&self) -> Vec<EsimRecord> {
        self.rows.lock().unwrap().clone()
    }

    pub fn row(&self, id: i64) -> Option<EsimRecord> {
        self.rows().into_iter().find(|r| r.id == id)
    }

    pub fn insert_sizes(&self) -> Vec<usize> {
        self.insert_calls.lock().unwrap().clone()
    }

    fn check_failing(&self, operation: &str) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::ExternalApi(format!("{} falló (503): store caído", operation)));
        }
        Ok(())
    }
}

#[async_trait]
impl EsimStore for InMemoryStore {
    async fn select_all(&self) -> AppResult<Vec<EsimRecord>> {
        self.select_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failing("select")?;

        let mut rows = self.rows();
        rows.sort_by(|a, b| b.id.cmp(&a.id));

        if self.select_gated.load(Ordering::SeqCst) {
            self.select_started.notify_one();
            self.select_release.notified().await;
        }
        Ok(rows)
    }

    async fn insert(&self, records: &[NewEsimRecord]) -> AppResult<usize> {
        let call = {
            let mut calls = self.insert_calls.lock().unwrap();
            calls.push(records.len());
            calls.len()
        };
        self.check_failing("insert")?;
        if *self.fail_insert_call.lock().unwrap() == Some(call) {
            return Err(AppError::ExternalApi(
                "insert falló (409): duplicate key value violates unique constraint".to_string(),
            ));
        }

        self.push_all(records);
        Ok(records.len())
    }

    async fn update(&self, id: i64, fields: &EsimUpdate) -> AppResult<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failing("update")?;

        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
            fields.apply_to(row);
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        self.check_failing("delete")?;
        self.rows.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }
}

pub fn new_record(iccid: &str, msisdn: &str, producto: Producto, estado: Estado, ip: Option<&str>) -> NewEsimRecord {
    NewEsimRecord {
        iccid: iccid.to_string(),
        msisdn: msisdn.to_string(),
        imsi: Some("334140224894044".to_string()),
        pin: Some("1234".to_string()),
        puk: Some("50863044".to_string()),
        serie: Some("9271".to_string()),
        asignado_a: None,
        distribuidor: Some("BAITEL".to_string()),
        ip: ip.map(str::to_string),
        producto,
        estado,
        fecha_creacion: Some("2024-01-01".to_string()),
        fecha_ultimo_cambio: Some("2024-01-01T00:00:00".to_string()),
        image_index: None,
    }
}

/// Cuatro eSIMs: ids 1..=4, las dos últimas usadas
pub fn seed_records() -> Vec<NewEsimRecord> {
    vec![
        new_record("8952140063883316310F", "2219592008", Producto::Mov, Estado::Disponible, Some("CB127")),
        new_record("8952140063883316302F", "2219592007", Producto::Mov, Estado::Disponible, Some("CB127")),
        new_record("8952140063883316294F", "2219592006", Producto::Ip, Estado::Usado, Some("CB200")),
        new_record("8952140063883316286F", "2219592005", Producto::Mov, Estado::Usado, None),
    ]
}

pub fn test_config() -> EnvironmentConfig {
    EnvironmentConfig::from_lookup(|key| match key {
        "SUPABASE_URL" => Some("http://127.0.0.1:9".to_string()),
        "SUPABASE_KEY" => Some("test-key".to_string()),
        // Puerto cerrado: el HEAD del QR falla de inmediato
        "QR_BASE_URL" => Some("http://127.0.0.1:9/".to_string()),
        _ => None,
    })
    .unwrap()
}

pub fn test_state(store: Arc<InMemoryStore>) -> AppState {
    AppState::new(test_config(), store).unwrap()
}
