//! Importación masiva desde CSV / Excel
//!
//! Lectura del archivo subido, validación de su forma y alta por lotes.
//! Una validación fallida rechaza el archivo completo: no hay importación
//! parcial de un lote inválido.

use calamine::{open_workbook_from_rs, Data, Range, Reader, Xls, Xlsx};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read, Seek};

use crate::models::esim::{Estado, NewEsimRecord, Producto};
use crate::repositories::EsimRepository;
use crate::utils::errors::{AppError, AppResult};
use crate::utils::validation::{is_missing_cell, normalize_optional_cell};

/// Filas por llamada de insert; coincide con el límite del store
pub const IMPORT_CHUNK_SIZE: usize = 1000;

/// Columnas que debe traer todo archivo de importación
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "iccid", "msisdn", "imsi", "pin", "puk", "serie", "producto", "estado",
];

/// Columnas opcionales que se normalizan a ausente cuando vienen vacías
pub const OPTIONAL_COLUMNS: [&str; 6] = [
    "asignado_a",
    "distribuidor",
    "ip",
    "fecha_creacion",
    "fecha_ultimo_cambio",
    "image_index",
];

/// Duplicados listados como máximo en el mensaje de rechazo
const MAX_REPORTED_VALUES: usize = 5;

/// Datos tabulares leídos de un archivo: cabecera y filas de texto
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ImportTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Valores de una columna; las filas cortas aportan cadena vacía
    pub fn column_values(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }
}

/// Motivo estructurado del rechazo de un archivo
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum RejectReason {
    MissingColumns(Vec<String>),
    DuplicateIccids(Vec<String>),
    MissingIccid,
    MissingMsisdn,
    InvalidEstado(Vec<String>),
    InvalidProducto(Vec<String>),
}

/// Resultado de `validate_import`
#[derive(Debug, Clone, Serialize)]
pub struct ImportValidation {
    pub valid: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
    /// Registros normalizados, solo cuando `valid`
    #[serde(skip)]
    pub records: Vec<NewEsimRecord>,
}

impl ImportValidation {
    fn rejected(reason: RejectReason, message: String) -> Self {
        Self {
            valid: false,
            message,
            reason: Some(reason),
            records: Vec::new(),
        }
    }
}

/// Resultado de la importación por lotes
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImportSummary {
    pub ok: bool,
    pub message: String,
    pub imported: usize,
    /// Tamaño de cada lote insertado con éxito
    pub batches: Vec<usize>,
}

/// Formatos de archivo aceptados, detectados por extensión
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Csv,
    Xlsx,
    Xls,
}

impl ImportFormat {
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let extension = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(ImportFormat::Csv),
            "xlsx" => Some(ImportFormat::Xlsx),
            "xls" => Some(ImportFormat::Xls),
            _ => None,
        }
    }
}

/// Leer un archivo subido a una tabla de texto
pub fn parse_import_file(file_name: &str, bytes: &[u8]) -> AppResult<ImportTable> {
    let format = ImportFormat::from_file_name(file_name).ok_or_else(|| {
        AppError::BadRequest(format!(
            "❌ Formato no soportado: {}. Usa CSV o Excel (.xlsx)",
            file_name
        ))
    })?;

    log::info!("📤 Leyendo archivo de importación: {} ({:?})", file_name, format);

    match format {
        ImportFormat::Csv => parse_csv(bytes),
        ImportFormat::Xlsx => {
            let workbook = open_workbook_from_rs::<Xlsx<_>, _>(Cursor::new(bytes))
                .map_err(|e| AppError::Spreadsheet(e.to_string()))?;
            read_first_sheet(workbook)
        }
        ImportFormat::Xls => {
            let workbook = open_workbook_from_rs::<Xls<_>, _>(Cursor::new(bytes))
                .map_err(|e| AppError::Spreadsheet(e.to_string()))?;
            read_first_sheet(workbook)
        }
    }
}

fn parse_csv(bytes: &[u8]) -> AppResult<ImportTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let row: Vec<String> = record?.iter().map(str::to_string).collect();
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        rows.push(row);
    }

    Ok(ImportTable::new(columns, rows))
}

fn read_first_sheet<R, RS>(mut workbook: R) -> AppResult<ImportTable>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| AppError::Spreadsheet("El archivo no tiene hojas".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| AppError::Spreadsheet(format!("No se pudo leer la hoja {}: {}", sheet_name, e)))?;

    Ok(table_from_range(&range))
}

fn table_from_range(range: &Range<Data>) -> ImportTable {
    let mut rows = range.rows();

    let columns = match rows.next() {
        Some(header) => header.iter().map(|c| cell_to_string(c).trim().to_string()).collect(),
        None => return ImportTable::default(),
    };

    let rows = rows
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .collect();

    ImportTable::new(columns, rows)
}

/// Texto de una celda; los números enteros no arrastran `.0`
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Valores distintos, en orden de aparición, hasta `MAX_REPORTED_VALUES`
fn first_distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .take(MAX_REPORTED_VALUES)
        .map(str::to_string)
        .collect()
}

/// Validar la forma del archivo antes de importar.
///
/// Las comprobaciones se hacen en orden y se detienen en el primer fallo.
pub fn validate_import(table: &ImportTable) -> ImportValidation {
    // 1. Columnas requeridas
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| table.column_index(col).is_none())
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        let message = format!("❌ Faltan columnas requeridas: {}", missing.join(", "));
        return ImportValidation::rejected(RejectReason::MissingColumns(missing), message);
    }

    let column = |name: &str| table.column_values(name).unwrap_or_default();
    let iccids = column("iccid");
    let msisdns = column("msisdn");
    let estados = column("estado");
    let productos = column("producto");

    // 2. ICCIDs duplicados (los vacíos se reportan en el paso 3)
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for iccid in iccids.iter().filter(|v| !is_missing_cell(v)) {
        *counts.entry(*iccid).or_default() += 1;
    }
    let duplicates = first_distinct(
        iccids
            .iter()
            .copied()
            .filter(|v| counts.get(v).copied().unwrap_or(0) > 1),
    );
    if !duplicates.is_empty() {
        let message = format!(
            "❌ Hay ICCIDs duplicados en el archivo: {}",
            duplicates.join(", ")
        );
        return ImportValidation::rejected(RejectReason::DuplicateIccids(duplicates), message);
    }

    // 3. ICCID vacío
    if iccids.iter().any(|v| is_missing_cell(v)) {
        return ImportValidation::rejected(
            RejectReason::MissingIccid,
            "❌ Hay registros sin ICCID".to_string(),
        );
    }

    // 4. MSISDN vacío
    if msisdns.iter().any(|v| is_missing_cell(v)) {
        return ImportValidation::rejected(
            RejectReason::MissingMsisdn,
            "❌ Hay registros sin MSISDN".to_string(),
        );
    }

    // 5. Estados permitidos
    let invalid_estados = first_distinct(estados.iter().copied().filter(|v| v.parse::<Estado>().is_err()));
    if !invalid_estados.is_empty() {
        let allowed: Vec<&str> = Estado::ALL.iter().map(Estado::as_str).collect();
        let message = format!(
            "❌ Estados inválidos encontrados. Solo se permiten: {}",
            allowed.join(", ")
        );
        return ImportValidation::rejected(RejectReason::InvalidEstado(invalid_estados), message);
    }

    // 6. Productos permitidos
    let invalid_productos =
        first_distinct(productos.iter().copied().filter(|v| v.parse::<Producto>().is_err()));
    if !invalid_productos.is_empty() {
        let allowed: Vec<&str> = Producto::ALL.iter().map(Producto::as_str).collect();
        let message = format!(
            "❌ Productos inválidos encontrados. Solo se permiten: {}",
            allowed.join(", ")
        );
        return ImportValidation::rejected(RejectReason::InvalidProducto(invalid_productos), message);
    }

    let records = build_records(table);
    ImportValidation {
        valid: true,
        message: format!("✅ Datos válidos: {} registros", records.len()),
        reason: None,
        records,
    }
}

/// Convertir las filas ya validadas en registros para insertar
fn build_records(table: &ImportTable) -> Vec<NewEsimRecord> {
    let index: HashMap<&str, usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();

    table
        .rows
        .iter()
        .filter_map(|row| {
            let cell = |name: &str| {
                index
                    .get(name)
                    .map(|&i| row.get(i).map(String::as_str).unwrap_or(""))
            };
            let text = |name: &str| cell(name).unwrap_or("").to_string();
            let optional = |name: &str| normalize_optional_cell(cell(name));

            Some(NewEsimRecord {
                iccid: text("iccid"),
                msisdn: text("msisdn"),
                imsi: Some(text("imsi")),
                pin: Some(text("pin")),
                puk: Some(text("puk")),
                serie: Some(text("serie")),
                asignado_a: optional("asignado_a"),
                distribuidor: optional("distribuidor"),
                ip: optional("ip"),
                producto: text("producto").parse().ok()?,
                estado: text("estado").parse().ok()?,
                fecha_creacion: optional("fecha_creacion"),
                fecha_ultimo_cambio: optional("fecha_ultimo_cambio"),
                image_index: optional("image_index"),
            })
        })
        .collect()
}

/// Insertar registros validados en lotes de `IMPORT_CHUNK_SIZE`.
///
/// Se sellan las fechas que falten. La importación se detiene en el primer
/// lote fallido y reporta cuántos registros entraron antes.
pub async fn bulk_import(
    repository: &EsimRepository,
    mut records: Vec<NewEsimRecord>,
    now: DateTime<Local>,
) -> ImportSummary {
    for record in records.iter_mut() {
        record.stamp_missing_dates(now);
    }

    let total_batches = records.len().div_ceil(IMPORT_CHUNK_SIZE);
    let mut imported = 0usize;
    let mut batches = Vec::with_capacity(total_batches);

    for (i, chunk) in records.chunks(IMPORT_CHUNK_SIZE).enumerate() {
        log::info!("📦 Importando lote {}/{} ({} registros)", i + 1, total_batches, chunk.len());

        let result = repository.insert(chunk.to_vec()).await;
        if !result.ok {
            log::error!("❌ Lote {} rechazado: {}", i + 1, result.message);
            return ImportSummary {
                ok: false,
                message: format!(
                    "❌ Error importando lote {}: {} ({} registros importados antes del error)",
                    i + 1,
                    result.message,
                    imported
                ),
                imported,
                batches,
            };
        }

        imported += result.count.unwrap_or(chunk.len());
        batches.push(chunk.len());
    }

    ImportSummary {
        ok: true,
        message: format!("✅ {} registros importados exitosamente", imported),
        imported,
        batches,
    }
}
