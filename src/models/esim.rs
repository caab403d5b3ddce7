//! Modelo de eSIM
//!
//! Este módulo contiene el struct EsimRecord y sus variantes parciales para
//! las operaciones CRUD. Mapea exactamente a la tabla `esim_data` del store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Distribuidor por defecto en altas manuales
pub const DEFAULT_DISTRIBUIDOR: &str = "BAITEL";

/// PIN por defecto en altas manuales
pub const DEFAULT_PIN: &str = "1234";

/// Formato de `fecha_creacion`
pub const FECHA_CREACION_FORMAT: &str = "%Y-%m-%d";

/// Producto de la eSIM
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Producto {
    #[serde(rename = "MOV")]
    Mov,
    #[serde(rename = "IP")]
    Ip,
}

impl Producto {
    pub const ALL: [Producto; 2] = [Producto::Mov, Producto::Ip];

    pub fn as_str(&self) -> &'static str {
        match self {
            Producto::Mov => "MOV",
            Producto::Ip => "IP",
        }
    }
}

impl fmt::Display for Producto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Producto {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "MOV" => Ok(Producto::Mov),
            "IP" => Ok(Producto::Ip),
            other => Err(format!("Producto inválido: {}", other)),
        }
    }
}

/// Estado de la eSIM - define el color en la vista de tarjetas
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Estado {
    Disponible,
    Usado,
}

impl Estado {
    pub const ALL: [Estado; 2] = [Estado::Disponible, Estado::Usado];

    pub fn as_str(&self) -> &'static str {
        match self {
            Estado::Disponible => "Disponible",
            Estado::Usado => "Usado",
        }
    }

    /// Color de la tarjeta y de la etiqueta de estado
    pub fn color(&self) -> &'static str {
        match self {
            Estado::Disponible => "#27ae60",
            Estado::Usado => "#e74c3c",
        }
    }
}

impl fmt::Display for Estado {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Estado {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Disponible" => Ok(Estado::Disponible),
            "Usado" => Ok(Estado::Usado),
            other => Err(format!("Estado inválido: {}", other)),
        }
    }
}

/// Registro de inventario - una fila de `esim_data`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EsimRecord {
    pub id: i64,
    pub iccid: String,
    pub msisdn: String,
    #[serde(default)]
    pub imsi: Option<String>,
    #[serde(default)]
    pub pin: Option<String>,
    #[serde(default)]
    pub puk: Option<String>,
    #[serde(default)]
    pub serie: Option<String>,
    #[serde(default)]
    pub asignado_a: Option<String>,
    #[serde(default)]
    pub distribuidor: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    pub producto: Producto,
    pub estado: Estado,
    #[serde(default)]
    pub fecha_creacion: Option<String>,
    #[serde(default)]
    pub fecha_ultimo_cambio: Option<String>,
    #[serde(default)]
    pub image_index: Option<String>,
}

impl EsimRecord {
    /// Pares (columna, valor) en el orden de la tabla.
    ///
    /// Los campos ausentes se proyectan como cadena vacía. Es la base de la
    /// búsqueda de texto libre y de la exportación.
    pub fn field_strings(&self) -> Vec<(&'static str, String)> {
        fn opt(value: &Option<String>) -> String {
            value.clone().unwrap_or_default()
        }

        vec![
            ("id", self.id.to_string()),
            ("iccid", self.iccid.clone()),
            ("msisdn", self.msisdn.clone()),
            ("imsi", opt(&self.imsi)),
            ("pin", opt(&self.pin)),
            ("puk", opt(&self.puk)),
            ("serie", opt(&self.serie)),
            ("asignado_a", opt(&self.asignado_a)),
            ("distribuidor", opt(&self.distribuidor)),
            ("ip", opt(&self.ip)),
            ("producto", self.producto.to_string()),
            ("estado", self.estado.to_string()),
            ("fecha_creacion", opt(&self.fecha_creacion)),
            ("fecha_ultimo_cambio", opt(&self.fecha_ultimo_cambio)),
            ("image_index", opt(&self.image_index)),
        ]
    }
}

/// Columnas exportadas, en el mismo orden que `field_strings`
pub const RECORD_COLUMNS: [&str; 15] = [
    "id",
    "iccid",
    "msisdn",
    "imsi",
    "pin",
    "puk",
    "serie",
    "asignado_a",
    "distribuidor",
    "ip",
    "producto",
    "estado",
    "fecha_creacion",
    "fecha_ultimo_cambio",
    "image_index",
];

/// Registro parcial para insertar; el store asigna el id.
///
/// Todos los campos se serializan (los ausentes como `null`) para que un
/// insert en lote tenga siempre las mismas columnas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewEsimRecord {
    pub iccid: String,
    pub msisdn: String,
    pub imsi: Option<String>,
    pub pin: Option<String>,
    pub puk: Option<String>,
    pub serie: Option<String>,
    pub asignado_a: Option<String>,
    pub distribuidor: Option<String>,
    pub ip: Option<String>,
    pub producto: Producto,
    pub estado: Estado,
    pub fecha_creacion: Option<String>,
    pub fecha_ultimo_cambio: Option<String>,
    pub image_index: Option<String>,
}

impl NewEsimRecord {
    /// Completar las fechas que falten con el instante `now`
    pub fn stamp_missing_dates(&mut self, now: chrono::DateTime<chrono::Local>) {
        if self.fecha_creacion.is_none() {
            self.fecha_creacion = Some(now.format(FECHA_CREACION_FORMAT).to_string());
        }
        if self.fecha_ultimo_cambio.is_none() {
            self.fecha_ultimo_cambio = Some(now.naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string());
        }
    }
}

/// Actualización parcial por id; los campos `None` no se envían
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EsimUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iccid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msisdn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imsi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub puk: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serie: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asignado_a: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribuidor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producto: Option<Producto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<Estado>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_ultimo_cambio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_index: Option<String>,
}

impl EsimUpdate {
    pub fn is_empty(&self) -> bool {
        *self == EsimUpdate::default()
    }

    /// Sellar `fecha_ultimo_cambio` antes de enviar la actualización
    pub fn stamped(mut self, now: chrono::DateTime<chrono::Local>) -> Self {
        self.fecha_ultimo_cambio = Some(now.naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string());
        self
    }

    /// Aplicar la actualización sobre un registro existente
    pub fn apply_to(&self, record: &mut EsimRecord) {
        macro_rules! set {
            ($($field:ident),*) => {
                $(if let Some(value) = &self.$field { record.$field = value.clone(); })*
            };
        }
        macro_rules! set_opt {
            ($($field:ident),*) => {
                $(if let Some(value) = &self.$field { record.$field = Some(value.clone()); })*
            };
        }
        set!(iccid, msisdn, producto, estado);
        set_opt!(imsi, pin, puk, serie, asignado_a, distribuidor, ip, fecha_ultimo_cambio, image_index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> EsimRecord {
        EsimRecord {
            id: 7,
            iccid: "8952140063883316310F".to_string(),
            msisdn: "2219592008".to_string(),
            imsi: Some("334140224894044".to_string()),
            pin: Some("1234".to_string()),
            puk: Some("50863044".to_string()),
            serie: Some("9271".to_string()),
            asignado_a: None,
            distribuidor: Some("BAITEL".to_string()),
            ip: Some("CB127".to_string()),
            producto: Producto::Mov,
            estado: Estado::Disponible,
            fecha_creacion: Some("2024-01-01".to_string()),
            fecha_ultimo_cambio: None,
            image_index: None,
        }
    }

    #[test]
    fn test_enums_serialize_as_store_values() {
        assert_eq!(serde_json::to_string(&Producto::Mov).unwrap(), "\"MOV\"");
        assert_eq!(serde_json::to_string(&Producto::Ip).unwrap(), "\"IP\"");
        assert_eq!(serde_json::to_string(&Estado::Usado).unwrap(), "\"Usado\"");
        assert_eq!("Disponible".parse::<Estado>(), Ok(Estado::Disponible));
        assert!("disponible".parse::<Estado>().is_err());
        assert!("mov".parse::<Producto>().is_err());
    }

    #[test]
    fn test_record_deserializes_with_nulls() {
        let json = serde_json::json!({
            "id": 1,
            "iccid": "A",
            "msisdn": "B",
            "asignado_a": null,
            "producto": "IP",
            "estado": "Usado"
        });
        let record: EsimRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.producto, Producto::Ip);
        assert!(record.imsi.is_none());
        assert!(record.asignado_a.is_none());
    }

    #[test]
    fn test_field_strings_cover_every_column() {
        let fields = sample().field_strings();
        let names: Vec<_> = fields.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, RECORD_COLUMNS.to_vec());
        assert_eq!(fields[7].1, "");
    }

    #[test]
    fn test_update_skips_absent_fields() {
        let update = EsimUpdate {
            asignado_a: Some("Juan".to_string()),
            estado: Some(Estado::Usado),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"asignado_a": "Juan", "estado": "Usado"}));

        let mut record = sample();
        update.apply_to(&mut record);
        assert_eq!(record.asignado_a.as_deref(), Some("Juan"));
        assert_eq!(record.estado, Estado::Usado);
        assert_eq!(record.msisdn, "2219592008");
    }

    #[test]
    fn test_stamp_missing_dates_keeps_existing() {
        let now = chrono::Local.with_ymd_and_hms(2025, 3, 9, 10, 30, 0).unwrap();
        let mut record = NewEsimRecord {
            iccid: "X".to_string(),
            msisdn: "Y".to_string(),
            imsi: None,
            pin: None,
            puk: None,
            serie: None,
            asignado_a: None,
            distribuidor: None,
            ip: None,
            producto: Producto::Mov,
            estado: Estado::Disponible,
            fecha_creacion: Some("2024-01-01".to_string()),
            fecha_ultimo_cambio: None,
            image_index: None,
        };
        record.stamp_missing_dates(now);
        assert_eq!(record.fecha_creacion.as_deref(), Some("2024-01-01"));
        assert!(record
            .fecha_ultimo_cambio
            .as_deref()
            .unwrap()
            .starts_with("2025-03-09T10:30:00"));
    }
}
