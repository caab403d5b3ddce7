//! Generación de archivos Excel
//!
//! Plantilla de importación con filas de ejemplo y exportación del listado
//! filtrado. Los dos se generan en memoria.

use chrono::{DateTime, Local};
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::models::esim::{EsimRecord, RECORD_COLUMNS};
use crate::utils::errors::AppResult;

pub const TEMPLATE_SHEET_NAME: &str = "eSIM Template";
pub const EXPORT_SHEET_NAME: &str = "eSIM Data";
pub const TEMPLATE_FILE_NAME: &str = "plantilla_esims.xlsx";

/// Tipo MIME de los archivos `.xlsx`
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Columnas de la plantilla, en orden
pub const TEMPLATE_COLUMNS: [&str; 14] = [
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

const TEMPLATE_ROWS: [[&str; 14]; 2] = [
    [
        "8952140063883316310F",
        "2219592008",
        "334140224894044",
        "1234",
        "50863044",
        "9271",
        "",
        "BAITEL",
        "CB127",
        "MOV",
        "Disponible",
        "2024-01-01",
        "2024-01-01",
        "",
    ],
    [
        "8952140063883316302F",
        "2219592007",
        "334140224894036",
        "1234",
        "50863036",
        "9270",
        "",
        "BAITEL",
        "CB127",
        "MOV",
        "Disponible",
        "2024-01-01",
        "2024-01-01",
        "",
    ],
];

/// Escribir cabecera y filas como texto; las celdas vacías se omiten
fn write_sheet<S: AsRef<str>>(
    sheet: &mut Worksheet,
    columns: &[&str],
    rows: impl Iterator<Item = Vec<S>>,
) -> AppResult<()> {
    let header_format = Format::new().set_bold();

    for (col, name) in columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &header_format)?;
    }

    for (i, row) in rows.enumerate() {
        let excel_row = (i + 1) as u32;
        for (col, value) in row.iter().enumerate() {
            let value = value.as_ref();
            if value.is_empty() {
                continue;
            }
            sheet.write_string(excel_row, col as u16, value)?;
        }
    }

    sheet.autofit();
    Ok(())
}

/// Plantilla de importación con dos filas de ejemplo
pub fn generate_template() -> AppResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(TEMPLATE_SHEET_NAME)?;

    write_sheet(
        sheet,
        &TEMPLATE_COLUMNS,
        TEMPLATE_ROWS.iter().map(|row| row.to_vec()),
    )?;

    let bytes = workbook.save_to_buffer()?;
    log::info!("📄 Plantilla generada ({} bytes)", bytes.len());
    Ok(bytes)
}

/// Exportar registros con todas sus columnas
pub fn export_records(records: &[EsimRecord]) -> AppResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(EXPORT_SHEET_NAME)?;

    write_sheet(
        sheet,
        &RECORD_COLUMNS,
        records.iter().map(|record| {
            record
                .field_strings()
                .into_iter()
                .map(|(_, value)| value)
                .collect::<Vec<String>>()
        }),
    )?;

    let bytes = workbook.save_to_buffer()?;
    log::info!("📥 Exportados {} registros ({} bytes)", records.len(), bytes.len());
    Ok(bytes)
}

/// Nombre del archivo exportado, con marca de tiempo
pub fn export_file_name(now: DateTime<Local>) -> String {
    format!("esim_data_{}.xlsx", now.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::esim::{Estado, Producto};
    use crate::services::import_service::{parse_import_file, validate_import};
    use chrono::TimeZone;

    #[test]
    fn test_template_passes_import_validation() {
        let bytes = generate_template().unwrap();
        let table = parse_import_file("plantilla.xlsx", &bytes).unwrap();

        assert_eq!(table.columns, TEMPLATE_COLUMNS.to_vec());
        assert_eq!(table.len(), 2);

        let validation = validate_import(&table);
        assert!(validation.valid, "{}", validation.message);

        let first = &validation.records[0];
        assert_eq!(first.iccid, "8952140063883316310F");
        assert_eq!(first.msisdn, "2219592008");
        assert_eq!(first.asignado_a, None);
        assert_eq!(first.producto, Producto::Mov);
        assert_eq!(first.estado, Estado::Disponible);
        assert_eq!(validation.records[1].puk.as_deref(), Some("50863036"));
    }

    #[test]
    fn test_export_keeps_all_columns() {
        let record = EsimRecord {
            id: 12,
            iccid: "8952140063883316310F".to_string(),
            msisdn: "2219592008".to_string(),
            imsi: None,
            pin: Some("1234".to_string()),
            puk: None,
            serie: None,
            asignado_a: Some("Tienda Centro".to_string()),
            distribuidor: Some("BAITEL".to_string()),
            ip: Some("CB127".to_string()),
            producto: Producto::Ip,
            estado: Estado::Usado,
            fecha_creacion: Some("2024-01-01".to_string()),
            fecha_ultimo_cambio: None,
            image_index: None,
        };

        let bytes = export_records(&[record]).unwrap();
        let table = parse_import_file("export.xlsx", &bytes).unwrap();

        assert_eq!(table.columns, RECORD_COLUMNS.to_vec());
        assert_eq!(table.len(), 1);
        assert_eq!(table.column_values("asignado_a"), Some(vec!["Tienda Centro"]));
        assert_eq!(table.column_values("estado"), Some(vec!["Usado"]));
    }

    #[test]
    fn test_export_file_name() {
        let now = Local.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(export_file_name(now), "esim_data_20250309_140507.xlsx");
    }
}
