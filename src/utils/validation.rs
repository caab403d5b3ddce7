//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! de formularios y de celdas importadas.

use validator::ValidationError;

/// Validar que un string no esté vacío
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_empty");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Una celda importada sin valor: vacía, solo espacios o el literal `nan`
/// que dejan algunas herramientas al exportar huecos.
pub fn is_missing_cell(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan")
}

/// Convertir una celda opcional en `None` cuando no tiene valor
pub fn normalize_optional_cell(value: Option<&str>) -> Option<String> {
    match value {
        Some(v) if !is_missing_cell(v) => Some(v.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("8952140063883316310F").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank("   ").is_err());
    }

    #[test]
    fn test_missing_cells() {
        assert!(is_missing_cell(""));
        assert!(is_missing_cell(" "));
        assert!(is_missing_cell("nan"));
        assert!(is_missing_cell("NaN"));
        assert!(!is_missing_cell("nano"));
        assert!(!is_missing_cell("0"));
    }

    #[test]
    fn test_normalize_optional_cell() {
        assert_eq!(normalize_optional_cell(Some("CB127")), Some("CB127".to_string()));
        assert_eq!(normalize_optional_cell(Some("nan")), None);
        assert_eq!(normalize_optional_cell(Some("")), None);
        assert_eq!(normalize_optional_cell(None), None);
    }
}
