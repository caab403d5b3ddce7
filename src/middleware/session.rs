//! Sesión de vista del cliente
//!
//! Cada cliente manda su id de sesión en `x-session-id`; el estado de la
//! vista (modo, modo oscuro, detalles abiertos) se guarda por sesión.

use axum::http::{HeaderMap, HeaderName};

/// Header con el id de sesión del cliente
pub const SESSION_HEADER: HeaderName = HeaderName::from_static("x-session-id");

/// Sesión usada cuando el cliente no manda el header
pub const DEFAULT_SESSION: &str = "default";

/// Largo máximo aceptado para un id de sesión
const MAX_SESSION_LEN: usize = 128;

/// Extraer el id de sesión; un header ausente, vacío o inválido cae en la
/// sesión por defecto
pub fn session_id(headers: &HeaderMap) -> String {
    headers
        .get(&SESSION_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= MAX_SESSION_LEN)
        .unwrap_or(DEFAULT_SESSION)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_id_from_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_id(&headers), DEFAULT_SESSION);

        headers.insert(SESSION_HEADER, HeaderValue::from_static(" navegador-a "));
        assert_eq!(session_id(&headers), "navegador-a");

        headers.insert(SESSION_HEADER, HeaderValue::from_static("   "));
        assert_eq!(session_id(&headers), DEFAULT_SESSION);
    }
}
