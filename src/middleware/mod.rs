//! Middleware del sistema
//!
//! Este módulo contiene la configuración de CORS del router y la lectura
//! de la sesión de vista del cliente.

pub mod cors;
pub mod session;

pub use cors::*;
pub use session::*;
