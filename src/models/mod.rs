//! Modelos del sistema
//!
//! Este módulo contiene los modelos de datos que mapean a la tabla
//! `esim_data` y el estado explícito de la vista.

pub mod esim;
pub mod stats;
pub mod view_state;

pub use esim::*;
