pub mod esim_dto;

pub use esim_dto::*;
