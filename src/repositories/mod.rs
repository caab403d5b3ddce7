pub mod esim_repository;

pub use esim_repository::{EsimRepository, LoadResult, OperationResult};
