use std::path::PathBuf;

use storage_contracts::{SchemaError, SolveError};
use storage_types::LoadError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TestingError {
    #[error("scenario not found for '{scenario_name}' in resources/scenarios")]
    ScenarioNotFound { scenario_name: String },
    #[error("invalid scenario '{scenario_name}': {reason}")]
    ScenarioInvalid {
        scenario_name: String,
        reason: String,
    },
    #[error("product not found for '{product_name}' in resources/products")]
    ProductNotFound { product_name: String },
    #[error("invalid product '{product_name}': {source}")]
    ProductInvalid {
        product_name: String,
        source: LoadError,
    },
    #[error("resources io error for {path:?}: {reason}")]
    ResourcesIo { path: PathBuf, reason: String },
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Solve(#[from] SolveError),
    #[error("scenario '{scenario_name}' failed: {reason}")]
    Expectation {
        scenario_name: String,
        reason: String,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TestingError>;
