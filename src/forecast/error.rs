use thiserror::Error;

use super::adapter::Variable;
use super::model::ModelError;

/// Failures of a single forecast request
#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Invalid target month '{0}', expected YYYY-MM")]
    InvalidDate(String),

    #[error("Flow horizon of {horizon} months is outside 1..=12")]
    InvalidHorizon { horizon: i32 },

    #[error("{variable} model failed: {source}")]
    Model {
        variable: Variable,
        #[source]
        source: ModelError,
    },
}
