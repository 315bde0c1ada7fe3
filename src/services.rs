pub mod forecast_orchestrator;

pub use forecast_orchestrator::{Estimates, ForecastOrchestrator, ForecastReport};
