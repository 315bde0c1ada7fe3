pub mod adapter;
pub mod error;
pub mod horizon;
pub mod model;

pub use adapter::{
    round2, FlowAdapter, ForecastEstimate, LevelAdapter, Variable, PRECIPITATION_MONTHLY_FACTOR,
    UNAVAILABLE,
};
pub use error::ForecastError;
pub use horizon::{horizon, HorizonPolicy, TargetMonth, MAX_HORIZON, MIN_HORIZON};
pub use model::{ModelError, SarimaModel, SeasonalModel};
