use serde::{Serialize, Serializer};
use std::fmt;
use tracing::{debug, info};

use super::error::ForecastError;
use super::horizon::{forecast_steps, horizon, HorizonPolicy, TargetMonth};
use super::model::{ModelError, SeasonalModel};
use crate::series::TimeSeries;

/// Text shown in place of an estimate that could not be produced
pub const UNAVAILABLE: &str = "No disponible";

/// Converts a per-observation precipitation mean into a monthly figure
pub const PRECIPITATION_MONTHLY_FACTOR: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    Flow,
    Temperature,
    Precipitation,
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Variable::Flow => "caudal",
            Variable::Temperature => "temperatura",
            Variable::Precipitation => "precipitacion",
        };
        f.write_str(name)
    }
}

/// A point estimate, or the marker that the horizon policy ruled it out
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ForecastEstimate {
    Value(f64),
    Unavailable,
}

impl fmt::Display for ForecastEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForecastEstimate::Value(v) => write!(f, "{v}"),
            ForecastEstimate::Unavailable => f.write_str(UNAVAILABLE),
        }
    }
}

impl Serialize for ForecastEstimate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ForecastEstimate::Value(v) => serializer.serialize_f64(*v),
            ForecastEstimate::Unavailable => serializer.serialize_str(UNAVAILABLE),
        }
    }
}

/// Round to two decimals from the exact binary value, ties to even
pub fn round2(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

/// Log path implied by forecast first differences: `last_log + cumsum(diffs)`
pub fn reconstruct_log_path(last_log: f64, diffs: &[f64]) -> Vec<f64> {
    diffs
        .iter()
        .scan(last_log, |acc, d| {
            *acc += d;
            Some(*acc)
        })
        .collect()
}

/// Resolve a horizon into forecast steps under a policy.
///
/// `Ok(None)` means the variable is unavailable; only a mandatory
/// series turns an out-of-range horizon into an error.
pub fn resolve_steps(
    variable: Variable,
    policy: HorizonPolicy,
    horizon: i32,
) -> Result<Option<usize>, ForecastError> {
    match (forecast_steps(horizon), policy) {
        (Some(steps), _) => Ok(Some(steps)),
        (None, HorizonPolicy::Mandatory) => Err(ForecastError::InvalidHorizon { horizon }),
        (None, HorizonPolicy::Optional) => {
            info!("{} horizon {} out of range, estimate unavailable", variable, horizon);
            Ok(None)
        }
    }
}

fn run_model(
    variable: Variable,
    model: &dyn SeasonalModel,
    steps: usize,
) -> Result<Vec<f64>, ForecastError> {
    let mut values = model
        .forecast(steps)
        .map_err(|source| ForecastError::Model { variable, source })?;

    if values.len() < steps {
        return Err(ForecastError::Model {
            variable,
            source: ModelError::ShortForecast {
                requested: steps,
                produced: values.len(),
            },
        });
    }
    values.truncate(steps);

    if let Some(step) = values.iter().position(|v| !v.is_finite()) {
        return Err(ForecastError::Model {
            variable,
            source: ModelError::NonFiniteForecast { step: step + 1 },
        });
    }

    Ok(values)
}

/// Flow forecast over the log composite series.
///
/// The model forecasts first differences of the log series; the level is
/// recovered as `exp(last_log + sum(diffs[..h]))`. The horizon is mandatory.
pub struct FlowAdapter<'a> {
    series: &'a TimeSeries,
    model: &'a dyn SeasonalModel,
}

impl<'a> FlowAdapter<'a> {
    pub fn new(series: &'a TimeSeries, model: &'a dyn SeasonalModel) -> Self {
        Self { series, model }
    }

    pub fn horizon(&self, target: TargetMonth) -> i32 {
        horizon(target, self.series.anchor())
    }

    /// Flow level in the series' native unit (m³/s), rounded to 2 decimals
    pub fn estimate(&self, target: TargetMonth) -> Result<f64, ForecastError> {
        let horizon = self.horizon(target);
        let steps = resolve_steps(Variable::Flow, HorizonPolicy::Mandatory, horizon)?
            .ok_or(ForecastError::InvalidHorizon { horizon })?;

        let diffs = run_model(Variable::Flow, self.model, steps)?;
        let log_path = reconstruct_log_path(self.series.last_value(), &diffs);
        let predicted_log = log_path[log_path.len() - 1];
        let level = predicted_log.exp();

        if !level.is_finite() {
            return Err(ForecastError::Model {
                variable: Variable::Flow,
                source: ModelError::NonFiniteForecast { step: steps },
            });
        }

        debug!(
            "Flow horizon {} from anchor {}: log {:.4} -> {:.4}, level {:.4}",
            horizon,
            self.series.anchor(),
            self.series.last_value(),
            predicted_log,
            level
        );
        Ok(round2(level))
    }
}

/// Level forecast (temperature, precipitation) with an optional horizon.
///
/// The model's mean at the final horizon is rounded to 2 decimals and then
/// multiplied by the adapter's calibration scale.
pub struct LevelAdapter<'a> {
    variable: Variable,
    series: &'a TimeSeries,
    model: &'a dyn SeasonalModel,
    scale: f64,
}

impl<'a> LevelAdapter<'a> {
    pub fn new(variable: Variable, series: &'a TimeSeries, model: &'a dyn SeasonalModel) -> Self {
        Self {
            variable,
            series,
            model,
            scale: 1.0,
        }
    }

    pub fn temperature(series: &'a TimeSeries, model: &'a dyn SeasonalModel) -> Self {
        Self::new(Variable::Temperature, series, model)
    }

    pub fn precipitation(series: &'a TimeSeries, model: &'a dyn SeasonalModel) -> Self {
        Self::new(Variable::Precipitation, series, model).with_scale(PRECIPITATION_MONTHLY_FACTOR)
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn horizon(&self, target: TargetMonth) -> i32 {
        horizon(target, self.series.anchor())
    }

    pub fn estimate(&self, target: TargetMonth) -> Result<ForecastEstimate, ForecastError> {
        let horizon = self.horizon(target);
        let Some(steps) = resolve_steps(self.variable, HorizonPolicy::Optional, horizon)? else {
            return Ok(ForecastEstimate::Unavailable);
        };

        let means = run_model(self.variable, self.model, steps)?;
        let mean = means[steps - 1];
        debug!(
            "{} horizon {} from anchor {}: mean {:.4}",
            self.variable,
            horizon,
            self.series.anchor(),
            mean
        );

        Ok(ForecastEstimate::Value(round2(mean) * self.scale))
    }
}
