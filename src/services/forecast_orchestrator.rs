use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::balance::WaterBalance;
use crate::context::AppContext;
use crate::forecast::{ForecastError, ForecastEstimate, TargetMonth};
use crate::narrative::{NarrativeBrief, NarrativeGenerator};

/// Result record returned for one forecast request
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ForecastReport {
    /// Target month, `YYYY-MM`
    #[serde(rename = "fecha")]
    #[schema(example = "2025-03")]
    pub target: String,

    /// Estimated flow in liters per second
    #[serde(rename = "caudal_estimado")]
    pub flow_lps: f64,

    /// Mean temperature (°C) or "No disponible"
    #[serde(rename = "temperatura")]
    #[schema(value_type = Object)]
    pub temperature: ForecastEstimate,

    /// Monthly precipitation (mm) or "No disponible"
    #[serde(rename = "precipitacion")]
    #[schema(value_type = Object)]
    pub precipitation: ForecastEstimate,

    /// Narrative risk report, or a description of why it could not be produced
    #[serde(rename = "analisis_ia")]
    pub analysis: String,
}

/// The three per-variable estimates for one target month
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimates {
    /// Flow level in m³/s, rounded to 2 decimals
    pub flow_m3s: f64,
    pub temperature: ForecastEstimate,
    pub precipitation: ForecastEstimate,
}

/// Runs the forecast pipeline for a single request.
///
/// Every call recomputes from the shared read-only context; nothing is
/// cached between requests.
#[derive(Clone)]
pub struct ForecastOrchestrator {
    context: Arc<AppContext>,
    narrative: NarrativeGenerator,
}

impl ForecastOrchestrator {
    pub fn new(context: Arc<AppContext>, narrative: NarrativeGenerator) -> Self {
        Self { context, narrative }
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// Parse the month, forecast, balance, and narrate.
    ///
    /// Fails only on a malformed month, an out-of-range flow horizon, or a
    /// model fault; narrative failures are folded into `analysis`.
    #[instrument(skip(self))]
    pub async fn predict(&self, raw_month: &str) -> Result<ForecastReport, ForecastError> {
        let target = TargetMonth::parse(raw_month)?;
        let estimates = self.estimate(target)?;

        let balance = WaterBalance::from_flow(estimates.flow_m3s);
        info!(
            "Estimates for {}: flow {} l/s, temperature {}, precipitation {}",
            target, balance.supply_lps, estimates.temperature, estimates.precipitation
        );

        let brief = NarrativeBrief::new(
            target,
            balance,
            estimates.precipitation,
            estimates.temperature,
        );
        let analysis = self.narrative.generate(&brief).await;

        Ok(ForecastReport {
            target: target.to_string(),
            flow_lps: balance.supply_lps,
            temperature: estimates.temperature,
            precipitation: estimates.precipitation,
            analysis,
        })
    }

    /// Per-variable estimates; the flow horizon is checked first
    pub fn estimate(&self, target: TargetMonth) -> Result<Estimates, ForecastError> {
        let flow_m3s = self.context.flow_adapter().estimate(target)?;
        let temperature = self.context.temperature_adapter().estimate(target)?;
        let precipitation = self.context.precipitation_adapter().estimate(target)?;

        Ok(Estimates {
            flow_m3s,
            temperature,
            precipitation,
        })
    }
}
