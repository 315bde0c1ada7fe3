#![allow(dead_code)]

use chrono::NaiveDate;
use hydro_forecast_service::config::NarrativeConfig;
use hydro_forecast_service::context::AppContext;
use hydro_forecast_service::forecast::{ModelError, SeasonalModel};
use hydro_forecast_service::narrative::NarrativeGenerator;
use hydro_forecast_service::series::{Observation, TimeSeries};
use hydro_forecast_service::services::ForecastOrchestrator;
use std::sync::Arc;

/// Last observed composite flow (m³/s) of the fixture flow series
pub const LAST_FLOW: f64 = 3.0;

/// Constant monthly log-difference returned by the fixture flow model
pub const FLOW_DIFF: f64 = 0.1;

pub const TEMPERATURE_MEANS: [f64; 3] = [8.456, 9.123, 9.987];
pub const PRECIPITATION_MEANS: [f64; 3] = [3.14159, 2.71828, 4.0];

/// Model returning a fixed sequence regardless of its input
pub struct Fixed(pub Vec<f64>);

impl SeasonalModel for Fixed {
    fn forecast(&self, steps: usize) -> Result<Vec<f64>, ModelError> {
        Ok(self.0.iter().copied().cycle().take(steps).collect())
    }
}

/// Model that always fails
pub struct Failing;

impl SeasonalModel for Failing {
    fn forecast(&self, _steps: usize) -> Result<Vec<f64>, ModelError> {
        Err(ModelError::NonFiniteForecast { step: 1 })
    }
}

/// Monthly series of `len` points ending at the anchor month
pub fn monthly_series(name: &str, anchor: (i32, u32), len: u32, last: f64) -> TimeSeries {
    let (year, month) = anchor;
    let anchor_index = year * 12 + month as i32 - 1;
    let observations = (0..len)
        .map(|i| {
            let idx = anchor_index - (len - 1 - i) as i32;
            Observation {
                date: NaiveDate::from_ymd_opt(idx.div_euclid(12), idx.rem_euclid(12) as u32 + 1, 1)
                    .unwrap(),
                value: if i == len - 1 { last } else { last - 0.1 },
            }
        })
        .collect();
    TimeSeries::new(name, observations).unwrap()
}

pub fn context(flow_anchor: (i32, u32), temp_anchor: (i32, u32), prec_anchor: (i32, u32)) -> AppContext {
    AppContext {
        flow_series: monthly_series("caudal", flow_anchor, 6, LAST_FLOW.ln()),
        temperature_series: monthly_series("temperatura", temp_anchor, 6, 9.0),
        precipitation_series: monthly_series("precipitacion", prec_anchor, 6, 3.0),
        flow_model: Box::new(Fixed(vec![FLOW_DIFF])),
        temperature_model: Box::new(Fixed(TEMPERATURE_MEANS.to_vec())),
        precipitation_model: Box::new(Fixed(PRECIPITATION_MEANS.to_vec())),
    }
}

pub fn narrative_config(base_url: &str) -> NarrativeConfig {
    NarrativeConfig {
        api_key: "sk-test".to_string(),
        base_url: base_url.to_string(),
        model: "openai/chatgpt-4o-latest".to_string(),
        referer: "https://example.org".to_string(),
        title: "Prediccion Hidrica".to_string(),
        timeout_secs: 5,
        max_retries: 1,
    }
}

pub fn orchestrator(context: AppContext, base_url: &str) -> ForecastOrchestrator {
    let narrative = NarrativeGenerator::new(narrative_config(base_url)).unwrap();
    ForecastOrchestrator::new(Arc::new(context), narrative)
}

/// Expected flow in L/s for a horizon under the fixture flow model
pub fn expected_flow_lps(horizon: usize) -> f64 {
    let mut log = LAST_FLOW.ln();
    for _ in 0..horizon {
        log += FLOW_DIFF;
    }
    round2(log.exp()) * 1000.0
}

pub fn round2(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap()
}

/// Chat completions body with a single message
pub fn completion_body(content: &str) -> String {
    serde_json::json!({
        "id": "gen-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
    .to_string()
}
