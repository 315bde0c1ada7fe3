use serde::Serialize;

/// Population served by the catchment
pub const POPULATION: u64 = 1_120_000;

/// Per-capita consumption, liters per person per day
pub const PER_CAPITA_DEMAND_L_PER_DAY: f64 = 180.0;

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Liters per cubic meter
pub const LITERS_PER_M3: f64 = 1000.0;

/// Flow in m³/s expressed as liters per second.
///
/// Every place that reports flow in L/s goes through here.
pub fn to_liters_per_second(flow_m3s: f64) -> f64 {
    flow_m3s * LITERS_PER_M3
}

/// Supply and demand figures handed to the narrative step.
///
/// No comparison or alerting happens here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WaterBalance {
    pub supply_lps: f64,
    pub population: u64,
    pub per_capita_demand_l_per_day: f64,
    pub demand_lps: f64,
}

impl WaterBalance {
    pub fn from_flow(flow_m3s: f64) -> Self {
        Self {
            supply_lps: to_liters_per_second(flow_m3s),
            population: POPULATION,
            per_capita_demand_l_per_day: PER_CAPITA_DEMAND_L_PER_DAY,
            demand_lps: demand_lps(),
        }
    }

    /// Total demand in liters per day
    pub fn daily_demand_liters(&self) -> f64 {
        self.population as f64 * self.per_capita_demand_l_per_day
    }
}

pub fn demand_lps() -> f64 {
    POPULATION as f64 * PER_CAPITA_DEMAND_L_PER_DAY / SECONDS_PER_DAY
}
