use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::forecast::{FlowAdapter, LevelAdapter, ModelError, SarimaModel, SeasonalModel};
use crate::importers::monthly_csv::{
    MISSING_VALUE_MARKER, PRECIPITATION_COLUMN, TEMPERATURE_COLUMN,
};
use crate::importers::{
    CsvImportError, FlowWorkbookImporter, MonthlyCsvImporter, WorkbookImportError,
};
use crate::series::TimeSeries;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Flow data: {0}")]
    Workbook(#[from] WorkbookImportError),

    #[error("Climate data: {0}")]
    Csv(#[from] CsvImportError),

    #[error("Model: {0}")]
    Model(#[from] ModelError),
}

/// Historical series and fitted models, loaded once at startup.
///
/// Read-only for the lifetime of the process and shared across requests
/// behind an `Arc`; adapters borrow from it per request.
pub struct AppContext {
    pub flow_series: TimeSeries,
    pub temperature_series: TimeSeries,
    pub precipitation_series: TimeSeries,
    pub flow_model: Box<dyn SeasonalModel>,
    pub temperature_model: Box<dyn SeasonalModel>,
    pub precipitation_model: Box<dyn SeasonalModel>,
}

impl AppContext {
    /// Load every series and model named by the configuration.
    ///
    /// This is synchronous file IO; async callers should use spawn_blocking.
    pub fn load(config: &Config) -> Result<Self, LoadError> {
        info!("Loading historical series and models");

        let flow_series = FlowWorkbookImporter::new(&config.flow_data_path)
            .with_sheet(config.flow_sheet.clone())
            .load_log_series()?;
        let temperature_series =
            MonthlyCsvImporter::new(&config.temperature_data_path, TEMPERATURE_COLUMN)
                .with_missing_marker(MISSING_VALUE_MARKER)
                .load("temperatura")?;
        let precipitation_series =
            MonthlyCsvImporter::new(&config.precipitation_data_path, PRECIPITATION_COLUMN)
                .load("precipitacion")?;

        let context = Self {
            flow_series,
            temperature_series,
            precipitation_series,
            flow_model: Box::new(SarimaModel::from_path(&config.flow_model_path)?),
            temperature_model: Box::new(SarimaModel::from_path(&config.temperature_model_path)?),
            precipitation_model: Box::new(SarimaModel::from_path(
                &config.precipitation_model_path,
            )?),
        };

        info!(
            "Context ready: flow anchor {}, temperature anchor {}, precipitation anchor {}",
            context.flow_series.anchor(),
            context.temperature_series.anchor(),
            context.precipitation_series.anchor()
        );
        Ok(context)
    }

    pub fn flow_adapter(&self) -> FlowAdapter<'_> {
        FlowAdapter::new(&self.flow_series, self.flow_model.as_ref())
    }

    pub fn temperature_adapter(&self) -> LevelAdapter<'_> {
        LevelAdapter::temperature(&self.temperature_series, self.temperature_model.as_ref())
    }

    pub fn precipitation_adapter(&self) -> LevelAdapter<'_> {
        LevelAdapter::precipitation(&self.precipitation_series, self.precipitation_model.as_ref())
    }
}
