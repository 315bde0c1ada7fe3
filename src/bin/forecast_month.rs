use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hydro_forecast_service::config::Config;
use hydro_forecast_service::context::AppContext;
use hydro_forecast_service::forecast::TargetMonth;
use hydro_forecast_service::narrative::NarrativeGenerator;
use hydro_forecast_service::services::ForecastOrchestrator;

#[derive(Parser, Debug)]
#[command(name = "forecast-month")]
#[command(about = "Forecast flow, temperature and precipitation for one month and print the report", long_about = None)]
struct Cli {
    /// Target month (YYYY-MM)
    #[arg(long, env = "FORECAST_MONTH")]
    fecha: String,

    /// Print only the numeric estimates, without calling the narrative provider
    #[arg(long)]
    estimates_only: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    let load_config = config.clone();
    let context = tokio::task::spawn_blocking(move || AppContext::load(&load_config)).await??;
    let narrative = NarrativeGenerator::new(config.narrative.clone())?;
    let orchestrator = ForecastOrchestrator::new(Arc::new(context), narrative);

    if cli.estimates_only {
        let target = TargetMonth::parse(&cli.fecha)?;
        let estimates = orchestrator.estimate(target)?;
        let context = orchestrator.context();

        println!("Target month:   {target}");
        println!(
            "Anchors:        caudal {}, temperatura {}, precipitacion {}",
            context.flow_series.anchor(),
            context.temperature_series.anchor(),
            context.precipitation_series.anchor()
        );
        println!("Flow:           {} m³/s", estimates.flow_m3s);
        println!("Temperature:    {}", estimates.temperature);
        println!("Precipitation:  {}", estimates.precipitation);
        return Ok(());
    }

    let report = orchestrator.predict(&cli.fecha).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
