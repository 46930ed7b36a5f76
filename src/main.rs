//! pv-predict - command line front end for the prediction engine.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

use pv_pollution_predictor::config::Config;
use pv_pollution_predictor::controller::{PredictionSession, SubmitResult};
use pv_pollution_predictor::domain::{
    BatchFile, ComparisonMode, Coordinates, HistoryView, PredictionMode,
};
use pv_pollution_predictor::forecast::{pm25_impact_curve, RawInputs};
use pv_pollution_predictor::telemetry::init_tracing;

#[derive(Parser)]
#[command(
    name = "pv-predict",
    version,
    about = "Solar output predictions under PM2.5 pollution"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Predict AC power for one set of conditions (two with --penalty-pm25)
    Predict(PredictArgs),

    /// Upload a CSV to the batch endpoint and save the returned predictions
    Batch {
        /// Input CSV file
        file: PathBuf,

        /// Directory the `predictions_<file>` artifact is written to
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// Current solar zenith and PM2.5 readings for a location
    Readings {
        /// Latitude; falls back to the configured location
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude; falls back to the configured location
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// Historical actual output for a year, month or day
    History {
        #[arg(long, default_value = "daily")]
        view: HistoryView,

        #[arg(long)]
        year: i32,

        #[arg(long, default_value_t = 1)]
        month: u32,

        #[arg(long, default_value_t = 1)]
        day: u32,
    },

    /// Illustrative output decay over PM2.5 0-150
    Curve,

    /// Backend health check
    Health,
}

#[derive(Args)]
struct PredictArgs {
    #[arg(long, default_value = "location")]
    mode: PredictionMode,

    /// PM2.5 concentration (µg/m³)
    #[arg(long)]
    pm25: f64,

    /// Scenario 2 PM2.5; enables penalty comparison
    #[arg(long)]
    penalty_pm25: Option<f64>,

    #[arg(long)]
    pm25_lag1: Option<f64>,
    #[arg(long)]
    ac_power_lag1: Option<f64>,
    #[arg(long)]
    power_factor_lag1: Option<f64>,
    #[arg(long)]
    hour: Option<u32>,
    #[arg(long)]
    month: Option<u32>,

    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Surface shortwave irradiance (W/m²)
    #[arg(long)]
    irradiance: Option<f64>,
    /// Clearness index
    #[arg(long)]
    kt: Option<f64>,
    /// Air temperature at 2 m (°C)
    #[arg(long, allow_hyphen_values = true)]
    t2m: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    t2m_lag1: Option<f64>,
    /// Solar zenith angle (degrees)
    #[arg(long)]
    sza: Option<f64>,
    /// Wind speed at 10 m (m/s)
    #[arg(long)]
    ws10m: Option<f64>,

    /// Panel area in m²; adds the farm total in kW
    #[arg(long)]
    area: Option<f64>,
}

impl PredictArgs {
    fn comparison(&self) -> ComparisonMode {
        if self.penalty_pm25.is_some() {
            ComparisonMode::Penalty
        } else {
            ComparisonMode::Single
        }
    }

    fn inputs(&self) -> RawInputs {
        RawInputs {
            pm25: self.pm25,
            pm25_scenario_two: self.penalty_pm25,
            pm25_lag1: self.pm25_lag1,
            ac_power_lag1: self.ac_power_lag1,
            power_factor_lag1: self.power_factor_lag1,
            hour: self.hour,
            month: self.month,
            latitude: self.lat,
            longitude: self.lon,
            surface_irradiance: self.irradiance,
            clearness_index: self.kt,
            temperature_c: self.t2m,
            temperature_lag1_c: self.t2m_lag1,
            solar_zenith_deg: self.sza,
            wind_speed_ms: self.ws10m,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let cfg = Config::load().context("loading configuration")?;
    let session = PredictionSession::from_config(&cfg)?;

    match cli.command {
        Command::Predict(args) => {
            let result = session
                .submit(&args.inputs(), args.mode, args.comparison())
                .await?;
            let farm = match (&result, args.area) {
                (SubmitResult::Prediction { outcome, .. }, Some(area)) => {
                    outcome.farm_output_kw(area)
                }
                _ => None,
            };
            print_json(&json!({ "result": result, "farm": farm }))?;
        }
        Command::Batch { file, out } => {
            let upload = BatchFile::read(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            session.select_batch_file(upload).await?;
            let artifact = session.submit_batch().await?;
            let path = artifact
                .save_to(&out)
                .await
                .with_context(|| format!("writing into {}", out.display()))?;
            info!(path = %path.display(), "batch predictions saved");
            print_json(&json!({
                "artifact": artifact.filename,
                "content_type": artifact.content_type,
                "path": path,
            }))?;
        }
        Command::Readings { lat, lon } => {
            let coords = match (lat, lon) {
                (Some(lat), Some(lon)) => {
                    let coords = Coordinates::new(lat, lon);
                    session.set_coordinates(coords).await;
                    let _ = tokio::join!(session.reload_sza(), session.reload_pm25());
                    Some(coords)
                }
                _ => session.locate_and_load_readings().await,
            };
            let snapshot = session.state().snapshot().await;
            print_json(&json!({
                "coordinates": coords,
                "readings": snapshot.readings,
                "notifications": snapshot.notifications,
            }))?;
        }
        Command::History {
            view,
            year,
            month,
            day,
        } => {
            let points = session.history(view, year, month, day).await?;
            print_json(&points)?;
        }
        Command::Curve => print_json(&pm25_impact_curve())?,
        Command::Health => print_json(&session.health().await?)?,
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
