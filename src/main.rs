//! diabetes-predict - post one set of diabetes features to a prediction endpoint
//! and print what it answers.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use diabetes_predict::{DEFAULT_ENDPOINT, PredictionClient, PredictionRequest, SenderConfig};

#[derive(Parser)]
#[command(name = "diabetes-predict")]
#[command(version)]
#[command(about = "Send diabetes feature values to a prediction endpoint", long_about = None)]
struct Cli {
    /// Prediction endpoint URL
    #[arg(long, env = "DIABETES_PREDICT_URL", default_value = DEFAULT_ENDPOINT)]
    url: String,

    /// Request timeout in milliseconds (unbounded when omitted)
    #[arg(long, env = "DIABETES_PREDICT_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Send `Content-Type: application/json` with the payload
    #[arg(long)]
    json_content_type: bool,

    #[arg(long)]
    pregnancies: Option<u32>,

    #[arg(long)]
    glucose: Option<u32>,

    #[arg(long)]
    blood_pressure: Option<u32>,

    #[arg(long)]
    skin_thickness: Option<u32>,

    #[arg(long)]
    insulin: Option<u32>,

    /// Body-mass index
    #[arg(long)]
    bmi: Option<f64>,

    /// Diabetes pedigree function
    #[arg(long)]
    pedigree: Option<f64>,

    #[arg(long)]
    age: Option<u32>,

    /// Log verbosity on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// The sample record with any feature flags applied over it.
    fn record(&self) -> PredictionRequest {
        let sample = PredictionRequest::sample();
        PredictionRequest {
            pregnancies: self.pregnancies.unwrap_or(sample.pregnancies),
            glucose: self.glucose.unwrap_or(sample.glucose),
            blood_pressure: self.blood_pressure.unwrap_or(sample.blood_pressure),
            skin_thickness: self.skin_thickness.unwrap_or(sample.skin_thickness),
            insulin: self.insulin.unwrap_or(sample.insulin),
            bmi: self.bmi.unwrap_or(sample.bmi),
            diabetes_pedigree_function: self.pedigree.unwrap_or(sample.diabetes_pedigree_function),
            age: self.age.unwrap_or(sample.age),
        }
    }

    fn sender_config(&self) -> SenderConfig {
        let config = SenderConfig::new(self.url.as_str()).with_json_content_type(self.json_content_type);
        match self.timeout_ms {
            Some(ms) => config.with_timeout(Duration::from_millis(ms)),
            None => config,
        }
    }

    fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let client = PredictionClient::new(cli.sender_config());
    let mut stdout = std::io::stdout().lock();
    diabetes_predict::run(&client, &cli.record(), &mut stdout)
        .await
        .with_context(|| format!("prediction request to {} failed", cli.url))?;
    Ok(())
}
