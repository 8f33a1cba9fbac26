// projeto: bilstm_price
// file: src/main.rs
// CLI driver: train, predict, serve and a synthetic demo

use std::path::{Path, PathBuf};
use std::time::Instant;

use bilstm_price::api::{self, ApiState};
use bilstm_price::config::AppConfig;
use bilstm_price::rna::{PricePredictor, load_prices, synthetic_series};
use clap::{Parser, Subcommand};
use log::{error, info};

#[derive(Parser)]
#[command(name = "bilstm-price", about = "Bidirectional LSTM next-price predictor", version = "0.1.0")]
struct Cli {
    #[arg(long, global = true, help = "TOML configuration file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Sequence length (overrides the configuration)")]
    seq_length: Option<usize>,
    #[arg(long, global = true, help = "Enable debug logging")]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Train on a price file and save the model
    Train {
        #[arg(long, help = "Price file (.json or .toml)")]
        prices: PathBuf,
        #[arg(long, help = "Training epochs")]
        epochs: Option<usize>,
        #[arg(long, help = "Batch size")]
        batch_size: Option<usize>,
        #[arg(long, help = "Fraction of trailing samples held out for validation")]
        validation_split: Option<f64>,
        #[arg(long, help = "Where to save the model")]
        model_path: Option<PathBuf>,
    },
    /// Predict the next price from the tail of a price file
    Predict {
        #[arg(long, help = "Price file (.json or .toml)")]
        prices: PathBuf,
        #[arg(long, help = "Model file to load")]
        model_path: Option<PathBuf>,
    },
    /// Run the HTTP prediction service
    Serve {
        #[arg(long, help = "Bind address")]
        host: Option<String>,
        #[arg(long, help = "Bind port")]
        port: Option<u16>,
    },
    /// Train on a synthetic sine + noise series and predict the next value
    Demo {
        #[arg(long, default_value_t = 20, help = "Training epochs")]
        epochs: usize,
        #[arg(long, default_value_t = 200, help = "Length of the synthetic series")]
        points: usize,
    },
}

fn load_config(cli: &Cli) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(seq_length) = cli.seq_length {
        config.override_sequence_length(seq_length);
    }
    config.validate()?;
    Ok(config)
}

fn train_command(config: &AppConfig, prices: &Path) -> Result<(), Box<dyn std::error::Error>> {
    config.training.validate()?;
    let prices = load_prices(prices)?;
    let mut predictor: PricePredictor = PricePredictor::new(config.predictor.sequence_length)?;

    let start = Instant::now();
    let history = predictor.train(&prices, &config.training)?;
    predictor.save(&config.predictor.model_path)?;

    if let Some(best) = history.best_epoch() {
        info!(
            "🏆 Best epoch {}: loss={:.6} val_loss={}",
            best.epoch,
            best.loss,
            best.val_loss.map_or_else(|| "-".to_string(), |v| format!("{v:.6}"))
        );
    }
    info!("⏱️ Train command finished in {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}

fn predict_command(config: &AppConfig, prices: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let prices = load_prices(prices)?;
    let mut predictor: PricePredictor = PricePredictor::new(config.predictor.sequence_length)?;
    predictor.load(&config.predictor.model_path)?;

    let predicted = predictor.predict(&prices)?;
    if let Some(current) = prices.last() {
        println!("Current price: ${:.2}", current);
    }
    println!("Predicted next price: ${:.2}", predicted);
    Ok(())
}

fn serve_command(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = ApiState::from_config(config)?;
    let host = config.server.host.clone();
    let port = config.server.port;
    actix_web::rt::System::new().block_on(api::serve(state, &host, port))?;
    Ok(())
}

fn demo_command(config: &AppConfig, epochs: usize, points: usize) -> Result<(), Box<dyn std::error::Error>> {
    let sequence_length = config.predictor.sequence_length;
    let prices = synthetic_series(points, config.training.seed);
    info!("🎲 Generated {} synthetic prices", prices.len());

    let mut predictor: PricePredictor = PricePredictor::new(sequence_length)?;
    let training = bilstm_price::TrainingConfig { epochs, ..config.training.clone() };
    predictor.train(&prices, &training)?;
    predictor.save(&config.predictor.model_path)?;

    let recent = &prices[prices.len().saturating_sub(sequence_length)..];
    let predicted = predictor.predict(recent)?;
    if let Some(current) = recent.last() {
        println!("Current price: ${:.2}", current);
    }
    println!("Predicted next price: ${:.2}", predicted);
    Ok(())
}

fn print_banner() {
    println!("BiLSTM Price Prediction Model");
    println!("==================================================");
    println!("Run with --help to see the train, predict, serve and demo commands.");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if cli.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info })
        .format_timestamp_secs()
        .init();

    let mut config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("❌ Configuration error: {}", e);
            return Err(e);
        }
    };

    let result = match cli.command {
        None => {
            print_banner();
            Ok(())
        }
        Some(Commands::Train { prices, epochs, batch_size, validation_split, model_path }) => {
            if let Some(epochs) = epochs {
                config.training.epochs = epochs;
            }
            if let Some(batch_size) = batch_size {
                config.training.batch_size = batch_size;
            }
            if let Some(split) = validation_split {
                config.training.validation_split = split;
            }
            if let Some(path) = model_path {
                config.predictor.model_path = path;
            }
            train_command(&config, &prices)
        }
        Some(Commands::Predict { prices, model_path }) => {
            if let Some(path) = model_path {
                config.predictor.model_path = path;
            }
            predict_command(&config, &prices)
        }
        Some(Commands::Serve { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve_command(&config)
        }
        Some(Commands::Demo { epochs, points }) => demo_command(&config, epochs, points),
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("❌ Command failed: {}", e);
            Err(e)
        }
    }
}
