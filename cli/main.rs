#![deny(unused_variables)]
#![deny(unused_imports)]

use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use heartnet::config::{ScoringMethod, TrainingConfig};
use heartnet::predict::{FormData, PredictionResponse, Predictor};
use heartnet::train::train_and_save;

#[derive(Clone, Copy, ValueEnum)]
enum ScoringCli {
    K2,
    Bdeu,
    Bic,
}

impl From<ScoringCli> for ScoringMethod {
    fn from(value: ScoringCli) -> Self {
        match value {
            ScoringCli::K2 => ScoringMethod::K2,
            ScoringCli::Bdeu => ScoringMethod::Bdeu,
            ScoringCli::Bic => ScoringMethod::Bic,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "heartnet",
    about = "Learn and query a Bayesian network for heart-disease risk",
    long_about = "Trains a discrete Bayesian network on binned clinical measurements and \
                 estimates the probability of heart disease for a single patient."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Learn a network from a CSV file
    #[command(about = "Train a network (outputs: model.toml)")]
    Train {
        /// Path to the training CSV with the eleven feature columns and HeartDisease
        data: PathBuf,

        /// Optional TOML training configuration
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Where to write the trained model
        #[arg(long, default_value = "model.toml")]
        output: PathBuf,

        /// Override the resampling seed
        #[arg(long)]
        seed: Option<u64>,

        /// Override the structure score
        #[arg(long, value_enum)]
        scoring: Option<ScoringCli>,

        /// Override the maximum number of parents per node
        #[arg(long, value_name = "N")]
        max_indegree: Option<usize>,
    },

    /// Estimate the risk for one patient
    #[command(about = "Score one patient given FIELD=VALUE pairs")]
    Predict {
        /// Path to a trained model file (.toml)
        #[arg(long, default_value = "model.toml")]
        model: PathBuf,

        /// An application/x-www-form-urlencoded body, merged before the pairs
        #[arg(long, value_name = "BODY")]
        form: Option<String>,

        /// Print the response as TOML instead of plain text
        #[arg(long)]
        toml: bool,

        /// Patient fields such as Age=65 ChestPainType=ASY
        fields: Vec<String>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Train {
            data,
            config,
            output,
            seed,
            scoring,
            max_indegree,
        } => train_command(&data, config.as_deref(), &output, seed, scoring, max_indegree),
        Commands::Predict {
            model,
            form,
            toml,
            fields,
        } => predict_command(&model, form.as_deref(), &fields, toml),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn train_command(
    data_path: &Path,
    config_path: Option<&Path>,
    output_path: &Path,
    seed: Option<u64>,
    scoring: Option<ScoringCli>,
    max_indegree: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match config_path {
        Some(path) => {
            println!("Loading configuration from: {}", path.display());
            TrainingConfig::load(path)?
        }
        None => TrainingConfig::default(),
    };
    if let Some(seed) = seed {
        config.resample.seed = seed;
    }
    if let Some(scoring) = scoring {
        config.structure.scoring = scoring.into();
    }
    if max_indegree.is_some() {
        config.structure.max_indegree = max_indegree;
    }
    config.validate()?;

    println!("Loading training data from: {}", data_path.display());
    let package = train_and_save(data_path, &config, output_path)?;

    let edges = package.network.edges();
    println!("Learned {} edges:", edges.len());
    for (from, to) in edges {
        println!("  {from} -> {to}");
    }
    println!("Model saved to: {}", output_path.display());
    Ok(())
}

fn predict_command(
    model_path: &Path,
    body: Option<&str>,
    fields: &[String],
    as_toml: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let predictor = Predictor::load(model_path)?;

    let mut form = body.map(FormData::from_urlencoded).unwrap_or_default();
    for (key, value) in FormData::from_assignments(fields)?.iter() {
        form.insert(key, value);
    }

    let response = predictor.predict(&form);
    if as_toml {
        print!("{}", toml::to_string(&response)?);
    } else {
        print!("{response}");
    }
    if matches!(response, PredictionResponse::Failure { .. }) {
        io::stdout().flush()?;
        process::exit(1);
    }
    Ok(())
}
