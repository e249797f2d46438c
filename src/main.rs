use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mcq_sleuth::{
    evaluate_corpus, load_corpus, log_filter, CalibratedConfig, CalibrationThresholds,
    Calibrator, Evaluator, RuleLibrary,
};

#[derive(Parser)]
#[command(
    name = "mcq-sleuth",
    about = "Guess multiple-choice answers from text patterns alone",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the rule chain over a corpus and print the accuracy report
    Evaluate {
        /// Question corpus (JSON)
        corpus: PathBuf,
        /// Calibrated configuration (defaults to the reference calibration)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Include every prediction in the output
        #[arg(long)]
        predictions: bool,
    },
    /// Derive a configuration from a labeled corpus
    Calibrate {
        /// Question corpus (JSON)
        corpus: PathBuf,
        /// Base configuration whose hand-set parts (vetoes, verb prefixes,
        /// domain terms, negation markers) carry over
        #[arg(long)]
        config: Option<PathBuf>,
        /// Calibration thresholds (JSON); missing fields keep their defaults
        #[arg(long)]
        thresholds: Option<PathBuf>,
        /// Write the configuration here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Print the calibration report instead of the configuration
        #[arg(long)]
        report: bool,
    },
    /// Show how the rule chain decided one question
    Explain {
        /// Question corpus (JSON)
        corpus: PathBuf,
        /// Question id
        id: u32,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<CalibratedConfig> {
    match path {
        Some(p) => CalibratedConfig::load(p)
            .with_context(|| format!("loading configuration {}", p.display())),
        None => Ok(CalibratedConfig::default()),
    }
}

fn main() -> Result<()> {
    let directives = std::env::var("RUST_LOG").ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(directives.as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Evaluate {
            corpus,
            config,
            predictions,
        } => {
            let questions = load_corpus(&corpus)?;
            let result = evaluate_corpus(&questions, load_config(config.as_ref())?)?;
            let json = if predictions {
                serde_json::to_string_pretty(&result)?
            } else {
                serde_json::to_string_pretty(&result.report)?
            };
            println!("{json}");
        }
        Command::Calibrate {
            corpus,
            config,
            thresholds,
            out,
            report,
        } => {
            let questions = load_corpus(&corpus)?;
            let thresholds = match thresholds {
                Some(p) => CalibrationThresholds::load(&p)
                    .with_context(|| format!("loading thresholds {}", p.display()))?,
                None => CalibrationThresholds::default(),
            };
            let calibration = Calibrator::new(thresholds)
                .with_base(load_config(config.as_ref())?)
                .calibrate(&questions)?;
            if report {
                println!("{}", serde_json::to_string_pretty(&calibration.report)?);
            }
            match out {
                Some(path) => {
                    calibration.config.save(&path)?;
                    tracing::info!("Wrote configuration to {}", path.display());
                }
                None if !report => print!("{}", calibration.config.to_json()?),
                None => {}
            }
        }
        Command::Explain { corpus, id, config } => {
            let questions = load_corpus(&corpus)?;
            let Some(question) = questions.iter().find(|q| q.id() == id) else {
                bail!("question {id} not found in {}", corpus.display());
            };
            let evaluator = Evaluator::new(RuleLibrary::new(load_config(config.as_ref())?)?);
            println!(
                "{}",
                serde_json::to_string_pretty(&evaluator.explain(question))?
            );
        }
    }
    Ok(())
}
