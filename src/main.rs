//! Searn: search-based sequence labeling
//!
//! Provides subcommands:
//!
//! - `train`    -- Train a sequence of policies on labeled sequence data
//! - `test`     -- Predict unlabeled sequences with a saved model
//! - `inspect`  -- Inspect a saved model

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use searn::config::SearnConfig;
use searn::example::{AnySource, ExampleParser, ReplaySource, StreamSource};
use searn::learner::{CostSensitiveLearner, LinearCsoaa, TableLayout};
use searn::model::SearnModel;
use searn::training::{RunSummary, SearnDriver};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// Searn: search-based sequence labeling
#[derive(Parser)]
#[command(name = "searn", version, about)]
struct Cli {
    /// Path to a JSON configuration file (uses defaults if not provided).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train on labeled sequence data.
    Train {
        /// Example data, one example per line, blank line between sequences.
        #[arg(long)]
        data: PathBuf,

        /// Number of passes over the data.
        #[arg(long)]
        passes: Option<usize>,

        /// Number of labels k.
        #[arg(long)]
        num_classes: Option<usize>,

        /// Past predictions used as history features.
        #[arg(long)]
        history: Option<usize>,

        /// Past predictions crossed with every input feature.
        #[arg(long)]
        features: Option<usize>,

        /// Maximum rollout length.
        #[arg(long)]
        rollout: Option<usize>,

        /// Policy mixing parameter.
        #[arg(long)]
        beta: Option<f32>,

        /// Rollout loss discount.
        #[arg(long)]
        gamma: Option<f32>,

        /// Where to save the trained model.
        #[arg(long)]
        final_model: Option<PathBuf>,

        /// Continue training from a saved model.
        #[arg(long)]
        initial_model: Option<PathBuf>,

        /// Where to save the run summary.
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// Predict unlabeled sequence data with a saved model.
    Test {
        /// Example data without labels.
        #[arg(long)]
        data: PathBuf,

        /// Model saved by `train`; its training settings are reused.
        #[arg(long)]
        model: PathBuf,
    },

    /// Inspect a saved model.
    Inspect {
        /// Path to the model JSON file.
        #[arg(long, default_value = "searn_model.json")]
        model: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// Entrypoint
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // Initialise tracing (reads RUST_LOG env var, defaults to info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SearnConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => SearnConfig::default(),
    };

    match cli.command {
        Commands::Train {
            data,
            passes,
            num_classes,
            history,
            features,
            rollout,
            beta,
            gamma,
            final_model,
            initial_model,
            summary,
        } => {
            let mut config = config;
            let seq = &mut config.sequence;
            if let Some(v) = num_classes {
                seq.num_classes = v;
            }
            if let Some(v) = history {
                seq.history = v;
            }
            if let Some(v) = features {
                seq.features = v;
            }
            if let Some(v) = rollout {
                seq.rollout = v;
            }
            if let Some(v) = beta {
                seq.beta = v;
            }
            if let Some(v) = gamma {
                seq.gamma = v;
            }
            if let Some(v) = passes {
                config.learner.passes = v;
            }
            cmd_train(
                config,
                &data,
                initial_model.as_deref(),
                final_model.as_deref(),
                summary.as_deref(),
            )
        }
        Commands::Test { data, model } => cmd_test(config, &data, &model),
        Commands::Inspect { model } => cmd_inspect(&model),
    }
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn open_data(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open example data {}", path.display()))?;
    Ok(BufReader::new(file))
}

fn cmd_train(
    mut config: SearnConfig,
    data: &Path,
    initial_model: Option<&Path>,
    final_model: Option<&Path>,
    summary_path: Option<&Path>,
) -> Result<()> {
    let learner = match initial_model {
        Some(path) => {
            let model = SearnModel::load_from_file(path)?;
            if model.learner.num_classes() != config.sequence.num_classes {
                anyhow::bail!(
                    "model {} has {} classes, configuration asks for {}",
                    path.display(),
                    model.learner.num_classes(),
                    config.sequence.num_classes
                );
            }
            config.learner.bits = model.learner.layout().bits;
            model.learner
        }
        None => LinearCsoaa::new(
            config.sequence.num_classes,
            TableLayout::new(config.learner.bits),
            config.learner.learning_rate,
        ),
    };

    let parser = ExampleParser::new(learner.layout(), config.learner.audit);
    let reader = open_data(data)?;
    let passes = config.learner.passes;
    let source = if passes > 1 {
        AnySource::Replay(
            ReplaySource::from_reader(reader, &parser, passes)
                .with_context(|| format!("Failed to read example data {}", data.display()))?,
        )
    } else {
        AnySource::Stream(StreamSource::new(reader, parser))
    };

    let mut driver = SearnDriver::new(learner, config)?;
    driver.run(source)?;
    let trained = driver.config().clone();
    let (learner, summary) = driver.finish();

    if let Some(path) = final_model {
        SearnModel::new(trained, learner).save_to_file(path)?;
    }
    if let Some(path) = summary_path {
        summary.save_to_file(path)?;
    }
    print_summary(&summary);
    Ok(())
}

fn cmd_test(config: SearnConfig, data: &Path, model_path: &Path) -> Result<()> {
    let model = SearnModel::load_from_file(model_path)?;
    let config = model.prediction_config(&config);

    let parser = ExampleParser::new(model.learner.layout(), config.learner.audit);
    let source = StreamSource::new(open_data(data)?, parser);

    let mut driver = SearnDriver::for_prediction(model.learner, config)?;
    let summary = driver.run(source)?;
    info!(model = %model_path.display(), "Prediction finished");
    print_summary(&summary);
    Ok(())
}

fn cmd_inspect(path: &Path) -> Result<()> {
    let model = SearnModel::load_from_file(path)?;
    let learner = &model.learner;
    let layout = learner.layout();
    let seq = &model.config.sequence;

    println!("Model: {}", path.display());
    println!("  Classes: {}", learner.num_classes());
    println!("  Policies: {}", model.config.policy_budget());
    println!(
        "  History: {} (features {}, bigrams {}, bigram features {})",
        seq.history, seq.features, seq.bigrams, seq.bigram_features
    );
    println!("  Table bits: {} (stride {})", layout.bits, layout.stride);
    println!("  Updates: {}", learner.updates());
    println!(
        "  Non-zero weights: {} of {}",
        learner.nonzero_weights(),
        layout.length() * layout.stride as usize
    );
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let stats = &summary.stats;
    println!("Sequences: {}", stats.sequences);
    println!(
        "  trained: {}  tested: {}  skipped: {}",
        stats.sequences_trained, stats.sequences_tested, stats.sequences_skipped
    );
    println!("  weighted examples: {:.1}", stats.weighted_examples);
    println!("  cost-sensitive examples: {}", stats.examples_emitted);
    println!("  average loss: {:.6}", summary.average_loss);
    println!("  policies: {}", summary.policies);
    println!(
        "  elapsed: {}s",
        (summary.finished_at - summary.started_at).num_seconds()
    );
}
