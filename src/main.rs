//! Synheart Trust Agent CLI
//!
//! Continuous implicit authentication from interaction samples.

use chrono::Utc;
use clap::{Parser, Subcommand};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use synheart_trust_agent::{
    config::{Config, EvaluationSettings},
    oracle::{run_evaluation, EvaluationReport},
    persistence::save_classifier,
    transparency::create_shared_log_with_persistence,
    Agent, AgentMode, FileStorage, InputRecord, PermanentStorage, RunConfiguration,
    PRIVACY_DECLARATION, VERSION,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "synheart-trust")]
#[command(author = "Synheart")]
#[command(version = VERSION)]
#[command(about = "Continuous implicit authentication agent", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Feed recorded input events to an agent
    Start {
        /// JSON lines of `{"kind": .., "event": ..}` records (stdin if omitted)
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Only log touch samples, without training or scoring
        #[arg(long)]
        log_only: bool,

        /// Control loop period in milliseconds (overrides the config file)
        #[arg(long)]
        period_ms: Option<u64>,

        /// Training threshold (overrides the config file)
        #[arg(long)]
        threshold: Option<usize>,
    },

    /// Evaluate the touch classifier on a recorded dataset
    Evaluate {
        /// Dataset directory (overrides the settings)
        #[arg(long, short)]
        dataset: Option<PathBuf>,

        /// `key=value` evaluation settings file
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Evaluate only this user (file index); all users by default
        #[arg(long)]
        target: Option<usize>,

        /// Seconds to wait for the scores of one user
        #[arg(long, default_value = "30")]
        deadline_secs: u64,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show current agent status
    Status,

    /// Show configuration
    Config,

    /// Display privacy declaration
    Privacy,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            input,
            log_only,
            period_ms,
            threshold,
        } => {
            cmd_start(input, log_only, period_ms, threshold);
        }
        Commands::Evaluate {
            dataset,
            settings,
            target,
            deadline_secs,
            json,
        } => {
            cmd_evaluate(dataset, settings, target, deadline_secs, json);
        }
        Commands::Status => {
            cmd_status();
        }
        Commands::Config => {
            cmd_config();
        }
        Commands::Privacy => {
            cmd_privacy();
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_start(
    input: Option<PathBuf>,
    log_only: bool,
    period_ms: Option<u64>,
    threshold: Option<usize>,
) {
    println!("Synheart Trust Agent v{VERSION}");
    println!();

    let mut config = Config::load().unwrap_or_default();
    if let Some(ms) = period_ms {
        config.agent.period = Duration::from_millis(ms);
    }
    if let Some(t) = threshold {
        config.agent.training_threshold = t;
    }
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    let storage = match FileStorage::new(&config.data_path) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            eprintln!("Error opening data directory: {e}");
            std::process::exit(1);
        }
    };
    let transparency_log = create_shared_log_with_persistence(config.transparency_path());
    let preset = RunConfiguration {
        knn: config.classifier,
        ..RunConfiguration::touchalytics()
    };

    let mode = if log_only {
        AgentMode::Config
    } else {
        AgentMode::Online
    };
    let mut builder = Agent::builder(mode)
        .config(config.agent.clone())
        .transparency(transparency_log.clone())
        .measurement(Box::new(preset.touch_measurement()));

    if log_only {
        builder = builder.log_to(storage.clone(), config.touch_log_name.clone());
    } else {
        match preset.restore_classifier(&*storage, &config.model_name) {
            Ok(classifier) => builder = builder.classifier(Arc::new(classifier)),
            Err(e) => {
                eprintln!("Error creating classifier: {e}");
                std::process::exit(1);
            }
        }
    }

    let agent = match builder.build() {
        Ok(agent) => agent,
        Err(e) => {
            eprintln!("Error creating agent: {e}");
            std::process::exit(1);
        }
    };

    println!("Starting agent...");
    println!("  Instance ID: {}", agent.instance_id());
    println!("  Mode: {mode}");
    println!("  Period: {}ms", config.agent.period.as_millis());
    println!("  Training threshold: {}", config.agent.training_threshold);
    println!("  Data directory: {:?}", config.data_path);
    println!("  Status: {}", agent.status());
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    if let Err(e) = agent.start() {
        eprintln!("Error starting agent: {e}");
        std::process::exit(1);
    }

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    let records = spawn_reader(input);
    let mut last_status = agent.status();

    while running.load(Ordering::SeqCst) {
        match records.recv_timeout(Duration::from_millis(100)) {
            Ok(record) => {
                agent.dispatch(record.kind, &record.event);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                println!("Input exhausted.");
                break;
            }
        }

        for score in agent.take_scores() {
            println!("[{}] Score: {score}", Utc::now().format("%H:%M:%S"));
        }

        let status = agent.status();
        if status != last_status {
            println!("[{}] Status: {status}", Utc::now().format("%H:%M:%S"));
            last_status = status;
        }
    }

    println!();
    println!("Stopping agent...");
    agent.stop();
    if let Err(e) = agent.join() {
        eprintln!("Warning: {e}");
    }
    for score in agent.take_scores() {
        println!("[{}] Score: {score}", Utc::now().format("%H:%M:%S"));
    }
    println!("Final status: {}", agent.status());

    if let Some(classifier) = agent.classifier() {
        match save_classifier(&*storage, &config.model_name, classifier.as_ref()) {
            Ok(true) => println!("Saved model to {:?}", storage.model_path(&config.model_name)),
            Ok(false) => println!("No trained model to save."),
            Err(e) => eprintln!("Warning: Could not save model: {e}"),
        }
    }

    if let Err(e) = transparency_log.save() {
        eprintln!("Warning: Could not save transparency log: {e}");
    }

    println!();
    println!("{}", transparency_log.summary());
}

/// Read input records on a separate thread so Ctrl+C is honored while
/// waiting for input. The channel closes at end of input.
fn spawn_reader(input: Option<PathBuf>) -> Receiver<InputRecord> {
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        let reader: Box<dyn BufRead> = match input {
            Some(path) => match std::fs::File::open(&path) {
                Ok(file) => Box::new(std::io::BufReader::new(file)),
                Err(e) => {
                    eprintln!("Error opening {path:?}: {e}");
                    return;
                }
            },
            None => Box::new(std::io::BufReader::new(std::io::stdin())),
        };

        for (number, line) in reader.lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read input");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<InputRecord>(&line) {
                Ok(record) => {
                    if tx.send(record).is_err() {
                        break;
                    }
                }
                Err(e) => tracing::warn!(line = number + 1, error = %e, "skipping malformed record"),
            }
        }
    });
    rx
}

fn cmd_evaluate(
    dataset: Option<PathBuf>,
    settings_path: Option<PathBuf>,
    target: Option<usize>,
    deadline_secs: u64,
    json: bool,
) {
    let config = Config::load().unwrap_or_default();
    let mut settings = match settings_path {
        Some(path) => match EvaluationSettings::load_key_values(&path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error configuring, using default values: {e}");
                config.evaluation.clone()
            }
        },
        None => config.evaluation.clone(),
    };
    if let Some(path) = dataset {
        settings.dataset_path = path;
    }

    let preset = RunConfiguration {
        knn: config.classifier,
        ..RunConfiguration::touchalytics()
    };

    println!("Scanning for dataset at: {:?}", settings.dataset_path);
    let report = match run_evaluation(
        &settings,
        &preset,
        target,
        Duration::from_secs(deadline_secs),
    ) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Evaluation failed: {e}");
            std::process::exit(1);
        }
    };

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("Error serializing report: {e}"),
        }
    } else {
        print_report(&report);
    }
}

fn print_report(report: &EvaluationReport) {
    println!(
        "Found {} touch datasources, {} keystroke datasources",
        report.sources, report.keystroke_sources
    );
    println!();
    for partition in &report.partitions {
        println!(
            "User {} (train {}, test {}): {}",
            partition.target, partition.training_size, partition.test_size, partition.matrix
        );
    }
    if report.partitions.len() > 1 {
        println!();
        println!("Total: {}", report.total);
    }
}

fn cmd_status() {
    let config = Config::load().unwrap_or_default();

    println!("Synheart Trust Agent Status");
    println!("===========================");
    println!();

    println!("Configuration:");
    println!("  Period: {}ms", config.agent.period.as_millis());
    println!("  Training threshold: {}", config.agent.training_threshold);
    println!(
        "  Classifier: KNN (k = {}, features = {})",
        config.classifier.k, config.classifier.num_features
    );
    println!();

    match FileStorage::new(&config.data_path) {
        Ok(storage) => {
            let model = storage.model_path(&config.model_name);
            println!(
                "Model: {}",
                if model.exists() {
                    "trained ✓"
                } else {
                    "not trained ✗"
                }
            );
            let logged = storage
                .read_log(&config.touch_log_name)
                .map(|lines| lines.len())
                .unwrap_or(0);
            println!("Logged touch samples: {logged}");
        }
        Err(e) => println!("Data directory unavailable: {e}"),
    }
    println!();

    // Load and show transparency stats if available
    let stats_path = config.transparency_path();
    if stats_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&stats_path) {
            if let Ok(stats) = serde_json::from_str::<serde_json::Value>(&content) {
                println!("Cumulative Statistics:");
                for (key, label) in [
                    ("touch_events", "Touch events"),
                    ("key_events", "Key events"),
                    ("samples_collected", "Samples collected"),
                    ("samples_logged", "Samples logged"),
                    ("classifications", "Classifications"),
                    ("accepted", "Accepted"),
                    ("rejected", "Rejected"),
                    ("trainings", "Trainings"),
                ] {
                    if let Some(value) = stats.get(key) {
                        println!("  {label}: {value}");
                    }
                }
            }
        }
    } else {
        println!("No previous session data found.");
    }
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

fn cmd_privacy() {
    println!("{PRIVACY_DECLARATION}");
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    if let Err(e) = ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    }) {
        eprintln!("Warning: Could not set Ctrl+C handler: {e}");
    }
}
