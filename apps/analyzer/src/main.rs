mod analysis_client;
mod config;
mod errors;
mod export;
mod input;
mod models;
mod session;
mod validation;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis_client::AnalysisClient;
use crate::config::Config;
use crate::errors::RequestError;
use crate::session::controller::{ControllerState, SessionController};
use crate::session::storage::FileStorage;
use crate::session::store::SessionStore;

#[derive(Parser)]
#[command(name = "analyzer")]
#[command(about = "Resume Analyzer - submit a resume for AI feedback and keep a local history", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a resume (.txt, .md or .pdf; '-' reads stdin)
    Analyze {
        resume: String,
        /// Job description file to tailor the feedback
        #[arg(long)]
        job: Option<String>,
        /// Target company name
        #[arg(long)]
        company: Option<String>,
        /// Print the analysis as JSON instead of a report
        #[arg(long)]
        json: bool,
    },
    /// List past analyses, most recent first
    History {
        #[arg(long)]
        json: bool,
    },
    /// Write the latest analysis (text) or the full history (json)
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Text)]
        format: ExportFormat,
        /// With text format, include every stored analysis instead of the latest
        #[arg(long)]
        all: bool,
        /// Output file; stdout if omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Delete the local history and start a new session
    Clear,
    /// Print the current session id
    Session,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Text,
    Json,
}

const FIRST_RUN_HELP: &str = "\
Welcome! Paste or point to your resume and we'll score it, list its strengths
and suggest improvements. Add --job <file> and --company <name> to tailor the
feedback to a role. Past results stay on this machine: see `analyzer history`.
";

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Resume Analyzer v{}", env!("CARGO_PKG_VERSION"));
    let client = AnalysisClient::new(&config.api_base_url)?;
    info!("Analysis endpoint: {}", client.endpoint());

    let storage = FileStorage::new(&config.data_dir);
    info!("Local storage: {}", storage.path().display());
    let store = SessionStore::new(Box::new(storage));
    let mut controller = SessionController::new(Arc::new(client), store);

    if controller.show_first_run_help() {
        eprintln!("{FIRST_RUN_HELP}");
    }

    match cli.command {
        Commands::Analyze {
            resume,
            job,
            company,
            json,
        } => {
            controller.set_resume_text(input::read_text(&resume)?);
            if let Some(job) = job {
                controller.set_job_description(Some(input::read_text(&job)?));
            }
            controller.set_company_name(company);
            return run_analysis(&mut controller, json).await;
        }
        Commands::History { json } => {
            let history = controller.history();
            if json {
                println!("{}", export::history_to_json(history)?);
            } else if history.is_empty() {
                println!("No analyses yet.");
            } else {
                for (i, entry) in history.iter().enumerate() {
                    println!(
                        "{:>3}. {}  score {:>3}  {}",
                        i + 1,
                        entry.timestamp.format("%Y-%m-%d %H:%M"),
                        entry.analysis.score,
                        entry.analysis.summary
                    );
                }
            }
        }
        Commands::Export {
            format,
            all,
            output,
        } => {
            let history = controller.history();
            let content = match format {
                ExportFormat::Json => export::history_to_json(history)?,
                ExportFormat::Text if all && !history.is_empty() => {
                    export::history_to_text(history)
                }
                ExportFormat::Text => match history.first() {
                    Some(latest) => export::analysis_to_text(&latest.analysis),
                    None => {
                        eprintln!("Nothing to export yet.");
                        return Ok(ExitCode::FAILURE);
                    }
                },
            };
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("Failed to write '{}'", path.display()))?;
                    println!("Saved to {}", path.display());
                }
                None => print!("{content}"),
            }
        }
        Commands::Clear => {
            controller.clear_history();
            println!("History cleared. New session: {}", controller.session_id());
        }
        Commands::Session => println!("{}", controller.session_id()),
    }

    Ok(ExitCode::SUCCESS)
}

async fn run_analysis(controller: &mut SessionController, json: bool) -> Result<ExitCode> {
    let submission = match controller.begin_submit() {
        Ok(submission) => submission,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return Ok(ExitCode::FAILURE);
        }
    };
    eprintln!("Analyzing your resume... This might take a moment.");

    let analyzer = controller.analyzer();
    let draft = submission.draft.clone();
    let session_id = submission.session_id.clone();
    let mut request = tokio::spawn(async move { analyzer.analyze(&draft, &session_id).await });

    tokio::select! {
        joined = &mut request => {
            let result = joined.unwrap_or_else(|e| Err(RequestError::Transport(e.to_string())));
            controller.finish_submit(submission, result);
        }
        _ = tokio::signal::ctrl_c() => {
            // The request keeps running; its result is dropped by the controller.
            controller.teardown();
            eprintln!("Cancelled.");
            return Ok(ExitCode::FAILURE);
        }
    }

    if controller.is_storage_degraded() {
        eprintln!("Note: local history is unavailable; this result will not be saved.");
    }

    match (controller.state(), controller.analysis()) {
        (ControllerState::Success, Some(analysis)) => {
            if json {
                println!("{}", serde_json::to_string_pretty(analysis)?);
            } else {
                print!("{}", export::analysis_to_text(analysis));
            }
            Ok(ExitCode::SUCCESS)
        }
        _ => {
            eprintln!(
                "{}",
                controller
                    .notice()
                    .unwrap_or("An unknown error occurred.")
            );
            Ok(ExitCode::FAILURE)
        }
    }
}
