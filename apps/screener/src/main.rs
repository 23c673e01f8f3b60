mod ats;
mod classifier;
mod config;
mod errors;
mod extraction;
mod llm_client;
mod pipeline;
mod report;
mod review;
mod state;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::errors::AppError;
use crate::extraction::extract_text;
use crate::pipeline::{screen_resume, ScreeningRequest};
use crate::report::{render, OutputFormat};
use crate::review::ReviewMode;
use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "screener", version, about = "Score a resume against a target role or job description")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Screen a resume and print or save the report
    Screen(ScreenArgs),
    /// Print the top TF-IDF keywords of a job description
    Keywords(KeywordArgs),
}

#[derive(Debug, Args)]
struct ScreenArgs {
    /// Resume file (.pdf, .txt or .md)
    resume: PathBuf,

    /// Target job title
    #[arg(short = 't', long, default_value = "Data Scientist")]
    job_title: String,

    /// Job description text
    #[arg(long, conflicts_with = "jd_file")]
    jd: Option<String>,

    /// File containing the job description
    #[arg(long)]
    jd_file: Option<PathBuf>,

    /// Feedback style
    #[arg(short, long, value_enum, default_value_t = ReviewMode::Brief)]
    style: ReviewMode,

    /// Skip the hosted model and use keyword feedback
    #[arg(long)]
    offline: bool,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Markdown)]
    format: OutputFormat,

    /// Write the report here instead of stdout (PDF is always written to a file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the report to a generated file name in the current directory
    #[arg(long, conflicts_with = "output")]
    save: bool,
}

#[derive(Debug, Args)]
struct KeywordArgs {
    /// Job description file
    jd_file: PathBuf,

    /// Number of keywords (defaults to JD_TOP_KEYWORDS)
    #[arg(short = 'n', long)]
    top: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting resume screener v{}", env!("CARGO_PKG_VERSION"));

    let outcome = match cli.command {
        Command::Screen(args) => run_screen(config, args).await,
        Command::Keywords(args) => run_keywords(&config, args).await,
    };

    if let Err(e) = outcome {
        eprintln!("{}", e.user_message());
        std::process::exit(e.exit_code());
    }
    Ok(())
}

async fn run_screen(config: Config, args: ScreenArgs) -> Result<(), AppError> {
    let job_description = match (&args.jd, &args.jd_file) {
        (Some(text), _) => Some(text.clone()),
        (None, Some(path)) => Some(tokio::fs::read_to_string(path).await?),
        (None, None) => None,
    };

    let state = AppState::build(config, args.offline)?;
    let resume_text = extract_text(&args.resume).await?;

    let report = screen_resume(
        &state,
        ScreeningRequest {
            resume_text,
            job_title: args.job_title,
            job_description,
            mode: args.style,
        },
    )
    .await?;

    let rendered = render(&report, args.format)?;
    let destination = match (args.output, args.save || args.format.is_binary()) {
        (Some(path), _) => Some(path),
        (None, true) => Some(PathBuf::from(report.default_file_name(args.format))),
        (None, false) => None,
    };

    match destination {
        Some(path) => write_report(&path, &rendered).await?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&rendered)?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}

async fn run_keywords(config: &Config, args: KeywordArgs) -> Result<(), AppError> {
    let jd = tokio::fs::read_to_string(&args.jd_file).await?;
    let top = args.top.unwrap_or(config.jd_top_keywords);
    for keyword in ats::extract_keywords(&jd, top) {
        println!("{keyword}");
    }
    Ok(())
}

async fn write_report(path: &Path, rendered: &[u8]) -> Result<(), AppError> {
    tokio::fs::write(path, rendered).await?;
    info!("Report written to {}", path.display());
    eprintln!("📥 Report saved to {}", path.display());
    Ok(())
}
