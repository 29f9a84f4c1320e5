//! vesselid - command-line front end for the vessel-identification client
//!
//! **Usage:**
//! ```bash
//! vesselid template [--variant tabbed] [--toml]
//! vesselid validate --form query.json
//! vesselid suggest --field country --text kor
//! vesselid classify --form query.json [--offline-fallback] [--banding risk] [--save-dir out/]
//! vesselid report --form query.json
//! vesselid health
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{error, info};
use vesselid_common::config::{BandingMode, ConfigResolver, LoggingConfig, TomlConfig};
use vesselid_common::{time, FormConfig, FormVariant};
use vesselid_ui::export::{export_form, export_report, read_snapshot};
use vesselid_ui::report::ReportGenerator;
use vesselid_ui::validation::explain;
use vesselid_ui::{
    ClassificationClient, ClassificationResult, FormSession, QueryForm, ResultSource, SubmissionPipeline,
};

/// Vessel identification client
#[derive(Parser, Debug)]
#[command(name = "vesselid", version)]
#[command(about = "Prepare, validate and submit vessel observations for classification")]
struct Cli {
    /// Configuration file (overrides VESSELID_CONFIG)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Classification service base URL (overrides VESSELID_SERVICE_URL)
    #[arg(long, global = true, value_name = "URL")]
    service_url: Option<String>,

    /// Form layout (overrides the configured variant)
    #[arg(long, global = true, env = "VESSELID_VARIANT")]
    variant: Option<FormVariant>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print an empty form snapshot to fill in
    Template {
        /// Print a default configuration file instead
        #[arg(long)]
        toml: bool,
    },

    /// Report field errors and missing required fields
    Validate {
        #[arg(long, value_name = "FILE")]
        form: PathBuf,
    },

    /// List autocomplete candidates for a field
    Suggest {
        #[arg(long)]
        field: String,
        #[arg(long)]
        text: String,
    },

    /// Submit a form to the classification service
    Classify {
        #[arg(long, value_name = "FILE")]
        form: PathBuf,

        /// Use the offline report when the service is unreachable
        #[arg(long)]
        offline_fallback: bool,

        /// Headline metric interpretation
        #[arg(long)]
        banding: Option<BandingMode>,

        /// Directory for the form snapshot and report text
        #[arg(long, value_name = "DIR")]
        save_dir: Option<PathBuf>,

        /// Print the normalized result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the offline report for a form
    Report {
        #[arg(long, value_name = "FILE")]
        form: PathBuf,
    },

    /// Check that the classification service is up
    Health,
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn load_session(form_config: &'static FormConfig, path: &Path) -> Result<FormSession> {
    let json = read_snapshot(path).with_context(|| format!("Failed to read form {}", path.display()))?;
    let mut session = FormSession::new(form_config);
    session
        .import_snapshot(&json)
        .with_context(|| format!("Form {} does not match the {} layout", path.display(), form_config.variant))?;
    Ok(session)
}

fn print_result(result: &ClassificationResult) {
    if result.source == ResultSource::OfflineFallback {
        println!("NOTE: classification service unreachable; showing offline reference results.");
    }
    if result.is_empty() {
        println!("No matching vessels found. Try widening the ranges or removing constraints.");
        println!("{}", result.assessment.headline());
        return;
    }

    println!(
        "{} match(es) shown of {} found in {:.2}s",
        result.vessels_detected, result.total_matches, result.processing_time
    );
    println!("{}", result.assessment.headline());
    println!();
    for m in &result.matches {
        println!("#{} {} [{}] {} ({:.0}%)", m.rank, m.name, m.id, m.vessel_type, m.confidence * 100.0);
        if let Some(pages) = &m.pages {
            println!("    Pages: {}", pages);
        }
        for factor in &m.factors {
            println!("    {}: {}", factor.label, factor.value);
        }
    }
}

fn print_form_problems(session: &FormSession) -> usize {
    let config = session.config();
    let mut problems = 0;
    for (field, message) in session.errors().iter() {
        println!("{}: {}", config.label_for(field), explain(field, message));
        problems += 1;
    }
    for field in session.missing_required() {
        println!("{}: required", config.label_for(field));
        problems += 1;
    }
    problems
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let resolver = ConfigResolver::new(cli.config.clone(), cli.service_url.clone());
    let mut config: TomlConfig = resolver.resolve();
    init_tracing(&config.logging)?;

    if let Some(variant) = cli.variant {
        config.variant = variant;
    }
    let form_config = FormConfig::for_variant(config.variant);
    info!(
        "Starting vesselid v{} ({} form, service {})",
        env!("CARGO_PKG_VERSION"),
        config.variant,
        config.service_url
    );

    match cli.command {
        Command::Template { toml } => {
            if toml {
                print!("{}", config.to_toml_string()?);
            } else {
                let form = QueryForm::new(form_config);
                println!("{}", serde_json::to_string_pretty(&form.to_json())?);
            }
        }

        Command::Validate { form } => {
            let session = load_session(form_config, &form)?;
            let problems = print_form_problems(&session);
            if problems > 0 {
                bail!("form has {} problem(s)", problems);
            }
            println!("Form is ready to submit.");
        }

        Command::Suggest { field, text } => {
            let mut session = FormSession::new(form_config);
            let state = session.type_suggestion(&field, &text)?;
            if state.candidates.is_empty() {
                println!("No suggestions.");
            }
            for candidate in state.candidates {
                println!("{}", candidate);
            }
        }

        Command::Classify {
            form,
            offline_fallback,
            banding,
            save_dir,
            json,
        } => {
            config.offline_fallback |= offline_fallback;
            if let Some(banding) = banding {
                config.banding = banding;
            }
            let mut session = load_session(form_config, &form)?;
            let client = ClassificationClient::from_config(&config)?;
            let mut pipeline = SubmissionPipeline::from_config(&config);

            let result = match pipeline.submit(&mut session, &client).await {
                Ok(Some(result)) => result,
                Ok(None) => bail!("result discarded"),
                Err(e) => {
                    error!(error = %e, "Classification failed");
                    print_form_problems(&session);
                    bail!("{}", e.user_message());
                }
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result);
            }

            if let Some(dir) = save_dir.or(config.export_dir.clone()) {
                let path = export_form(&dir, session.form())?;
                println!("Form saved to {}", path.display());
                if !result.report_text.is_empty() {
                    let path = export_report(&dir, &result.report_text, time::now())?;
                    println!("Report saved to {}", path.display());
                }
            }
        }

        Command::Report { form } => {
            let session = load_session(form_config, &form)?;
            let report_id = format!("offline-{}", uuid::Uuid::new_v4());
            let text = ReportGenerator::new().generate(session.form(), time::now(), &report_id);
            print!("{}", text);
        }

        Command::Health => {
            let client = ClassificationClient::from_config(&config)?;
            let status = client.health().await?;
            if !status.is_ok() {
                bail!("service at {} reports status '{}'", client.base_url(), status.status);
            }
            println!("Service at {} is healthy.", client.base_url());
        }
    }

    Ok(())
}
