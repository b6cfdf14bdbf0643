//! SerialForge CLI - Bridge interface for form front-ends
//!
//! Commands: generate, export
//! Outputs JSON to stdout, logs to stderr
//! Returns 2 on validation failure, 1 on filesystem/config failure

use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::ExitCode;

use serialforge_core::{
    pipeline::{STATUS_GENERATED, STATUS_SAVED},
    ExportError, GeneratorConfig, IssuanceRequest, IssuanceSession, NamingConvention,
    PipelineError, SerialPolicy,
};

#[derive(Parser)]
#[command(name = "serialforge-cli")]
#[command(about = "SerialForge CLI - Serial number and QR code generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to JSON config file
    #[arg(short, long, default_value = "serialforge.json")]
    config: PathBuf,

    /// Override the serial number policy (deterministic | randomized)
    #[arg(long)]
    policy: Option<SerialPolicy>,

    /// Override the file naming convention (revision | serial)
    #[arg(long)]
    naming: Option<NamingConvention>,
}

#[derive(Args)]
struct RequestArgs {
    /// Project name
    #[arg(short, long)]
    project: String,

    /// Revision
    #[arg(short, long)]
    revision: String,

    /// Finish date (DDMMYY)
    #[arg(short = 'd', long, default_value = "", conflicts_with = "today")]
    finish_date: String,

    /// Use the current date
    #[arg(long)]
    today: bool,
}

impl RequestArgs {
    fn to_request(&self) -> IssuanceRequest {
        IssuanceRequest {
            project_name: self.project.clone(),
            revision: self.revision.clone(),
            finish_date: self.finish_date.clone(),
            use_current_date: self.today,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a serial number and preview its QR code
    Generate {
        #[command(flatten)]
        request: RequestArgs,
    },

    /// Generate, then save the serial number and QR images
    Export {
        #[command(flatten)]
        request: RequestArgs,

        /// Save directory (defaults to config, then working directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn exit_code(err: &PipelineError) -> ExitCode {
    match err {
        PipelineError::MissingFields(_)
        | PipelineError::Date(_)
        | PipelineError::Export(ExportError::Precondition) => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    }
}

fn failure(err: &PipelineError) -> Value {
    json!({
        "success": false,
        "status": err.to_string(),
        "fields": err.flagged_fields(),
    })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match GeneratorConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            println!("{}", json!({"success": false, "status": e.to_string()}));
            return ExitCode::FAILURE;
        }
    };
    if let Some(policy) = cli.policy {
        config.policy = policy;
    }
    if let Some(naming) = cli.naming {
        config.naming = naming;
    }

    let mut session = IssuanceSession::new(config);

    match cli.command {
        Commands::Generate { request } => {
            let issuance = match session.generate(&request.to_request()) {
                Ok(i) => i,
                Err(e) => {
                    println!("{:#}", failure(&e));
                    return exit_code(&e);
                }
            };

            let preview = match issuance.symbol.to_png_bytes() {
                Ok(png) => base64::Engine::encode(&base64::engine::general_purpose::STANDARD, png),
                Err(e) => {
                    let e = PipelineError::from(e);
                    println!("{:#}", failure(&e));
                    return exit_code(&e);
                }
            };

            let output = json!({
                "success": true,
                "status": STATUS_GENERATED,
                "serialNumber": issuance.serial,
                "finishDate": issuance.request.finish_date,
                "previewPngBase64": preview,
            });
            println!("{:#}", output);
            ExitCode::SUCCESS
        }

        Commands::Export { request, out } => {
            let serial = match session.generate(&request.to_request()) {
                Ok(i) => i.serial.clone(),
                Err(e) => {
                    println!("{:#}", failure(&e));
                    return exit_code(&e);
                }
            };

            match session.export(out.as_deref()) {
                Ok(bundle) => {
                    let output = json!({
                        "success": true,
                        "status": STATUS_SAVED,
                        "serialNumber": serial,
                        "artifacts": bundle.artifacts,
                    });
                    println!("{:#}", output);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    println!("{:#}", failure(&e));
                    exit_code(&e)
                }
            }
        }
    }
}
