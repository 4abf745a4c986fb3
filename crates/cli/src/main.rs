use api_shared::{GenerateAssessmentReq, GenerateIntakeReq};
use clap::{Parser, Subcommand};
use reportgen_core::{
    config::validate_templates, placeholders::build_placeholder_map, CoreConfig, GenerateRequest,
    IntakeRequest, ReportService, Uploader,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "reportgen")]
#[command(about = "Assessment report generator CLI")]
struct Cli {
    /// Storage root; sessions are written under <root>/temp_sessions
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    /// Directory holding the .docx/.pptx templates
    #[arg(long, global = true)]
    templates: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the assessment report and executive deck from a JSON payload
    Generate {
        /// Path to the assessment payload (same shape as POST /generate_assessment)
        payload: PathBuf,
    },
    /// Generate the intake summary document from a JSON payload
    Intake {
        /// Path to the intake payload (same shape as POST /generate_intake)
        payload: PathBuf,
    },
    /// Print the placeholder map an assessment payload would produce
    Placeholders {
        /// Path to the assessment payload
        payload: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("reportgen_core=warn".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Generate { payload }) => {
            let req: GenerateAssessmentReq = read_payload(&payload)?;
            let request = GenerateRequest::try_from(req)?;
            let service = build_service(cli.root, cli.templates)?;
            let report = service.generate(request)?;

            println!("Session: {}", report.session_id);
            println!("Document: {} ({})", report.document.locator, report.document.path.display());
            println!("Deck: {} ({})", report.deck.locator, report.deck.path.display());
            for skipped in &report.skipped_assets {
                println!("Skipped asset {}: {}", skipped.name, skipped.reason);
            }
        }
        Some(Commands::Intake { payload }) => {
            let req: GenerateIntakeReq = read_payload(&payload)?;
            let request = IntakeRequest::try_from(req)?;
            let service = build_service(cli.root, cli.templates)?;
            let artifact = service.generate_intake(request)?;

            println!("Intake: {} ({})", artifact.locator, artifact.path.display());
        }
        Some(Commands::Placeholders { payload }) => {
            let req: GenerateAssessmentReq = read_payload(&payload)?;
            let request = GenerateRequest::try_from(req)?;
            let map = build_placeholder_map(&request, chrono::Utc::now().date_naive());
            if let Err(e) = map.validate() {
                eprintln!("Warning: {}", e);
            }
            for (token, value) in map.entries() {
                println!("{} = {:?}", token, value);
            }
        }
        None => {
            println!("Use 'reportgen --help' for commands");
        }
    }

    Ok(())
}

fn read_payload<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)
        .map_err(|e| format!("Cannot read payload {}: {}", path.display(), e))?;
    let value = serde_json::from_slice(&bytes)
        .map_err(|e| format!("Invalid JSON in {}: {}", path.display(), e))?;
    Ok(value)
}

fn build_service(
    root: Option<PathBuf>,
    templates: Option<PathBuf>,
) -> Result<ReportService, Box<dyn std::error::Error>> {
    let cfg = Arc::new(CoreConfig::from_env(root, templates)?);
    validate_templates(cfg.template_dir())?;
    let uploader = Uploader::from_access_token(cfg.drive_access_token(), cfg.fetch_timeout());
    Ok(ReportService::new(cfg, uploader)?)
}
