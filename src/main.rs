mod api;
mod config;
mod contacts;
mod dates;
mod db;
mod documents;
mod error;
mod models;
mod patch;
mod sync;
mod timeline;
mod uploads;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use config::Config;
use db::Database;
use models::{ApplicationDetail, ApplicationStatus, Stage};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use uploads::FileStore;

#[derive(Parser)]
#[command(name = "applytrack")]
#[command(about = "Job application tracker - stages, contacts, documents, and timelines")]
#[command(version)]
struct Cli {
    /// Data directory holding the database and uploads
    #[arg(long, global = true, env = "APPLYTRACK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Run the HTTP API
    Serve {
        /// Address to listen on
        #[arg(short, long, env = "APPLYTRACK_BIND", default_value = config::DEFAULT_BIND)]
        bind: SocketAddr,
    },

    /// List applications
    List {
        /// Filter by status (NOT_APPLIED, APPLIED, INITIAL_CALL, ...)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Show application details and timeline
    Show {
        /// Application ID
        id: String,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("applytrack=info,tower_http=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let bind = match &cli.command {
        Commands::Serve { bind } => *bind,
        _ => Config::default_bind(),
    };
    let config = Config::new(cli.data_dir, bind);
    let db = Database::open(&config.database_path)
        .with_context(|| format!("Failed to open database at {}", config.database_path.display()))?;

    match cli.command {
        Commands::Init => {
            db.init()?;
            config.ensure_dirs()?;
            if let Some(path) = db.path() {
                println!("Database initialized at {}", path.display());
            }
            println!("Uploads stored under {}", config.uploads_dir().display());
        }

        Commands::Serve { .. } => {
            db.init()?;
            config.ensure_dirs()?;
            let ctx = api::ApiContext::new(db, FileStore::new(config.uploads_dir()));
            let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
            runtime.block_on(serve(ctx, config.bind))?;
        }

        Commands::List { status } => {
            db.ensure_initialized()?;
            let status = status.as_deref().map(parse_status).transpose()?;
            let apps = db.list_applications(status)?;
            if apps.is_empty() {
                println!("No applications found.");
            } else {
                println!(
                    "{:<36} {:<14} {:<24} {:<24} {:>12}",
                    "ID", "STATUS", "COMPANY", "POSITION", "APPLIED"
                );
                println!("{}", "-".repeat(114));
                for app in apps {
                    let applied = app
                        .applied_date
                        .as_ref()
                        .map(dates::format_display)
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{:<36} {:<14} {:<24} {:<24} {:>12}",
                        app.id,
                        app.status.label(),
                        truncate(&app.company, 22),
                        truncate(&app.position, 22),
                        applied
                    );
                }
            }
        }

        Commands::Show { id } => {
            db.ensure_initialized()?;
            match db.get_application_detail(&id)? {
                Some(detail) => print_detail(&detail),
                None => println!("Application {} not found.", id),
            }
        }
    }

    Ok(())
}

async fn serve(ctx: api::ApiContext, bind: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    tracing::info!(addr = %bind, "applytrack API listening");

    axum::serve(listener, api::api_router(ctx))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await
        .context("HTTP server error")
}

fn parse_status(value: &str) -> Result<ApplicationStatus> {
    ApplicationStatus::ALL
        .into_iter()
        .find(|status| status.as_str().eq_ignore_ascii_case(value))
        .ok_or_else(|| anyhow!("Unknown status '{}'", value))
}

fn print_detail(detail: &ApplicationDetail) {
    let app = &detail.application;
    println!("Application {}", app.id);
    println!("Company: {}", app.company);
    println!("Position: {}", app.position);
    println!("Status: {}", app.status.label());
    if let Some(pay) = &app.pay {
        println!("Pay: {}", pay);
    }

    for stage in Stage::ALL {
        let Some(date) = app.stage_date(stage) else {
            continue;
        };
        let done = if stage.is_tracked() && app.stage_completed(stage) {
            " (completed)"
        } else {
            ""
        };
        println!("{}: {}{}", stage.label(), dates::format_display(&date), done);
        if let Some(notes) = app.stage_notes(stage) {
            print_wrapped(notes, "    ");
        }
    }

    if let Some(resume) = &app.resume_file {
        println!("Resume: {}", resume);
    }
    if let Some(letter) = &app.cover_letter_file {
        println!("Cover letter: {}", letter);
    }
    if let Some(notes) = &app.notes {
        println!("\n--- Notes ---");
        print_wrapped(notes, "");
    }

    if !detail.contacts.is_empty() {
        println!("\nContacts ({}):", detail.contacts.len());
        for contact in &detail.contacts {
            let primary = if contact.is_primary { " *" } else { "" };
            let role = contact.position.as_deref().unwrap_or("-");
            let email = contact.email.as_deref().unwrap_or("-");
            println!("  {}{} - {} <{}>", contact.name, primary, role, email);
        }
    }

    if !detail.documents.is_empty() {
        println!("\nDocuments ({}):", detail.documents.len());
        for doc in &detail.documents {
            println!("  {} {}", doc.label.as_deref().unwrap_or("Document"), doc.file_path);
        }
    }

    if !detail.timeline.is_empty() {
        println!("\nTimeline:");
        for event in &detail.timeline {
            let mark = if event.is_completed { "x" } else { " " };
            println!(
                "  [{}] {:>12}  {}",
                mark,
                dates::format_display(&event.event_date),
                event.title
            );
            if let Some(description) = &event.description {
                print_wrapped(description, "                    ");
            }
        }
    }
}

fn print_wrapped(text: &str, indent: &str) {
    let options = textwrap::Options::new(80)
        .initial_indent(indent)
        .subsequent_indent(indent);
    for line in textwrap::wrap(text, options) {
        println!("{}", line);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
