use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use verifier::client::{RecordClient, UploadFile};
use verifier::config::Config;
use verifier::projector::{RecordRow, RecordView};
use verifier::views::detail::RecordDetail;
use verifier::views::list::{ListScope, RecordList};
use verifier::views::upload::UploadForm;
use verifier::views::{Notice, ViewState};

/// Command-line front end for the certificate verification backend
#[derive(Parser, Debug)]
#[command(name = "verifier")]
#[command(about = "Upload, browse and re-verify academic certificate records")]
#[command(version)]
struct Args {
    /// Backend base URL, including the `/api/v1` prefix
    #[arg(long, env = "VERIFIER_API_URL")]
    api_url: Option<String>,

    /// Where `download` and `export` write files
    #[arg(long, env = "VERIFIER_DOWNLOAD_DIR")]
    download_dir: Option<PathBuf>,

    /// Print views as JSON instead of text
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the backend is reachable
    Health,
    /// Upload a certificate scan and show the extracted record
    Upload { path: PathBuf },
    /// List every record
    List,
    /// List records uploaded by this user
    Mine,
    /// Show one record in full
    Show { id: i64 },
    /// Save the original certificate file
    Download { id: i64 },
    /// Save the record as a JSON document
    Export { id: i64 },
    /// Re-run the university database match for a record
    Reverify { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = Config::from_env()?;
    let args = Args::parse();
    if let Some(url) = args.api_url.as_deref() {
        config.api_url = url.trim_end_matches('/').to_string();
    }
    if let Some(dir) = args.download_dir.clone() {
        config.download_dir = dir;
    }

    // Logs go to stderr; stdout carries the rendered views
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let client = RecordClient::from_config(&config).context("Failed to build HTTP client")?;
    info!("Using backend at {}", client.base_url());

    match args.command {
        Command::Health => {
            let health = client.health().await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&health)?);
            } else {
                println!(
                    "{} ({} v{})",
                    health.status,
                    health.service.as_deref().unwrap_or("-"),
                    health.version.as_deref().unwrap_or("-")
                );
            }
        }
        Command::Upload { path } => {
            let file = UploadFile::from_path(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let mut form = UploadForm::new(Arc::new(client));
            form.submit(Some(file)).await;
            let view = settled(form.state())?;
            emit_record(view, args.json)?;
        }
        Command::List => show_list(client, ListScope::All, args.json).await?,
        Command::Mine => show_list(client, ListScope::Mine, args.json).await?,
        Command::Show { id } => {
            let mut detail = RecordDetail::new(Arc::new(client), id);
            detail.load().await;
            emit_record(settled(detail.state())?, args.json)?;
        }
        Command::Download { id } => {
            let mut detail = RecordDetail::new(Arc::new(client), id);
            let Some(file) = detail.download().await else {
                bail!(notice_text(detail.notice()));
            };
            let path = file
                .save_into(&config.download_dir)
                .await
                .with_context(|| format!("Failed to write into {}", config.download_dir.display()))?;
            println!("Saved {}", path.display());
        }
        Command::Export { id } => {
            let mut detail = RecordDetail::new(Arc::new(client), id);
            let Some(export) = detail.export().await else {
                bail!(notice_text(detail.notice()));
            };
            let path = export
                .save_into(&config.download_dir)
                .await
                .with_context(|| format!("Failed to write into {}", config.download_dir.display()))?;
            println!("Saved {}", path.display());
        }
        Command::Reverify { id } => {
            let mut detail = RecordDetail::new(Arc::new(client), id);
            detail.load().await;
            settled(detail.state())?;
            detail.reverify().await;
            if let Some(Notice::Error(message)) = detail.notice() {
                bail!(message.clone());
            }
            if let Some(view) = detail.view() {
                emit_record(view, args.json)?;
            }
            if let Some(notice) = detail.notice() {
                eprintln!("{}", notice.text());
            }
        }
    }

    Ok(())
}

async fn show_list(client: RecordClient, scope: ListScope, json: bool) -> Result<()> {
    let mut list = RecordList::new(Arc::new(client), scope);
    list.load().await;
    let rows = settled(list.state())?;
    if json {
        println!("{}", serde_json::to_string_pretty(rows)?);
    } else if rows.is_empty() {
        println!("{}", scope.empty_message());
    } else {
        rows.iter().for_each(|row| print_row(row, scope));
    }
    Ok(())
}

/// Turns a finished view state into its value or the user-facing error.
fn settled<T>(state: &ViewState<T>) -> Result<&T> {
    match state {
        ViewState::Ready(value) => Ok(value),
        ViewState::Failed(message) => bail!(message.clone()),
        ViewState::Idle | ViewState::Loading => bail!("Request did not complete"),
    }
}

fn notice_text(notice: Option<&Notice>) -> String {
    notice
        .map(|n| n.text().to_string())
        .unwrap_or_else(|| "Request failed".to_string())
}

fn emit_record(view: &RecordView, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
        return Ok(());
    }

    println!("#{}  {}  [{}]", view.id, view.filename, view.status_label);
    println!("Created: {}", view.created);
    println!("Summary: {}", view.summary);
    if !view.keywords.is_empty() {
        println!("Keywords: {}", view.keywords.join(" | "));
    }

    println!();
    let width = view
        .header_rows
        .iter()
        .map(|r| r.label.len())
        .max()
        .unwrap_or(0);
    for row in &view.header_rows {
        println!("  {:<width$}  {}", row.label, row.value);
    }

    if !view.subjects.is_empty() {
        println!();
        println!("  {:<10} {:<36} {:<6} {}", "Code", "Subject", "Grade", "Credits");
        for s in &view.subjects {
            println!(
                "  {:<10} {:<36} {:<6} {}",
                s.subject_code, s.subject_name, s.grade, s.credits
            );
        }
    }

    if let Some(panel) = &view.verification {
        println!();
        println!(
            "Verification: {}  (confidence {}%)",
            panel.status.label, panel.confidence_percent
        );
        if let Some(student) = &panel.matched_student {
            println!("Matched student: {} ({})", student.name, student.enrollment);
        }
        if let Some(message) = &panel.message {
            println!("{message}");
        }
    }
    Ok(())
}

fn print_row(row: &RecordRow, scope: ListScope) {
    match scope {
        // the all-records listing carries extracted fields, not filenames
        ListScope::All => println!(
            "#{:<5} {:<36} {:<10} {:<20} {:<14} SGPA {:<5} CGPA {:<5} Sem {:<3} {:<9} {}  {}",
            row.id,
            row.student_name,
            row.degree,
            row.branch,
            row.enrollment_number,
            row.sgpa,
            row.cgpa,
            row.semester,
            row.academic_year,
            row.created,
            row.university
        ),
        ListScope::Mine => println!(
            "#{:<5} {:<40} {:<10} {}  {}",
            row.id, row.filename, row.status_label, row.created, row.summary
        ),
    }
}
