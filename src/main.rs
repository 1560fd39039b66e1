use aiuml_lib::config::{
    ConfigLoader, ConfigMerger, PartialApiConfig, PartialConfig, PartialExportConfig,
};
use aiuml_lib::events::{EventSink, WorkspaceEvent};
use aiuml_lib::export::DirectoryDownloadSink;
use aiuml_lib::render::HeadlessEngine;
use aiuml_lib::services::{HttpBackend, RequirementDocument, SessionContext, UserSession};
use aiuml_lib::share::{SystemClipboard, SystemLauncher};
use aiuml_lib::{ShareChannel, Workspace, WorkspaceDeps};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// AI UML - analyze requirements into UML diagrams and design patterns
#[derive(Parser, Debug)]
#[command(name = "aiuml")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file merged over the global one
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend API base URL, including the /api prefix
    #[arg(long, global = true, env = "AIUML_API_URL")]
    api_url: Option<String>,

    /// Bearer token of the signed-in user
    #[arg(long, global = true, env = "AIUML_TOKEN")]
    token: Option<String>,

    /// Directory exported files are saved to
    #[arg(long, global = true)]
    output_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show a project's requirements, last diagram and pattern suggestions
    Show {
        project_id: u64,
        /// Print the project as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a diagram from requirements
    Analyze {
        project_id: u64,
        /// Requirement text (defaults to the project's stored requirements)
        #[arg(long, conflicts_with = "file")]
        requirements: Option<String>,
        /// Requirement document to upload (.txt .md .java .pdf .doc .docx)
        #[arg(long)]
        file: Option<PathBuf>,
        /// CLASS, USECASE or SEQUENCE
        #[arg(long)]
        diagram_type: Option<String>,
    },
    /// Print or open a project's share link
    Share {
        project_id: u64,
        /// clipboard, whatsapp, facebook or gmail
        #[arg(long)]
        channel: Option<ShareChannel>,
        /// Copy or open the link instead of printing it
        #[arg(long)]
        open: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    env_logger::init();

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    rt.block_on(run(cli))
}

fn load_config(cli: &Cli) -> Result<aiuml_lib::config::AppConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(ref path) = cli.config {
        loader = loader.with_explicit_path(path.clone());
    }

    let overrides = PartialConfig {
        api: cli.api_url.as_ref().map(|url| PartialApiConfig {
            base_url: Some(url.clone()),
            timeout_secs: None,
        }),
        export: cli.output_dir.as_ref().map(|dir| PartialExportConfig {
            output_dir: Some(dir.clone()),
            ..Default::default()
        }),
        share: None,
    };

    let config = ConfigMerger::new()
        .with_global(loader.load_global()?)
        .with_file(loader.load_explicit()?)
        .with_cli(Some(overrides))
        .merge();
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    let session = match cli.token.clone() {
        Some(token) if !token.is_empty() => SessionContext::with_session(UserSession {
            id: 0,
            email: None,
            name: None,
            token,
        }),
        _ => SessionContext::new(),
    };

    let backend = Arc::new(
        HttpBackend::new(&config.api, session).context("Failed to create HTTP client")?,
    );
    let deps = WorkspaceDeps {
        store: backend.clone(),
        analysis: backend,
        renderer: Arc::new(HeadlessEngine),
        capture: None,
        composer: None,
        downloads: Arc::new(DirectoryDownloadSink::new(config.export.output_dir())),
        clipboard: Arc::new(SystemClipboard::new()),
        launcher: Arc::new(SystemLauncher::new()),
    };

    // Print user notifications as they arrive
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<WorkspaceEvent>();
    let notifier = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if event.is_failure() {
                eprintln!("error: {}", event.message());
            } else {
                eprintln!("{}", event.message());
            }
        }
    });

    let project_id = match cli.command {
        Command::Show { project_id, .. }
        | Command::Analyze { project_id, .. }
        | Command::Share { project_id, .. } => project_id,
    };
    let workspace = Workspace::new(project_id, &config, deps, EventSink::new(event_tx));
    let result = execute(&workspace, cli.command).await;

    // Closing the workspace drops the last sender and ends the notifier
    drop(workspace);
    let _ = notifier.await;
    result
}

async fn execute(workspace: &Workspace, command: Command) -> Result<()> {
    match command {
        Command::Show { json, .. } => {
            let project = workspace.load().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&project)?);
                return Ok(());
            }

            println!(
                "Project {}: {}",
                project.id,
                project.name.as_deref().unwrap_or("(untitled)")
            );
            if let Some(ref description) = project.description {
                println!("{}", description);
            }
            println!("\nRequirements ({}):", workspace.diagram_type().display_name());
            println!("{}", workspace.requirement_text());
            print_current(workspace);
        }
        Command::Analyze {
            requirements,
            file,
            diagram_type,
            ..
        } => {
            workspace.load().await?;

            if let Some(path) = file {
                let document = RequirementDocument::read(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                workspace.upload_requirements(&document).await?;
            } else if let Some(text) = requirements {
                workspace.set_requirements(text);
            }
            if let Some(ref value) = diagram_type {
                workspace.set_diagram_type(value)?;
            }

            log::info!(
                "Analyzing project {} as {}",
                workspace.project_id(),
                workspace.diagram_type()
            );
            workspace.analyze().await?;
            print_current(workspace);
        }
        Command::Share { channel, open, .. } => {
            let channel = channel.unwrap_or(ShareChannel::Clipboard);
            if open {
                let target = workspace.share_via(channel).await?;
                println!("{}", target.url);
            } else {
                let url = workspace
                    .share()
                    .intent_url(channel)
                    .unwrap_or_else(|| workspace.share_url());
                println!("{}", url);
            }
        }
    }
    Ok(())
}

fn print_current(workspace: &Workspace) {
    let Some(current) = workspace.current() else {
        println!("\nNo architecture yet.");
        return;
    };

    println!(
        "\n{} diagram (revision {}):",
        current.artifact.diagram_type.display_name(),
        current.revision
    );
    println!("{}", current.artifact.markup);

    let cards = workspace.pattern_cards();
    if cards.is_empty() {
        return;
    }
    println!("\nDesign patterns:");
    for card in cards {
        println!("  {}: {}", card.name, card.description);
    }
}
