//! Bindery CLI - bind configuration documents to a demo widget tree and inspect the result

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bindery_core::{ConfigDocument, ConfigNode, EngineSettings};
use tracing_subscriber::EnvFilter;

mod demo;
mod render;

#[derive(Parser)]
#[command(name = "bindery")]
#[command(version = bindery_core::VERSION)]
#[command(about = "Bind configuration documents to widget trees", long_about = None)]
struct Cli {
    /// Show debug output from the binding engine
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Bind a document and print the resulting widget tree
    Render {
        /// Path to a .toml or .json configuration document
        file: PathBuf,

        /// Engine settings file
        #[arg(short, long)]
        settings: Option<PathBuf>,

        /// Unbind the root before printing
        #[arg(long)]
        unbind: bool,

        /// Remove a configuration subtree by id before printing
        #[arg(long, value_name = "ID")]
        remove: Option<String>,
    },

    /// Bind a document, click a widget and print the fired actions
    Click {
        /// Path to a .toml or .json configuration document
        file: PathBuf,

        /// Widget name or configuration id to click
        target: String,

        /// Engine settings file
        #[arg(short, long)]
        settings: Option<PathBuf>,
    },

    /// Validate a document without binding it
    Check {
        /// Path to a .toml or .json configuration document
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Render {
            file,
            settings,
            unbind,
            remove,
        }) => {
            let output = render_file(&file, settings.as_deref(), unbind, remove.as_deref())?;
            print!("{output}");
        }

        Some(Commands::Click { file, target, settings }) => {
            for message in click_file(&file, &target, settings.as_deref())? {
                println!("{message}");
            }
        }

        Some(Commands::Check { file }) => {
            println!("{}", check_file(&file)?);
        }

        None => {
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "bindery=debug" } else { "bindery=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_settings(path: Option<&Path>) -> Result<EngineSettings> {
    match path {
        Some(path) => EngineSettings::load(path)
            .with_context(|| format!("Failed to read settings from {}", path.display())),
        None => Ok(EngineSettings::default()),
    }
}

fn open_session(file: &Path, settings: Option<&Path>) -> Result<demo::Session> {
    let document =
        ConfigDocument::load(file).with_context(|| format!("Failed to load {}", file.display()))?;
    demo::Session::open(&document, load_settings(settings)?)
}

fn render_file(file: &Path, settings: Option<&Path>, unbind: bool, remove: Option<&str>) -> Result<String> {
    let mut session = open_session(file, settings)?;

    if let Some(id) = remove {
        let removed = session.engine.remove(id);
        if removed == 0 {
            bail!("No bound configuration with id `{id}`");
        }
        tracing::info!(id, removed, "removed configuration subtree");
    }
    if unbind {
        session.engine.unbind(&mut session.tree, session.root);
    }

    Ok(render::render(&session.tree, session.root))
}

fn click_file(file: &Path, target: &str, settings: Option<&Path>) -> Result<Vec<String>> {
    let session = open_session(file, settings)?;
    let widget = session
        .find(target)
        .with_context(|| format!("No widget named or bound to `{target}`"))?;
    if !session.tree.click(widget) {
        bail!("`{target}` has no click listener");
    }
    Ok(session.clicked())
}

fn check_file(file: &Path) -> Result<String> {
    let document =
        ConfigDocument::load(file).with_context(|| format!("Failed to load {}", file.display()))?;
    let root = document.build().context("Invalid configuration document")?;

    let mut nodes = 0;
    let mut queue: VecDeque<Arc<ConfigNode>> = VecDeque::from([root.clone()]);
    while let Some(node) = queue.pop_front() {
        nodes += 1;
        queue.extend(node.children());
    }

    Ok(format!("{}: {} ({} nodes)", file.display(), root.id(), nodes))
}
