//! # Doodler CLI
//!
//! Command-line host for the Doodler engine. It drives the same session
//! API an interactive front end would, without a window:
//!
//! - `edit` imports an image, sends it with a prompt to the generative
//!   endpoint and writes the result.
//! - `replay` feeds a JSON script of input events through the interaction
//!   engine and writes the final view.
//! - `history` lists, exports and deletes persisted history entries.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod confirm;
pub mod replay;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use doodler_core::{AlwaysConfirm, Confirm, FileHistoryStore, HistoryStore, MemoryHistoryStore};
use doodler_engine::{Doodler, DoodlerConfig, EngineError, HttpImageGenerator, ResizeTrigger};
use doodler_renderer::{decode_image_bytes, write_png, GlyphTextRenderer, TextRenderer};

pub use confirm::PromptConfirm;
pub use replay::{run_script, ReplayScript, ReplayStep};

/// Doodler CLI version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default generative service base URL.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000";

/// CLI arguments.
#[derive(Debug, Clone, Parser)]
#[command(name = "doodler")]
#[command(about = "Doodle, undo, and edit drawings with a generative image model")]
#[command(version)]
pub struct CliArgs {
    /// Directory holding persisted history. In-memory when omitted.
    #[arg(long, env = "DOODLER_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// JSON configuration file.
    #[arg(long, env = "DOODLER_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Font file for the text tool. Overrides the configured font.
    #[arg(long, env = "DOODLER_FONT", global = true)]
    pub font: Option<PathBuf>,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Send an image and a prompt to the generative endpoint.
    Edit {
        /// Image to start from.
        #[arg(long)]
        input: PathBuf,

        /// Edit instruction.
        #[arg(long)]
        prompt: String,

        /// Where to write the result.
        #[arg(long, default_value = "doodle.png")]
        output: PathBuf,

        /// Base URL of the generative service.
        #[arg(long, env = "DOODLER_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
        endpoint: String,

        /// Sampling temperature (0..=1).
        #[arg(long)]
        temperature: Option<f32>,
    },

    /// Run a JSON script of input events and write the final view.
    Replay {
        /// Script file.
        #[arg(long)]
        script: PathBuf,

        /// Where to write the result.
        #[arg(long, default_value = "doodle.png")]
        output: PathBuf,
    },

    /// Inspect or edit persisted history. Requires `--data-dir`.
    History {
        /// History action.
        #[command(subcommand)]
        action: HistoryCommand,
    },
}

/// `history` subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum HistoryCommand {
    /// List entries, oldest first. The current entry is marked with `*`.
    List,

    /// Write one entry as a PNG.
    Export {
        /// Entry id.
        id: String,

        /// Target directory.
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },

    /// Delete one entry.
    Delete {
        /// Entry id.
        id: String,

        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },

    /// Delete every entry.
    Clear {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

/// Resolved CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Persisted history directory.
    pub data_dir: Option<PathBuf>,
    /// Engine configuration file.
    pub config_path: Option<PathBuf>,
    /// Text tool font override.
    pub font: Option<PathBuf>,
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        Self {
            data_dir: args.data_dir.clone(),
            config_path: args.config.clone(),
            font: args.font.clone(),
        }
    }
}

impl CliConfig {
    /// Load the engine configuration, applying the font override.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be loaded.
    pub fn engine_config(&self) -> anyhow::Result<DoodlerConfig> {
        let mut config = match &self.config_path {
            Some(path) => DoodlerConfig::from_file(path)?,
            None => DoodlerConfig::default(),
        };
        if let Some(font) = &self.font {
            config.font_path = Some(font.clone());
        }
        Ok(config)
    }

    /// Open the history store: on disk with `--data-dir`, in memory otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn open_store(&self) -> anyhow::Result<Box<dyn HistoryStore>> {
        match &self.data_dir {
            Some(dir) => {
                let store = FileHistoryStore::open(dir)
                    .with_context(|| format!("opening history in {}", dir.display()))?;
                Ok(Box::new(store))
            }
            None => Ok(Box::new(MemoryHistoryStore::new())),
        }
    }

    /// Build a hydrated session.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration, store or history cannot be
    /// loaded.
    pub fn session(&self, config: DoodlerConfig) -> anyhow::Result<Doodler> {
        let renderer = load_text_renderer(config.font_path.as_deref());
        let mut doodler = Doodler::new(config, self.open_store()?, renderer)?;
        let restored = doodler.hydrate()?;
        if restored > 0 {
            tracing::info!("Restored {restored} history entries");
        }
        Ok(doodler)
    }
}

/// Load the text tool font. Missing or broken fonts disable the text tool
/// rather than failing the command.
fn load_text_renderer(path: Option<&Path>) -> Option<Arc<dyn TextRenderer>> {
    let path = path?;
    match GlyphTextRenderer::from_file(path) {
        Ok(renderer) => Some(Arc::new(renderer)),
        Err(e) => {
            tracing::warn!("Text tool disabled: {e}");
            None
        }
    }
}

/// Run a parsed command line.
///
/// # Errors
///
/// Returns the first failure of the selected command.
pub async fn run(args: CliArgs) -> anyhow::Result<()> {
    let cli = CliConfig::from(&args);
    match args.command {
        Command::Edit {
            input,
            prompt,
            output,
            endpoint,
            temperature,
        } => {
            let mut config = cli.engine_config()?;
            if temperature.is_some() {
                config.temperature = temperature;
            }
            run_edit(&cli, config, &input, &prompt, &endpoint, &output).await
        }
        Command::Replay { script, output } => {
            let script = ReplayScript::from_file(&script)?;
            let mut doodler = cli.session(cli.engine_config()?)?;
            run_script(&mut doodler, &script)?;
            write_png(&doodler.render_view()?, &output)?;
            println!("{}", output.display());
            Ok(())
        }
        Command::History { action } => {
            if cli.data_dir.is_none() {
                bail!("history commands need --data-dir or DOODLER_DATA_DIR");
            }
            let mut doodler = cli.session(cli.engine_config()?)?;
            let mut prompt = PromptConfirm::stdio();
            run_history(&mut doodler, &action, &mut prompt)
        }
    }
}

/// Import `input`, submit `prompt` and write the result to `output`.
///
/// # Errors
///
/// Returns an error if the image cannot be read or the generation fails.
/// Generation failures are reported with the user-facing message.
pub async fn run_edit(
    cli: &CliConfig,
    config: DoodlerConfig,
    input: &Path,
    prompt: &str,
    endpoint: &str,
    output: &Path,
) -> anyhow::Result<()> {
    let bytes =
        std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let image = decode_image_bytes(&bytes)?;
    let padding = config.viewport_padding;

    let mut doodler = cli.session(config)?;
    doodler.resize(
        image.width() + padding,
        image.height() + padding,
        ResizeTrigger::Initial,
    )?;
    doodler.import_image(&bytes)?;
    doodler.set_prompt(prompt);

    let generator = HttpImageGenerator::new(endpoint)?;
    tracing::info!("Submitting edit to {}", generator.endpoint());
    match doodler.submit_prompt(&generator).await {
        Ok(id) => tracing::info!("Recorded generated entry {id}"),
        Err(EngineError::Bridge(e)) => {
            tracing::error!("Generation failed: {e}");
            bail!(e.user_message());
        }
        Err(e) => return Err(e.into()),
    }

    write_png(&doodler.render_view()?, output)?;
    println!("{}", output.display());
    Ok(())
}

/// Execute a `history` subcommand against a hydrated session.
///
/// # Errors
///
/// Returns an error for unknown ids or failed exports.
pub fn run_history(
    doodler: &mut Doodler,
    action: &HistoryCommand,
    confirm: &mut dyn Confirm,
) -> anyhow::Result<()> {
    match action {
        HistoryCommand::List => {
            for line in history_lines(doodler) {
                println!("{line}");
            }
        }
        HistoryCommand::Export { id, dir } => {
            let path = doodler.export_item(id, dir)?;
            println!("{}", path.display());
        }
        HistoryCommand::Delete { id, yes } => {
            let deleted = if *yes {
                doodler.delete_item(id, &mut AlwaysConfirm)?
            } else {
                doodler.delete_item(id, confirm)?
            };
            if deleted {
                println!("Deleted {id}");
            }
        }
        HistoryCommand::Clear { yes } => {
            let cleared = if *yes {
                doodler.clear_history(&mut AlwaysConfirm)
            } else {
                doodler.clear_history(confirm)
            };
            if cleared {
                println!("History cleared");
            }
        }
    }
    Ok(())
}

/// One line per history entry: cursor marker, id, kind, timestamp, prompt.
#[must_use]
pub fn history_lines(doodler: &Doodler) -> Vec<String> {
    let history = doodler.history();
    history
        .items()
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let marker = if history.cursor() == Some(i) { '*' } else { ' ' };
            match &item.prompt {
                Some(prompt) => format!(
                    "{marker} {} {:?} {} \"{prompt}\"",
                    item.id, item.kind, item.timestamp
                ),
                None => format!("{marker} {} {:?} {}", item.id, item.kind, item.timestamp),
            }
        })
        .collect()
}
