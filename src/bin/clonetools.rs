// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use clonetools::{
    acquire::AcquisitionStatus,
    path::default_config_path,
    prompt::IndicatifPrompter,
    remote::to_browse_url,
    store::{ConfigStore, FileConfigStore, MemoryConfigStore},
    AcquisitionOptions, Acquirer, BatchOptions, BatchPlacementMode, BatchQueueRunner, Config,
    ConfigPatch, EditorId, RepositoryDescriptor, SingleCloneController,
};

use anyhow::{anyhow, bail, Result};
use clap::{Args, Parser, Subcommand};
use std::{io::IsTerminal, path::PathBuf, process::exit};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "clonetools [options] <command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Path to configuration file to use instead of the default.
    #[arg(short, long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Ignore configuration file, and use built-in defaults.
    #[arg(long, global = true, conflicts_with = "config")]
    pub defaults: bool,

    /// Never block on notices, only log them.
    #[arg(long, global = true)]
    pub no_prompt: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    async fn run(self) -> Result<()> {
        let store: Box<dyn ConfigStore> = match (self.defaults, self.config) {
            (true, _) => Box::new(MemoryConfigStore::new(Config::default())),
            (false, Some(path)) => Box::new(FileConfigStore::new(path)),
            (false, None) => Box::new(FileConfigStore::new(default_config_path()?)),
        };
        let interactive = !self.no_prompt && std::io::stdin().is_terminal();

        match self.command {
            Command::Clone(opts) => run_clone(store.as_ref(), opts, interactive).await,
            Command::Zip(opts) => run_zip(store.as_ref(), opts, interactive).await,
            Command::Batch(opts) => run_batch(store.as_ref(), opts, interactive).await,
            Command::List => run_list(store.as_ref()),
            Command::Browse(opts) => run_browse(store.as_ref(), opts),
            Command::Config(opts) => run_config(store.as_ref(), opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Clone repository through git.
    #[command(override_usage = "clonetools clone [options] <target>")]
    Clone(CloneOptions),

    /// Download repository as zip archive, and extract it.
    #[command(override_usage = "clonetools zip [options] <target>")]
    Zip(ZipOptions),

    /// Clone configured repositories one after another.
    #[command(override_usage = "clonetools batch [options] [<button_id>]...")]
    Batch(BatchCliOptions),

    /// List configured repositories.
    #[command(override_usage = "clonetools list")]
    List,

    /// Open repository page in the default browser.
    #[command(override_usage = "clonetools browse <target>")]
    Browse(BrowseOptions),

    /// Show or change configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args, Clone, Debug)]
struct PlacementOptions {
    /// Base directory to place repository in instead of configured one.
    #[arg(short, long, value_name = "path")]
    pub base_dir: Option<PathBuf>,

    /// Name of destination folder.
    #[arg(short, long, value_name = "name")]
    pub folder: Option<String>,

    /// Do not reveal acquired folder in the file manager.
    #[arg(long)]
    pub no_open: bool,

    /// Do not open acquired folder in the editor.
    #[arg(long)]
    pub no_editor: bool,
}

impl PlacementOptions {
    fn acquisition_options(self, config: &Config) -> AcquisitionOptions {
        AcquisitionOptions {
            base_dir: self.base_dir.unwrap_or_else(|| config.base_dir.clone()),
            delete_git_after_clone: false,
            custom_folder_name: self.folder,
            skip_open_folder: self.no_open,
            skip_open_editor: self.no_editor,
        }
    }
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct CloneOptions {
    /// Button identifier from configuration, or repository URL.
    #[arg(required = true, value_name = "target")]
    pub target: String,

    /// Clone through SSH instead of HTTPS.
    #[arg(short, long)]
    pub ssh: bool,

    /// Remove ".git" folder after clone.
    #[arg(short, long)]
    pub delete_git: bool,

    #[command(flatten)]
    pub placement: PlacementOptions,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ZipOptions {
    /// Button identifier from configuration, or repository URL.
    #[arg(required = true, value_name = "target")]
    pub target: String,

    #[command(flatten)]
    pub placement: PlacementOptions,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct BatchCliOptions {
    /// Buttons to clone, all configured buttons if omitted.
    #[arg(value_name = "button_id")]
    pub ids: Vec<String>,

    /// Place every repository under a new group folder.
    #[arg(short, long, value_name = "name")]
    pub group: Option<String>,

    /// Clone through SSH instead of HTTPS.
    #[arg(short, long)]
    pub ssh: bool,

    /// Remove ".git" folder after each clone.
    #[arg(short, long)]
    pub delete_git: bool,

    /// Base directory to place repositories in instead of configured one.
    #[arg(short, long, value_name = "path")]
    pub base_dir: Option<PathBuf>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct BrowseOptions {
    /// Button identifier from configuration, or repository URL.
    #[arg(required = true, value_name = "target")]
    pub target: String,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Show current configuration.
    Show,

    /// Change base directory or editor.
    Set(ConfigSetOptions),

    /// Add or replace a repository button.
    Button(ConfigButtonOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ConfigSetOptions {
    /// Default base directory for acquired repositories.
    #[arg(short, long, value_name = "path")]
    pub base_dir: Option<PathBuf>,

    /// Editor to open acquired repositories with.
    #[arg(short, long, value_name = "editor")]
    pub editor: Option<EditorId>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ConfigButtonOptions {
    /// Button identifier.
    #[arg(required = true, value_name = "button_id")]
    pub id: String,

    /// Repository URL.
    #[arg(required = true, value_name = "url")]
    pub url: String,

    /// Display label.
    #[arg(short, long, value_name = "label")]
    pub label: Option<String>,

    /// Name of destination folder.
    #[arg(short, long, value_name = "name")]
    pub folder: Option<String>,

    /// Clone through SSH instead of HTTPS.
    #[arg(short, long)]
    pub ssh: bool,
}

#[tokio::main]
async fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run().await {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

async fn run() -> Result<()> {
    Cli::parse().run().await
}

fn resolve_target(config: &Config, target: &str) -> RepositoryDescriptor {
    config
        .button(target)
        .cloned()
        .unwrap_or_else(|| RepositoryDescriptor::from_url(target))
}

fn finish(status: AcquisitionStatus) -> Result<()> {
    match status {
        AcquisitionStatus::Error => bail!("acquisition failed"),
        _ => Ok(()),
    }
}

async fn run_clone(store: &dyn ConfigStore, opts: CloneOptions, interactive: bool) -> Result<()> {
    let config = store.get()?;
    let mut item = resolve_target(&config, &opts.target);
    item.use_ssh |= opts.ssh;
    let mut options = opts.placement.acquisition_options(&config);
    options.delete_git_after_clone = opts.delete_git;

    let acquirer = Acquirer::system(config.editor)?;
    let prompter = IndicatifPrompter::spinner(interactive)?;
    let controller = SingleCloneController::new(&acquirer, &prompter, &prompter);
    let result = controller.clone(&item, &options).await;
    prompter.finish();

    finish(result.status())
}

async fn run_zip(store: &dyn ConfigStore, opts: ZipOptions, interactive: bool) -> Result<()> {
    let config = store.get()?;
    let item = resolve_target(&config, &opts.target);
    let options = opts.placement.acquisition_options(&config);

    let acquirer = Acquirer::system(config.editor)?;
    let prompter = IndicatifPrompter::spinner(interactive)?;
    let controller = SingleCloneController::new(&acquirer, &prompter, &prompter);
    let result = controller.download_zip(&item, &options).await;
    prompter.finish();

    finish(result.status())
}

async fn run_batch(
    store: &dyn ConfigStore,
    opts: BatchCliOptions,
    interactive: bool,
) -> Result<()> {
    let config = store.get()?;
    let items = if opts.ids.is_empty() {
        config.buttons.clone()
    } else {
        opts.ids
            .iter()
            .map(|id| {
                config
                    .button(id)
                    .cloned()
                    .ok_or_else(|| anyhow!("no button {id:?} in configuration"))
            })
            .collect::<Result<Vec<_>>>()?
    };

    let options = BatchOptions {
        mode: match opts.group {
            Some(name) => BatchPlacementMode::Group(name),
            None => BatchPlacementMode::Separate,
        },
        delete_git: opts.delete_git,
        use_ssh: opts.ssh,
        base_dir: opts.base_dir.unwrap_or_else(|| config.base_dir.clone()),
    };

    let acquirer = Acquirer::system(config.editor)?;
    let prompter = IndicatifPrompter::spinner(interactive)?;
    let mut runner = BatchQueueRunner::new(&acquirer, &prompter, &prompter);
    let summary = runner.run(&items, &options).await;
    prompter.finish();

    if summary.cancelled {
        bail!("batch cancelled");
    }

    if summary.fail_count > 0 {
        bail!("{} of {} repositories failed", summary.fail_count, items.len());
    }

    Ok(())
}

fn run_list(store: &dyn ConfigStore) -> Result<()> {
    let config = store.get()?;
    info!("base directory: {}", config.base_dir.display());
    info!("editor: {}", config.editor);
    for button in &config.buttons {
        let url = if button.is_configured() {
            button.repo_url.as_str()
        } else {
            "<no url>"
        };
        info!("{}: {} {url}", button.id, button.display_name());
    }

    Ok(())
}

fn run_browse(store: &dyn ConfigStore, opts: BrowseOptions) -> Result<()> {
    let config = store.get()?;
    let item = resolve_target(&config, &opts.target);
    if !item.is_configured() {
        bail!("button {} has no URL", item.id);
    }

    let acquirer = Acquirer::system(config.editor)?;
    let url = to_browse_url(&item.repo_url);
    info!("open {url}");
    acquirer.open_url(&url);

    Ok(())
}

fn run_config(store: &dyn ConfigStore, opts: ConfigCommand) -> Result<()> {
    match opts {
        ConfigCommand::Show => {
            info!("\n{}", store.get()?);
        }
        ConfigCommand::Set(opts) => {
            store.set(ConfigPatch {
                base_dir: opts.base_dir,
                editor: opts.editor,
                buttons: None,
            })?;
        }
        ConfigCommand::Button(opts) => {
            let mut buttons = store.get()?.buttons;
            let button = RepositoryDescriptor {
                id: opts.id,
                label: opts.label,
                repo_url: opts.url,
                folder_name: opts.folder,
                use_ssh: opts.ssh,
            };
            match buttons.iter_mut().find(|entry| entry.id == button.id) {
                Some(entry) => *entry = button,
                None => buttons.push(button),
            }
            store.set(ConfigPatch {
                buttons: Some(buttons),
                ..Default::default()
            })?;
        }
    }

    Ok(())
}
