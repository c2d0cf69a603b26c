mod archive;
mod collect;
mod config;
mod differ;
mod error;
mod fetch;
mod json_apply;
mod json_diff;
mod logging;
mod manifest;
mod patch;
mod patch_format;
mod prompt;
mod util;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use crate::collect::{CollectRequest, OutputMode};
use crate::config::BuildConfig;
use crate::error::ModResult;
use crate::fetch::Channel;
use crate::manifest::{ManifestRecord, ModSide, ModType};
use crate::prompt::{ConsolePrompt, Prompt};

#[derive(Parser)]
#[command(
    name = "modmaker",
    about = "Package changed game assets into a content mod by diffing them against the vanilla baseline"
)]
struct Cli {
    /// Baseline game version to diff against
    #[arg(value_name = "VERSION", env = "MODMAKER_GAME_VERSION")]
    game_version: Option<String>,
    /// Release channel the baseline is downloaded from
    #[arg(long, value_enum, env = "MODMAKER_CHANNEL", default_value = "stable")]
    channel: Channel,
    /// Locally modified asset folder
    #[arg(long, env = "MODMAKER_ASSETS")]
    assets: Option<PathBuf>,
    /// Folder the finished mod archive is written to
    #[arg(long, env = "MODMAKER_MODS_DIR")]
    mods_dir: Option<PathBuf>,
    /// Cache folder for downloaded baseline assets
    #[arg(long, env = "MODMAKER_CACHE_DIR")]
    cache_dir: Option<PathBuf>,
    /// Scratch folder the mod is assembled in (deleted on every run)
    #[arg(long)]
    staging_dir: Option<PathBuf>,
    /// Server the baseline archive is downloaded from
    #[arg(long, env = "MODMAKER_ORIGIN", default_value = fetch::DEFAULT_ORIGIN)]
    origin: String,
    /// Emit JSON patches or verbatim copies of changed files
    #[arg(long, value_enum, default_value = "patch")]
    mode: OutputMode,
    /// Asset domain the changed files belong to
    #[arg(long, default_value = "game")]
    namespace: String,
    /// Mod name (prompted when omitted)
    #[arg(long)]
    name: Option<String>,
    /// Author name (prompted when omitted)
    #[arg(long)]
    author: Option<String>,
    /// Mod type written to the manifest
    #[arg(long, value_enum, default_value = "content")]
    mod_type: ModType,
    /// Side the mod is required on
    #[arg(long, value_enum, default_value = "universal")]
    side: ModSide,
    /// Replay each patch against the baseline before packing it
    #[arg(long)]
    verify: bool,
    /// Exit without waiting for enter
    #[arg(long)]
    no_wait: bool,
    /// More diagnostics on stderr (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

enum Outcome {
    Built { archive: PathBuf, entries: usize },
    NoDifferences,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let no_wait = cli.no_wait;
    let mut console = ConsolePrompt;

    let code = match run(cli, &mut console).await {
        Ok(Outcome::Built { archive, entries }) => {
            println!("Archive created with {} entries: {}", entries, archive.display());
            println!("Congratulations, you created a mod! \\o/");
            println!("The mod is already in your mods folder, so feel free to install a new version of the game now.");
            0
        }
        Ok(Outcome::NoDifferences) => {
            println!("No differences detected! Aborting mod creation.");
            0
        }
        Err(err) => {
            tracing::error!("mod creation failed: {:#}", err);
            println!("Exception thrown trying to extract a mod :<\n{:?}", err);
            error::exit_code_for(&err)
        }
    };

    if !no_wait {
        let _ = console.pause("Hit enter to exit");
    }
    ExitCode::from(code)
}

fn resolve_config(cli: &Cli) -> Result<BuildConfig> {
    let version = cli
        .game_version
        .clone()
        .context("No baseline version given: pass it as the first argument or set MODMAKER_GAME_VERSION")?;

    Ok(BuildConfig {
        version,
        channel: cli.channel,
        origin: cli.origin.clone(),
        assets_root: match &cli.assets {
            Some(path) => path.clone(),
            None => config::default_assets_root()?,
        },
        mods_dir: match &cli.mods_dir {
            Some(path) => path.clone(),
            None => config::default_mods_dir()?,
        },
        cache_root: cli.cache_dir.clone().unwrap_or_else(config::default_cache_root),
        staging_dir: cli.staging_dir.clone().unwrap_or_else(config::default_staging_dir),
        namespace: cli.namespace.clone(),
        mode: cli.mode,
        mod_type: cli.mod_type,
        side: cli.side,
        verify: cli.verify,
    })
}

/// Run a filesystem-heavy stage off the async runtime.
async fn blocking<T, F>(stage: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> ModResult<T> + Send + 'static,
{
    Ok(tokio::task::spawn_blocking(stage)
        .await
        .context("Worker task panicked")??)
}

async fn run(cli: Cli, console: &mut dyn Prompt) -> Result<Outcome> {
    let config = resolve_config(&cli)?;
    let start = Instant::now();

    println!("Baseline version is {} ({})", config.version, config.channel.path_segment());
    println!("Modded folder is {}", config.assets_root.display());

    let baseline = fetch::ensure_baseline(&config.cache_root, &config.origin, config.channel, &config.version).await?;

    let differences = {
        let (baseline, modified) = (baseline.clone(), config.assets_root.clone());
        blocking(move || differ::find_differences(&baseline, &modified)).await?
    };
    if differences.is_empty() {
        return Ok(Outcome::NoDifferences);
    }
    tracing::info!("{} files differ from the baseline", differences.len());

    let name = prompt::answer_or_ask(cli.name, console, "Please enter a name for your mod")?;
    let author = prompt::answer_or_ask(cli.author, console, "Please enter an author name for your mod")?;
    let manifest = ManifestRecord::new(&name, &author, config.mod_type, config.side)?;

    println!("Thanks! Generating modinfo and copying modified files...");

    let summary = {
        let (config, manifest, baseline) = (config.clone(), manifest.clone(), baseline.clone());
        blocking(move || {
            let request = CollectRequest {
                differences: &differences,
                baseline_root: &baseline,
                modified_root: &config.assets_root,
                staging_root: &config.staging_dir,
                namespace: &config.namespace,
                mode: config.mode,
                verify: config.verify,
            };
            collect::collect(&request, &manifest)
        })
        .await?
    };
    tracing::info!(
        "staged {} patches and {} copies",
        summary.patches_written,
        summary.files_copied
    );

    let archive_path = config.archive_path(&manifest.modid);
    println!("Done. Packing all into mod archive {}...", archive_path.display());

    let archive = {
        let (staging, output) = (config.staging_dir.clone(), archive_path.clone());
        blocking(move || archive::build_archive(&staging, &output)).await?
    };
    tracing::info!(
        "packed {} bytes in {:.3}s",
        archive.bytes,
        start.elapsed().as_secs_f64()
    );

    Ok(Outcome::Built {
        archive: archive_path,
        entries: archive.entries,
    })
}
