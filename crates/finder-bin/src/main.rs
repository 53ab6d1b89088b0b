use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{info, warn};

use finder_platform::filesystem::FileProvider;
use finder_platform::mode;
use finder_platform::options::ProviderOptions;

mod config;

use config::HarnessConfig;

#[derive(Parser, Debug)]
#[command(name = "finder-fs")]
#[command(about = "Exercise the local filesystem provider by hand")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(long, env = "FINDER_CONFIG_PATH", global = true)]
    config_path: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "FINDER_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(flatten)]
    File(FileCommand),
    /// Write the current config (defaults if none) to the config path
    InitConfig,
}

#[derive(Subcommand, Debug)]
enum FileCommand {
    /// List a directory's children
    List {
        path: String,
        /// Only keep names containing this substring
        #[arg(long)]
        keyword: Option<String>,
    },
    /// Show metadata, with child counts for directories
    Stat { path: String },
    /// Print a file's raw bytes to stdout
    Read { path: String },
    /// Write --text, or stdin, to a file
    Write {
        path: String,
        /// Mode applied when the file is created (octal or rwx form)
        #[arg(long)]
        mode: Option<String>,
        #[arg(long)]
        text: Option<String>,
    },
    /// Create a directory and any missing parents
    Mkdir {
        path: String,
        #[arg(long)]
        mode: Option<String>,
    },
    Copy { src: String, dest: String },
    Move { src: String, dest: String },
    Rename { src: String, dest: String },
    /// Delete a file or directory tree
    Remove { path: String },
    Chmod { path: String, mode: String },
    /// Convert a mode between octal and symbolic notation
    Mode { value: String },
    /// List, stat and read one sample path, printing what each returns
    Demo { path: String },
}

#[derive(Serialize)]
struct ModeReport {
    symbolic: String,
    octal: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config_path
        .map(PathBuf::from)
        .unwrap_or_else(HarnessConfig::default_path);
    let config = HarnessConfig::load_or_default(&config_path)?;

    // Initialize logging; stdout is reserved for command output
    let log_level = cli
        .log_level
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::InitConfig => {
            config.save(&config_path)?;
            info!("config saved to {}", config_path.display());
            Ok(())
        }
        Commands::File(command) => {
            let provider = create_provider(config.provider)?;
            run_command(command, provider.as_ref()).await
        }
    }
}

async fn run_command(command: FileCommand, fs: &dyn FileProvider) -> Result<()> {
    match command {
        FileCommand::List { path, keyword } => {
            let entries = fs
                .list_file(&path, keyword.as_deref())
                .await
                .with_context(|| format!("list {} failed", path))?;
            print_json(&entries)?;
        }
        FileCommand::Stat { path } => {
            let stat = fs.stat(&path).await.with_context(|| format!("stat {} failed", path))?;
            print_json(&stat)?;
        }
        FileCommand::Read { path } => {
            let data = fs.read_file(&path).await.with_context(|| format!("read {} failed", path))?;
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&data).await?;
            stdout.flush().await?;
        }
        FileCommand::Write { path, mode, text } => {
            let mode = mode.as_deref().map(mode::parse_mode).transpose()?;
            let data = match text {
                Some(text) => text.into_bytes(),
                None => {
                    let mut buf = Vec::new();
                    tokio::io::stdin()
                        .read_to_end(&mut buf)
                        .await
                        .context("failed to read stdin")?;
                    buf
                }
            };
            fs.write_file(&path, &data, mode)
                .await
                .with_context(|| format!("write {} failed", path))?;
            info!("wrote {} bytes to {}", data.len(), path);
        }
        FileCommand::Mkdir { path, mode } => {
            let mode = mode.as_deref().map(mode::parse_mode).transpose()?;
            fs.make_dir(&path, mode)
                .await
                .with_context(|| format!("mkdir {} failed", path))?;
        }
        FileCommand::Copy { src, dest } => {
            fs.copy(&src, &dest)
                .await
                .with_context(|| format!("copy {} -> {} failed", src, dest))?;
        }
        FileCommand::Move { src, dest } => {
            fs.move_entry(&src, &dest)
                .await
                .with_context(|| format!("move {} -> {} failed", src, dest))?;
        }
        FileCommand::Rename { src, dest } => {
            fs.rename(&src, &dest)
                .await
                .with_context(|| format!("rename {} -> {} failed", src, dest))?;
        }
        FileCommand::Remove { path } => {
            fs.remove(&path).await.with_context(|| format!("remove {} failed", path))?;
        }
        FileCommand::Chmod { path, mode } => {
            let bits = mode::parse_mode(&mode)?;
            fs.chmod(&path, bits)
                .await
                .with_context(|| format!("chmod {} failed", path))?;
        }
        FileCommand::Mode { value } => {
            print_json(&convert_mode(&value)?)?;
        }
        FileCommand::Demo { path } => run_demo(fs, &path).await?,
    }
    Ok(())
}

fn convert_mode(value: &str) -> Result<ModeReport> {
    let report = match mode::octal_to_symbolic(value) {
        Ok(symbolic) => ModeReport {
            octal: mode::symbolic_to_octal(&symbolic)?,
            symbolic,
        },
        Err(_) => ModeReport {
            octal: mode::symbolic_to_octal(value)?,
            symbolic: value.to_string(),
        },
    };
    Ok(report)
}

/// Runs each read-only operation against `path` and reports, never aborting
/// on the first failure.
async fn run_demo(fs: &dyn FileProvider, path: &str) -> Result<()> {
    match fs.list_file(path, None).await {
        Ok(entries) => {
            println!("\n - list data");
            print_json(&entries)?;
        }
        Err(e) => warn!("list error: {}", e),
    }

    match fs.stat(path).await {
        Ok(stat) => {
            println!("\n - stat data");
            print_json(&stat)?;
        }
        Err(e) => warn!("stat error: {}", e),
    }

    match fs.read_file(path).await {
        Ok(data) => {
            println!("\n - readFile data");
            println!("{}", String::from_utf8_lossy(&data));
        }
        Err(e) => warn!("readFile error: {} ({})", e, e.code()),
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(unix)]
fn create_provider(options: ProviderOptions) -> Result<Box<dyn FileProvider>> {
    Ok(Box::new(finder_unix::UnixFileProvider::with_options(options)))
}

#[cfg(not(unix))]
fn create_provider(_options: ProviderOptions) -> Result<Box<dyn FileProvider>> {
    anyhow::bail!("no filesystem provider for this platform")
}
