mod fetch;
mod remote_assets;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use talkar_core::{Duration, FetchFailurePolicy, TalkarConfig, Vec3};
use talkar_ir::{validate_document, ExperienceDocument};
use talkar_runtime::{
    run_experience, AssetTable, Experience, HeadlessHost, RunOptions, RunSummary, UrlPolicy,
};

use crate::fetch::{load_document, DocumentSource};
use crate::remote_assets::{default_cache_root, expand_tilde, HttpAssetFetcher};

const DEFAULT_CONFIG_FILE: &str = "talkar.toml";

#[derive(Parser)]
#[command(
    name = "talkar",
    version,
    about = "TalkAR: run AR experience documents headlessly",
    long_about = "Fetches a TalkAR experience document, loads its assets and plays it\nagainst an in-memory scene, printing the resulting scene graph as JSON."
)]
struct Cli {
    /// Configuration file (default: ./talkar.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an experience and print the final scene graph
    Run {
        /// Document path, experience page URL or experience id
        #[arg()]
        source: String,

        /// Tap point in world space, as x,y,z
        #[arg(long, value_parser = parse_point, default_value = "0,0,0")]
        tap: Vec3,

        /// Never tap, so the experience waits for the user forever
        #[arg(long)]
        no_tap: bool,

        /// Seconds to run before taking the snapshot
        #[arg(short, long, default_value_t = 15.0)]
        duration: f64,

        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Asset cache directory (default: the user cache dir)
        #[arg(long)]
        cache_dir: Option<String>,

        /// Download every asset, bypassing the cache
        #[arg(long)]
        no_cache: bool,
    },
    /// Validate a document without running it
    Check {
        #[arg()]
        source: String,
    },
    /// List the resolved URL of every asset in a document
    Assets {
        #[arg()]
        source: String,
    },
    /// Print the effective configuration, or write it to a file
    Config {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = init_tracing();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            source,
            tap,
            no_tap,
            duration,
            output,
            cache_dir,
            no_cache,
        } => {
            let cache_root = if no_cache {
                None
            } else {
                match cache_dir {
                    Some(dir) => Some(expand_tilde(&dir)?),
                    None => default_cache_root(),
                }
            };
            let options = RunOptions {
                tap: (!no_tap).then_some(tap),
                horizon: Duration::from_seconds(duration),
                events: None,
            };
            cmd_run(&source, config, options, cache_root, output, &filter).await
        }
        Commands::Check { source } => cmd_check(&source, &config).await,
        Commands::Assets { source } => cmd_assets(&source, &config).await,
        Commands::Config { output } => cmd_config(&config, output),
    }
}

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Logs go to stderr; stdout carries the JSON report.
fn init_tracing() -> FilterHandle {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter, handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
    handle
}

/// A document with `debug: true` raises the default level, unless
/// `RUST_LOG` says otherwise.
fn apply_debug_flag(doc: &ExperienceDocument, filter: &FilterHandle) {
    if !doc.is_debug() || std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        return;
    }
    if let Err(e) = filter.modify(|f| *f = EnvFilter::new("debug")) {
        tracing::warn!("Could not raise log level: {}", e);
    } else {
        tracing::debug!("Debug logging enabled by the document");
    }
}

fn load_config(path: Option<&Path>) -> Result<TalkarConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.exists() {
                return Ok(TalkarConfig::default());
            }
            default
        }
    };
    tracing::debug!("Loading config from {}", path.display());
    TalkarConfig::load_from_file(&path)
        .with_context(|| format!("failed to load config: {}", path.display()))
}

fn parse_point(s: &str) -> Result<Vec3, String> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid coordinate in '{}': {}", s, e))?;
    match parts.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(format!("expected x,y,z but got '{}'", s)),
    }
}

fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("talkar/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")
}

#[derive(Serialize)]
struct RunReport<'a> {
    summary: &'a RunSummary,
    scene: &'a HeadlessHost,
}

async fn cmd_run(
    source: &str,
    config: TalkarConfig,
    options: RunOptions,
    cache_root: Option<PathBuf>,
    output: Option<PathBuf>,
    filter: &FilterHandle,
) -> Result<()> {
    let client = http_client()?;
    let source = DocumentSource::parse(source, &config.api.base_url)?;

    let doc = match load_document(&client, &source).await {
        Ok(doc) => doc,
        Err(e) => match config.errors.fetch_failure {
            FetchFailurePolicy::Silent => {
                tracing::error!("Could not load experience: {}", e);
                return Ok(());
            }
            FetchFailurePolicy::Surface => {
                return Err(e).context("could not load experience");
            }
        },
    };
    apply_debug_flag(&doc, filter);

    let mut experience = Experience::new(doc, config).map_err(|errors| {
        let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        anyhow::anyhow!("invalid experience document:\n  {}", msgs.join("\n  "))
    })?;

    let fetcher = HttpAssetFetcher::new(client, cache_root);
    let mut host = HeadlessHost::new();
    let summary = run_experience(&mut experience, &mut host, &fetcher, options).await;

    let report = RunReport {
        summary: &summary,
        scene: &host,
    };
    let json = serde_json::to_string_pretty(&report)?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("failed to write report: {}", path.display()))?;
            tracing::info!("Report written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

async fn cmd_check(source: &str, config: &TalkarConfig) -> Result<()> {
    let source = DocumentSource::parse(source, &config.api.base_url)?;
    println!("Checking {}", source);

    let doc = load_document(&http_client()?, &source)
        .await
        .context("could not load experience")?;
    println!("   ✓ Parse OK");

    match validate_document(&doc) {
        Ok(plan) => {
            println!("   ✓ Structure OK");
            println!(
                "   {} assets, {} elements ({} materialized), {} lights",
                doc.assets.len(),
                doc.elements.len(),
                plan.len(),
                doc.lights.len()
            );
            Ok(())
        }
        Err(errors) => {
            let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::bail!("Validation failed:\n  {}", msgs.join("\n  "));
        }
    }
}

async fn cmd_assets(source: &str, config: &TalkarConfig) -> Result<()> {
    let source = DocumentSource::parse(source, &config.api.base_url)?;
    let doc = load_document(&http_client()?, &source)
        .await
        .context("could not load experience")?;

    let table = AssetTable::new(&doc.assets, &UrlPolicy::from_config(&config.assets));
    for request in table.requests() {
        println!("{}\t{}\t{}", request.name, request.kind, request.url);
    }
    Ok(())
}

fn cmd_config(config: &TalkarConfig, output: Option<PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            config
                .save_to_file(&path)
                .with_context(|| format!("failed to write config: {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => print!("{}", config.to_toml_string()?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_point() {
        assert_eq!(parse_point("1, -2.5,0").unwrap(), Vec3::new(1.0, -2.5, 0.0));
        assert!(parse_point("1,2").is_err());
        assert!(parse_point("a,b,c").is_err());
    }

    #[test]
    fn test_cli_parses_run_flags() {
        let cli = Cli::try_parse_from([
            "talkar", "run", "doc.json", "--tap", "0,1,2", "--duration", "3", "--no-cache",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                tap,
                duration,
                no_cache,
                no_tap,
                ..
            } => {
                assert_eq!(tap, Vec3::new(0.0, 1.0, 2.0));
                assert_eq!(duration, 3.0);
                assert!(no_cache);
                assert!(!no_tap);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_missing_default_config_uses_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.timing.start_grace_ms, 10);
    }
}
