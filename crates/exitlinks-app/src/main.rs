//! Exitlinks - routes outbound links through a same-site warning page.
//!
//! This binary runs the redirect gate server and exposes the link engine on
//! the command line:
//! - `serve` runs the HTTP server (gate, filter API, client script)
//! - `rewrite` filters an HTML fragment from a file or stdin
//! - `classify` prints the classification of a single href
//! - `config` creates or prints the settings file

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use exitlinks_core::settings::{self, Settings};
use exitlinks_core::{Classifier, ContentFilter, ContentKind, RenderContext};
use exitlinks_server::{Server, ServerConfig, DEFAULT_HOST, DEFAULT_PORT};

/// Exitlinks - external link exit warnings
#[derive(Parser, Debug)]
#[command(name = "exitlinks", version, about)]
struct Args {
    /// Settings file (default: platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured site URL
    #[arg(long, global = true)]
    site_url: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the redirect gate server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = DEFAULT_HOST)]
        host: String,

        /// Port to bind to
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },

    /// Rewrite external links in an HTML fragment
    Rewrite {
        /// Input file (reads stdin when omitted)
        file: Option<PathBuf>,

        /// Kind of content being filtered
        #[arg(long, value_enum, default_value_t = KindArg::Content)]
        kind: KindArg,

        /// Treat the fragment as rendered on an admin screen
        #[arg(long)]
        admin: bool,
    },

    /// Classify a single href as JSON
    Classify {
        /// The href, as written in the content
        href: String,
    },

    /// Manage the settings file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Write a default settings file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective settings
    Show,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum KindArg {
    Content,
    Excerpt,
    Widget,
}

impl From<KindArg> for ContentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Content => ContentKind::Content,
            KindArg::Excerpt => ContentKind::Excerpt,
            KindArg::Widget => ContentKind::Widget,
        }
    }
}

/// Get the logs directory path.
fn logs_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "exitlinks", "exitlinks").map(|dirs| dirs.data_dir().join("logs"))
}

/// Initialize logging with file rotation.
///
/// Console output goes to stderr so `rewrite` and `classify` keep stdout
/// clean for their results.
fn init_logging(args: &Args) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_level = if args.debug { "debug" } else { &args.log_level };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("exitlinks={},warn", log_level)));

    if let Some(log_dir) = logs_dir() {
        if fs::create_dir_all(&log_dir).is_ok() {
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .max_log_files(5)
                .filename_prefix("exitlinks")
                .filename_suffix("log")
                .build(&log_dir)
                .ok();

            if let Some(appender) = file_appender {
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);

                if args.debug {
                    tracing_subscriber::registry()
                        .with(env_filter)
                        .with(fmt::layer().with_writer(io::stderr))
                        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                        .init();
                } else {
                    tracing_subscriber::registry()
                        .with(env_filter)
                        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                        .init();
                }

                tracing::debug!("Logging to {:?}", log_dir);
                return Some(guard);
            }
        }
    }

    // Fallback: console logging only
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();

    tracing::warn!("File logging unavailable, using console only");
    None
}

/// Resolves the settings file path.
fn config_path(args: &Args) -> anyhow::Result<PathBuf> {
    match &args.config {
        Some(path) => Ok(path.clone()),
        None => Ok(settings::default_config_path()?),
    }
}

/// Loads settings from `path` without creating it, then applies overrides.
fn load_settings(path: &Path, site_url: Option<&str>) -> anyhow::Result<Settings> {
    let loaded = if path.exists() {
        settings::load(path).with_context(|| format!("reading {}", path.display()))?
    } else {
        Settings::default()
    };
    Ok(apply_overrides(loaded, site_url))
}

fn apply_overrides(settings: Settings, site_url: Option<&str>) -> Settings {
    match site_url {
        Some(url) => settings.with_site_url(url),
        None => settings,
    }
}

/// Filters `html` with the given settings.
fn rewrite_fragment(settings: Settings, html: &str, kind: ContentKind, admin: bool) -> String {
    let context = if admin {
        RenderContext::Admin
    } else {
        RenderContext::Public
    };
    ContentFilter::new(settings).apply(html, kind, context).html
}

/// Classifies `href` and returns pretty JSON.
fn classify_json(settings: &Settings, href: &str) -> anyhow::Result<String> {
    let classifier = Classifier::new(settings.origin()?).with_options(settings.classifier_options());
    Ok(serde_json::to_string_pretty(&classifier.classify(href))?)
}

fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => fs::read_to_string(path).with_context(|| format!("reading {}", path.display())),
        None => {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Keep the guard alive for the duration of the program
    let _log_guard = init_logging(&args);
    tracing::debug!("Args: {:?}", args);

    let path = config_path(&args)?;
    let site_url = args.site_url.as_deref();

    match &args.command {
        Command::Serve { host, port } => {
            let loaded = settings::load_or_init(&path)
                .with_context(|| format!("loading {}", path.display()))?;
            let settings = apply_overrides(loaded, site_url);
            tracing::info!(
                site_url = %settings.site_url,
                enabled = settings.enable_redirects,
                "Loaded settings from {}",
                path.display()
            );

            let config = ServerConfig::default().with_host(host).with_port(*port);
            Server::new(config, settings)?.run().await?;
        }
        Command::Rewrite { file, kind, admin } => {
            let settings = load_settings(&path, site_url)?;
            settings.validate()?;
            let html = read_input(file.as_deref())?;
            let output = rewrite_fragment(settings, &html, (*kind).into(), *admin);
            io::stdout().write_all(output.as_bytes())?;
        }
        Command::Classify { href } => {
            let settings = load_settings(&path, site_url)?;
            println!("{}", classify_json(&settings, href)?);
        }
        Command::Config { action } => match action {
            ConfigAction::Init { force } => {
                if path.exists() && !force {
                    bail!("{} already exists (use --force to overwrite)", path.display());
                }
                let settings = apply_overrides(Settings::default(), site_url);
                settings.validate()?;
                settings::write(&path, &settings)?;
                println!("Wrote {}", path.display());
            }
            ConfigAction::Show => {
                let settings = load_settings(&path, site_url)?;
                print!("{}", settings.to_toml_string()?);
            }
        },
    }

    Ok(())
}
