//! # snapfetch
//!
//! Fetch remote images, decode them off the caller's task and keep the most
//! recent one on disk as a PNG.

mod report;

use std::{path::PathBuf, process::ExitCode, time::Duration};

use anyhow::Context;
use clap::Parser;
use snapfetch_config::{
    Config, ConfigLoad, ConfigLoader, ConfigLoaderOptions, ConfigWarnings,
};
use snapfetch_core::ImageFetchService;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::report::{CompletionReport, Gallery};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "snapfetch")]
#[command(about = "Fetch, decode and persist remote images")]
struct Cli {
    /// Image URLs to fetch; each one is submitted independently
    #[arg(required = true, num_args = 1..)]
    urls: Vec<String>,

    /// Path to snapfetch.toml
    #[arg(long, env = "SNAPFETCH_CONFIG")]
    config: Option<PathBuf>,

    /// Alternate .env file to load before reading the environment
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Directory the PNG copy is written into (overrides config)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Name of the PNG copy (overrides config)
    #[arg(long)]
    file_name: Option<String>,

    /// Request timeout, e.g. `15s` or `500ms` (overrides config)
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Print one JSON object per completion
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,snapfetch_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let ConfigLoad {
        mut config,
        mut warnings,
    } = ConfigLoader::with_options(ConfigLoaderOptions {
        config_path: cli.config.clone(),
        env_file: cli.env_file.clone(),
    })
    .load()
    .context("failed to load configuration")?;

    apply_overrides(&cli, &mut config, &mut warnings)?;

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.config_path {
        debug!("using configuration from {}", path.display());
    }
    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }

    let service = ImageFetchService::new(&config.fetch_options())
        .context("failed to build HTTP client")?;
    let store = config.file_store();

    info!(
        "Fetching {} image(s) into {}",
        cli.urls.len(),
        config.output_path().display()
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    for url in &cli.urls {
        service.submit_to(url.clone(), store.clone(), tx.clone());
    }
    drop(tx);

    let mut gallery = Gallery::default();
    while let Some(completion) = rx.recv().await {
        let report = CompletionReport::from_completion(&completion);
        if cli.json {
            let line = serde_json::to_string(&report)
                .context("failed to serialize completion")?;
            println!("{line}");
        } else {
            println!("{}", report.to_text());
        }
        gallery.push(completion.outcome);
    }

    let summary = gallery.summary();
    if cli.json {
        let line = serde_json::to_string(&serde_json::json!({ "summary": summary }))
            .context("failed to serialize summary")?;
        println!("{line}");
    } else {
        println!("{}", summary.to_text());
        for (index, image) in gallery.images().iter().enumerate() {
            let (width, height) = image.dimensions();
            println!("  #{index} {width}x{height} {:?}", image.color());
        }
    }

    Ok(if gallery.is_empty() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Command-line values win over everything the loader resolved.
fn apply_overrides(
    cli: &Cli,
    config: &mut Config,
    warnings: &mut ConfigWarnings,
) -> anyhow::Result<()> {
    let mut overridden = false;
    if let Some(dir) = cli.output_dir.clone() {
        config.storage.dir = dir;
        overridden = true;
    }
    if let Some(name) = cli.file_name.clone() {
        config.storage.file_name = name;
        overridden = true;
    }
    if let Some(timeout) = cli.timeout {
        config.fetch.timeout = timeout;
        overridden = true;
    }
    if overridden {
        let revalidated = config
            .validate()
            .context("invalid command-line override")?;
        merge_warnings(warnings, revalidated);
    }
    Ok(())
}

/// Append warnings from a later validation pass, skipping repeats.
fn merge_warnings(warnings: &mut ConfigWarnings, later: ConfigWarnings) {
    for warning in later.items {
        if !warnings.items.contains(&warning) {
            warnings.items.push(warning);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use snapfetch_config::{ConfigGuardRailError, EnvConfig};
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_overrides() {
        let cli = Cli::try_parse_from([
            "snapfetch",
            "--timeout",
            "1500ms",
            "--file-name",
            "latest.png",
            "--json",
            "http://a/x.png",
            "http://b/y.png",
        ])
        .unwrap();

        assert_eq!(cli.timeout, Some(Duration::from_millis(1500)));
        assert_eq!(cli.file_name.as_deref(), Some("latest.png"));
        assert!(cli.json);
        assert_eq!(cli.urls.len(), 2);
    }

    #[test]
    fn requires_at_least_one_url() {
        assert!(Cli::try_parse_from(["snapfetch"]).is_err());
    }

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["snapfetch"];
        argv.extend_from_slice(args);
        argv.push("http://a/x.png");
        Cli::try_parse_from(argv).unwrap()
    }

    fn load(config_path: &Path, env: EnvConfig) -> ConfigLoad {
        ConfigLoader::new()
            .with_config_path(config_path)
            .load_with_env(env, false)
            .unwrap()
    }

    #[test]
    fn command_line_beats_env_and_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("snapfetch.toml");
        std::fs::write(
            &path,
            "[fetch]\ntimeout = \"12s\"\n[storage]\nfile_name = \"file.png\"\n",
        )
        .unwrap();
        let env = EnvConfig {
            timeout: Some("3s".into()),
            connect_timeout: Some("1s".into()),
            output_dir: Some(PathBuf::from("/from/env")),
            ..EnvConfig::default()
        };
        let ConfigLoad {
            mut config,
            mut warnings,
        } = load(&path, env);
        assert_eq!(config.fetch.timeout, Duration::from_secs(3));
        assert_eq!(config.storage.file_name, "file.png");

        let args = cli(&[
            "--timeout",
            "2s",
            "--file-name",
            "cli.png",
            "--output-dir",
            "/from/cli",
        ]);
        apply_overrides(&args, &mut config, &mut warnings).unwrap();

        assert_eq!(config.fetch.timeout, Duration::from_secs(2));
        assert_eq!(config.storage.file_name, "cli.png");
        assert_eq!(config.storage.dir, PathBuf::from("/from/cli"));
        assert_eq!(config.output_path(), PathBuf::from("/from/cli/cli.png"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn untouched_settings_keep_loaded_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("snapfetch.toml");
        std::fs::write(&path, "[storage]\nfile_name = \"file.png\"\n").unwrap();
        let ConfigLoad {
            mut config,
            mut warnings,
        } = load(&path, EnvConfig::default());
        let before = config.clone();

        apply_overrides(&cli(&[]), &mut config, &mut warnings).unwrap();
        assert_eq!(config, before);
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("snapfetch.toml");
        std::fs::write(&path, "").unwrap();

        for args in [
            &["--file-name", "../x.png"][..],
            &["--file-name", "nested/x.png"][..],
            &["--timeout", "0s"][..],
        ] {
            let ConfigLoad {
                mut config,
                mut warnings,
            } = load(&path, EnvConfig::default());
            let err = apply_overrides(&cli(args), &mut config, &mut warnings)
                .unwrap_err();
            assert!(
                err.downcast_ref::<ConfigGuardRailError>().is_some(),
                "{args:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn override_warnings_are_merged_once() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("snapfetch.toml");
        std::fs::write(&path, "[storage]\nfile_name = \"shot.img\"\n").unwrap();
        let ConfigLoad {
            mut config,
            mut warnings,
        } = load(&path, EnvConfig::default());
        assert_eq!(warnings.len(), 1);

        apply_overrides(&cli(&["--timeout", "45s"]), &mut config, &mut warnings)
            .unwrap();
        assert_eq!(warnings.len(), 1);

        apply_overrides(
            &cli(&["--timeout", "45s", "--file-name", "other.jpg"]),
            &mut config,
            &mut warnings,
        )
        .unwrap();
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn merged_warnings_skip_duplicates() {
        let mut warnings = ConfigWarnings::default();
        warnings.push("a");
        let mut later = ConfigWarnings::default();
        later.push("a");
        later.push("b");

        merge_warnings(&mut warnings, later);
        assert_eq!(warnings.len(), 2);
    }
}
