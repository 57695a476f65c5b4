use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use serde::Deserialize;
use siege_core::{RequestTemplate, SiegeConfig};

use crate::cli::RunArgs;

#[derive(Debug, Deserialize)]
struct FileConfig {
    urls: Vec<FileUrl>,

    /// Siege duration in seconds.
    #[serde(default = "default_duration_secs")]
    duration: u64,

    max_concurrent: usize,
    max_rps: u64,
}

fn default_duration_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize)]
struct FileUrl {
    url: String,

    #[serde(default)]
    method: String,

    #[serde(default)]
    headers: HashMap<String, String>,

    #[serde(default)]
    body: String,

    #[serde(default)]
    repeat: u32,
}

/// Loads the JSON config file and applies CLI overrides on top.
pub async fn load(path: &Path, args: &RunArgs) -> anyhow::Result<SiegeConfig> {
    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let file: FileConfig = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    resolve(file, args)
}

fn resolve(file: FileConfig, args: &RunArgs) -> anyhow::Result<SiegeConfig> {
    let mut cfg = SiegeConfig {
        urls: file
            .urls
            .into_iter()
            .map(|u| RequestTemplate {
                url: u.url,
                method: u.method,
                headers: u.headers,
                body: u.body,
                repeat: u.repeat,
            })
            .collect(),
        duration: Duration::from_secs(file.duration),
        max_concurrent: file.max_concurrent,
        max_rps: file.max_rps,
    };

    // Only positive flag values override the file.
    if let Some(v) = args.max_rps.filter(|v| *v > 0) {
        cfg.max_rps = v;
    }
    if let Some(v) = args.max_concurrent.filter(|v| *v > 0) {
        cfg.max_concurrent = v;
    }
    if let Some(v) = args.duration {
        cfg.duration = Duration::from_secs(v);
    }

    anyhow::ensure!(!cfg.urls.is_empty(), "config must list at least one url");
    anyhow::ensure!(
        cfg.max_concurrent > 0,
        "`max_concurrent` must be a positive integer"
    );
    anyhow::ensure!(cfg.max_rps > 0, "`max_rps` must be a positive integer");
    anyhow::ensure!(
        cfg.urls.iter().map(|u| u64::from(u.repeat)).sum::<u64>() > 0,
        "urls must contribute at least one request (`repeat` > 0)"
    );

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> FileConfig {
        serde_json::from_str(json).unwrap_or_else(|err| panic!("bad test json: {err}"))
    }

    fn no_overrides() -> RunArgs {
        RunArgs {
            config: Path::new("siege.json").to_path_buf(),
            max_rps: None,
            max_concurrent: None,
            duration: None,
        }
    }

    const SAMPLE: &str = r#"{
        "urls": [
            {"url": "http://x/a", "method": "GET", "repeat": 2},
            {"url": "http://x/b", "method": "POST", "headers": {"x-k": "v"}, "body": "p", "repeat": 3}
        ],
        "duration": 5,
        "max_concurrent": 4,
        "max_rps": 100
    }"#;

    #[test]
    fn file_values_resolve_without_overrides() -> anyhow::Result<()> {
        let cfg = resolve(parse(SAMPLE), &no_overrides())?;

        assert_eq!(cfg.urls.len(), 2);
        assert_eq!(cfg.urls[1].headers.get("x-k").map(String::as_str), Some("v"));
        assert_eq!(cfg.duration, Duration::from_secs(5));
        assert_eq!(cfg.max_concurrent, 4);
        assert_eq!(cfg.max_rps, 100);
        Ok(())
    }

    #[test]
    fn positive_flags_override_the_file() -> anyhow::Result<()> {
        let args = RunArgs {
            config: Path::new("siege.json").to_path_buf(),
            max_rps: Some(10),
            max_concurrent: Some(2),
            duration: Some(1),
        };

        let cfg = resolve(parse(SAMPLE), &args)?;
        assert_eq!(cfg.max_rps, 10);
        assert_eq!(cfg.max_concurrent, 2);
        assert_eq!(cfg.duration, Duration::from_secs(1));
        Ok(())
    }

    #[test]
    fn zero_flags_keep_the_file_values() -> anyhow::Result<()> {
        let args = RunArgs {
            config: Path::new("siege.json").to_path_buf(),
            max_rps: Some(0),
            max_concurrent: Some(0),
            duration: None,
        };

        let cfg = resolve(parse(SAMPLE), &args)?;
        assert_eq!(cfg.max_rps, 100);
        assert_eq!(cfg.max_concurrent, 4);
        Ok(())
    }

    #[test]
    fn missing_duration_defaults_to_sixty_seconds() -> anyhow::Result<()> {
        let json = r#"{
            "urls": [{"url": "http://x/a", "repeat": 1}],
            "max_concurrent": 1,
            "max_rps": 1
        }"#;

        let cfg = resolve(parse(json), &no_overrides())?;
        assert_eq!(cfg.duration, Duration::from_secs(60));
        Ok(())
    }

    #[test]
    fn all_zero_repeats_are_rejected() {
        let json = r#"{
            "urls": [{"url": "http://x/a", "repeat": 0}],
            "max_concurrent": 1,
            "max_rps": 1
        }"#;

        assert!(resolve(parse(json), &no_overrides()).is_err());
    }

    #[test]
    fn empty_url_list_is_rejected() {
        let json = r#"{"urls": [], "max_concurrent": 1, "max_rps": 1}"#;
        assert!(resolve(parse(json), &no_overrides()).is_err());
    }
}
