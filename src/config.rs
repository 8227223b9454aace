use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::TrackerError;

pub const DEFAULT_MAX_RESULTS: u32 = 10000;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    pub jira: Option<JiraConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JiraConfig {
    /// Base URL of the Jira instance, e.g. `https://jira.company.com`.
    pub url: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub api_token: String,
    /// Project key searches and new issues are scoped to.
    pub project: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    /// Jira Cloud identifies users by account id rather than login name.
    /// Guessed from the URL when unset.
    #[serde(default)]
    pub cloud: Option<bool>,
}

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

impl JiraConfig {
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    pub fn is_cloud(&self) -> bool {
        self.cloud.unwrap_or_else(|| is_cloud_url(&self.url))
    }
}

pub fn is_cloud_url(url: &str) -> bool {
    let host = url
        .split("://")
        .last()
        .unwrap_or_default()
        .split(['/', ':'])
        .next()
        .unwrap_or_default();
    host.ends_with(".atlassian.net")
}

/// Source of the Jira settings, read on every call that needs them.
pub trait ConfigProvider: Send + Sync {
    fn get(&self) -> Result<JiraConfig>;
}

impl ConfigProvider for JiraConfig {
    fn get(&self) -> Result<JiraConfig> {
        Ok(self.clone())
    }
}

/// Reads `[jira]` from a TOML file each time it is asked.
pub struct FileConfig {
    path: PathBuf,
}

impl FileConfig {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn from_default_location() -> Self {
        Self::new(config_path())
    }
}

impl ConfigProvider for FileConfig {
    fn get(&self) -> Result<JiraConfig> {
        load_config_from(&self.path)?.jira.ok_or_else(|| {
            TrackerError::Config(format!(
                "no [jira] section in {}",
                self.path.display()
            ))
            .into()
        })
    }
}

pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".issuebridge")
}

fn config_path() -> PathBuf {
    match std::env::var_os("ISSUEBRIDGE_CONFIG") {
        Some(path) => PathBuf::from(path),
        None => data_dir().join("config.toml"),
    }
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: AppConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_file_yields_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("nope.toml")).unwrap();
        assert!(config.jira.is_none());
    }

    #[test]
    fn parses_jira_section() {
        let file = write_config(
            r#"
[jira]
url = "https://jira.company.com/"
email = "me@company.com"
api_token = "secret"
project = "VSEC"
"#,
        );
        let jira = FileConfig::new(file.path().to_path_buf()).get().unwrap();
        assert_eq!(jira.project, "VSEC");
        assert_eq!(jira.base_url(), "https://jira.company.com");
        assert_eq!(jira.max_results, DEFAULT_MAX_RESULTS);
        assert!(!jira.is_cloud());
    }

    #[test]
    fn cloud_is_guessed_from_host() {
        assert!(is_cloud_url("https://company.atlassian.net"));
        assert!(is_cloud_url("https://company.atlassian.net/"));
        assert!(!is_cloud_url("https://jira.company.com"));
        assert!(!is_cloud_url("https://jira.company.com/atlassian.net"));
    }

    #[test]
    fn explicit_cloud_flag_wins() {
        let file = write_config(
            r#"
[jira]
url = "https://jira.company.com"
project = "VSEC"
cloud = true
"#,
        );
        let jira = FileConfig::new(file.path().to_path_buf()).get().unwrap();
        assert!(jira.is_cloud());
    }

    #[test]
    fn missing_jira_section_is_config_error() {
        let file = write_config("");
        let err = FileConfig::new(file.path().to_path_buf()).get().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrackerError>(),
            Some(TrackerError::Config(_))
        ));
    }

    #[test]
    fn invalid_toml_is_reported() {
        let file = write_config("[jira\nurl = ");
        let err = load_config_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }
}
