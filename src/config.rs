use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::jira::transport::Credentials;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub jira: JiraConfig,
  pub default_project: Option<String>,
  /// Write logs to this file instead of stderr
  pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
  /// Auto-detect based on URL: .atlassian.net = cloud, else on-premise
  #[default]
  Auto,
  /// Jira Cloud - uses Basic auth (email + API token as password)
  Cloud,
  /// Jira On-premise - uses Bearer auth (PAT)
  Onpremise,
}

impl AuthType {
  /// Resolve `Auto` against the server url.
  pub fn resolve(self, url: &str) -> AuthType {
    match self {
      AuthType::Auto => {
        let host = url::Url::parse(url)
          .ok()
          .and_then(|u| u.host_str().map(str::to_lowercase));
        match host {
          Some(h) if h.ends_with(".atlassian.net") => AuthType::Cloud,
          _ => AuthType::Onpremise,
        }
      }
      other => other,
    }
  }
}

fn default_timeout_secs() -> u64 {
  30
}

#[derive(Debug, Clone, Deserialize)]
pub struct JiraConfig {
  pub url: String,
  pub email: Option<String>,
  /// Authentication type: auto, cloud, or onpremise
  #[serde(default)]
  pub auth_type: AuthType,
  /// Log every request and response body at debug level
  #[serde(default)]
  pub enable_request_trace: bool,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl JiraConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }

  /// Build the credentials attached to every request.
  ///
  /// Without a token the client talks to the server anonymously.
  pub fn credentials(&self, token: Option<String>) -> Result<Credentials> {
    let Some(token) = token else {
      return Ok(Credentials::Anonymous);
    };

    match self.auth_type.resolve(&self.url) {
      AuthType::Cloud => {
        let email = self
          .email
          .clone()
          .ok_or_else(|| eyre!("jira.email is required for Jira Cloud authentication"))?;
        Ok(Credentials::Basic {
          username: email,
          password: token,
        })
      }
      _ => Ok(Credentials::Bearer(token)),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./jira-remote.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/jira-remote/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/jira-remote/config.yaml"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("jira-remote.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("jira-remote").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    Ok(config)
  }

  /// Get the Jira API token from environment variables.
  ///
  /// Checks JIRA_REMOTE_TOKEN first, then JIRA_API_TOKEN as fallback.
  pub fn get_api_token() -> Option<String> {
    std::env::var("JIRA_REMOTE_TOKEN")
      .or_else(|_| std::env::var("JIRA_API_TOKEN"))
      .ok()
      .filter(|t| !t.is_empty())
  }
}
