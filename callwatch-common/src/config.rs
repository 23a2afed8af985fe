//! Client configuration and endpoint resolution

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::{Error, Result};

const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL for REST calls, no trailing slash
    pub api_url: String,
    /// Base URL for the transcript socket, no trailing slash
    pub ws_url: String,
    pub request_timeout: Duration,
}

/// On-disk configuration file shape (`~/.config/callwatch/config.toml`).
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    api_url: Option<String>,
    ws_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

impl ClientConfig {
    /// Resolve configuration following the priority order:
    /// 1. Command-line argument (highest priority)
    /// 2. Environment variable (`CALLWATCH_API_URL` / `CALLWATCH_WS_URL`)
    /// 3. TOML config file
    /// 4. Compiled default (fallback)
    ///
    /// The socket URL, when not given at any tier, is derived from the
    /// API URL by swapping the scheme to ws/wss.
    pub fn resolve(cli_api_url: Option<&str>, cli_ws_url: Option<&str>) -> Result<Self> {
        let file = load_config_file().unwrap_or_default();

        let api_url = cli_api_url
            .map(str::to_owned)
            .or_else(|| std::env::var("CALLWATCH_API_URL").ok())
            .or(file.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = api_url.trim_end_matches('/').to_string();

        let ws_url = cli_ws_url
            .map(str::to_owned)
            .or_else(|| std::env::var("CALLWATCH_WS_URL").ok())
            .or(file.ws_url)
            .map(|u| u.trim_end_matches('/').to_string())
            .map(Ok)
            .unwrap_or_else(|| ws_url_from_api(&api_url))?;

        let timeout_secs = file
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        Ok(Self {
            api_url,
            ws_url,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Socket endpoint for a campaign group's transcript channel.
    pub fn transcript_socket_url(&self, group_id: &str) -> String {
        format!("{}/ws/transcript/{}", self.ws_url, group_id)
    }
}

/// Derive the socket base URL from the REST base URL.
fn ws_url_from_api(api_url: &str) -> Result<String> {
    if let Some(rest) = api_url.strip_prefix("https://") {
        Ok(format!("wss://{}", rest))
    } else if let Some(rest) = api_url.strip_prefix("http://") {
        Ok(format!("ws://{}", rest))
    } else {
        Err(Error::Config(format!(
            "cannot derive socket URL from API URL: {}",
            api_url
        )))
    }
}

/// Get default configuration file path for the platform
fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("callwatch").join("config.toml"))
}

fn load_config_file() -> Result<ConfigFile> {
    let path = config_file_path()
        .ok_or_else(|| Error::Config("could not determine config directory".to_string()))?;
    if !path.exists() {
        return Err(Error::Config(format!("config file not found: {:?}", path)));
    }
    let content = std::fs::read_to_string(&path)?;
    tracing::debug!(path = %path.display(), "loaded config file");
    toml::from_str(&content).map_err(|e| Error::Config(format!("invalid config file: {}", e)))
}
