use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Download settings (`[download]` in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Worker pool size for every fetch phase.
    pub n_thread: usize,
    /// Maximum number of pending download tasks.
    pub capacity: usize,
    /// Root directory for saved files; the CLI falls back to the current directory.
    pub download_dir: Option<PathBuf>,
    /// Connect timeout per request in seconds.
    pub connect_timeout_secs: u64,
    /// Total timeout per request in seconds.
    pub timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            n_thread: 8,
            capacity: 1024,
            download_dir: None,
            connect_timeout_secs: 15,
            timeout_secs: 60,
        }
    }
}

/// User settings (`[user]` in config.toml).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Session cookie sent with every request. Empty means anonymous.
    pub cookie: String,
    /// Optional User-Agent override.
    pub user_agent: Option<String>,
}

/// Site settings (`[site]` in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site root used for search and resolution requests.
    pub base_url: String,
    /// `lang` query parameter for search requests.
    pub lang: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.pixiv.net".to_string(),
            lang: "zh".to_string(),
        }
    }
}

/// Global configuration loaded from `~/.config/pixgrab/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PixgrabConfig {
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub user: UserConfig,
    #[serde(default)]
    pub site: SiteConfig,
}

impl PixgrabConfig {
    /// Headers sent with every site and image request.
    ///
    /// `Cookie` is omitted when no session is configured; `Referer` is always
    /// the site root since image hosts refuse requests without it.
    pub fn request_headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        if !self.user.cookie.trim().is_empty() {
            headers.insert("Cookie".to_string(), self.user.cookie.trim().to_string());
        }
        headers.insert(
            "Referer".to_string(),
            format!("{}/", self.site.base_url.trim_end_matches('/')),
        );
        headers.insert(
            "User-Agent".to_string(),
            self.user
                .user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        );
        headers
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.download.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.download.timeout_secs)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("pixgrab")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<PixgrabConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = PixgrabConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: PixgrabConfig = toml::from_str(&data)?;
    Ok(cfg)
}
