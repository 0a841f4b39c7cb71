//! Bot configuration, loaded from `~/.coverbot/config.toml`.
//!
//! Every section has workable defaults so a missing file still yields a
//! usable `Config`; portal credentials are the only values that must be
//! filled in before the coverage and directory workflows can log in.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Browser launch and step-timeout settings.
    #[serde(default)]
    pub browser: BrowserSettings,
    /// Coverage portal (delivery + internet lookups).
    #[serde(default)]
    pub coverage: CoveragePortal,
    /// Public tax-registry portal.
    #[serde(default)]
    pub registry: RegistryPortal,
    /// Authenticated phone-directory portal.
    #[serde(default)]
    pub directory: DirectoryPortal,
    /// Peer scraping service.
    #[serde(default)]
    pub gateway: GatewaySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSettings {
    /// Run Chrome headless. Turn off to watch a session while debugging.
    pub headless: bool,
    /// Bound on every page navigation.
    pub nav_timeout_secs: u64,
    /// Bound on waits for required elements.
    pub element_timeout_secs: u64,
    /// Probe window for optional elements (modals, confirm buttons).
    pub probe_timeout_secs: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            nav_timeout_secs: 30,
            element_timeout_secs: 10,
            probe_timeout_secs: 3,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoveragePortal {
    /// Base URL; `login`, `cobertura-delivery` and
    /// `buscar-casa-coordenada/31` hang off this.
    pub base_url: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryPortal {
    pub url: String,
    /// The registry blocks the default headless UA, so a desktop one is
    /// sent instead.
    pub user_agent: String,
}

impl Default for RegistryPortal {
    fn default() -> Self {
        Self {
            url: "https://e-consultaruc.sunat.gob.pe/cl-ti-itmrconsruc/FrameCriterioBusquedaWeb.jsp"
                .into(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryPortal {
    pub login_url: String,
    pub operations_url: String,
    pub username: String,
    pub password: String,
}

impl Default for DirectoryPortal {
    fn default() -> Self {
        Self {
            login_url: "https://entel.insolutions.pe/entelid-portal/".into(),
            operations_url: "https://entel.insolutions.pe/entelid-portal/Operation".into(),
            username: String::new(),
            password: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    pub url: String,
    /// Per-call bound for single lookups.
    pub timeout_secs: u64,
    /// Bound for lookup kinds that fan out into extra portal queries.
    pub extended_timeout_secs: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:5555".into(),
            timeout_secs: 30,
            extended_timeout_secs: 90,
        }
    }
}

impl Config {
    fn default_path() -> PathBuf {
        let home_dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home_dir.join(".coverbot").join("config.toml")
    }

    /// Load configuration from file, falling back to defaults when absent.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = path.unwrap_or_else(Self::default_path);
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file.
    pub fn save(&self, path: Option<PathBuf>) -> Result<()> {
        let config_path = path.unwrap_or_else(Self::default_path);
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_headless_with_bounded_waits() {
        let config = Config::default();
        assert!(config.browser.headless);
        assert_eq!(config.browser.nav_timeout_secs, 30);
        assert_eq!(config.gateway.url, "http://localhost:5555");
        assert!(config.gateway.extended_timeout_secs > config.gateway.timeout_secs);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.coverage.base_url = "https://portal.example/".into();
        config.coverage.username = "user".into();
        config.save(Some(path.clone())).unwrap();

        let loaded = Config::load(Some(path)).unwrap();
        assert_eq!(loaded.coverage.base_url, "https://portal.example/");
        assert_eq!(loaded.coverage.username, "user");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let loaded = Config::load(Some(PathBuf::from("/nonexistent/coverbot.toml"))).unwrap();
        assert!(loaded.coverage.base_url.is_empty());
    }

    #[test]
    fn partial_file_fills_missing_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[gateway]\nurl = \"http://127.0.0.1:9000\"\ntimeout_secs = 5\nextended_timeout_secs = 20\n",
        )
        .unwrap();
        let loaded = Config::load(Some(path)).unwrap();
        assert_eq!(loaded.gateway.url, "http://127.0.0.1:9000");
        assert!(loaded.browser.headless);
    }
}
