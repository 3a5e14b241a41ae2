use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::engine::risk::{RiskModel, DEFAULT_HIGH_RISK_DISTRICTS};
use crate::store::DEFAULT_FETCH_TIMEOUT_SECS;

pub const ENV_STORE_URL: &str = "SUPABASE_URL";
pub const ENV_SERVICE_ROLE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";
const REDACTED: &str = "***";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Rest,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub service_role_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    #[serde(default = "default_high_risk_districts")]
    pub high_risk_districts: Vec<String>,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Fixes the simulated numbers; unset means a fresh draw on every run.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_base_need")]
    pub base_need: f64,
    #[serde(default = "default_monthly_growth")]
    pub monthly_growth: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_lines_per_page")]
    pub lines_per_page: usize,
    #[serde(default = "default_organization")]
    pub organization: String,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub backend: Option<StoreBackend>,
    pub store_url: Option<String>,
    pub sqlite_path: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub top_n: Option<usize>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/csr-dashboard/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(backend) = overrides.backend {
            self.store.backend = backend;
        }
        if let Some(url) = overrides.store_url {
            self.store.url = url;
        }
        if let Some(path) = overrides.sqlite_path {
            self.store.sqlite_path = path;
        }
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(top_n) = overrides.top_n {
            self.risk.top_n = top_n;
        }
    }

    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Store credentials from the environment win over the file, like the hosted backend's `.env`.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_STORE_URL).filter(|v| !v.trim().is_empty()) {
            self.store.url = url;
        }
        if let Some(key) = lookup(ENV_SERVICE_ROLE_KEY).filter(|v| !v.trim().is_empty()) {
            self.store.service_role_key = key;
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    /// Copy safe to print: the service-role key is masked when set.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.store.service_role_key.is_empty() {
            copy.store.service_role_key = REDACTED.to_string();
        }
        copy
    }

    pub fn risk_model(&self) -> RiskModel {
        RiskModel::new(self.risk.high_risk_districts.iter().cloned())
    }

    pub fn default_template() -> String {
        let template = r#"[store]
# "rest" talks to the hosted backend, "sqlite" uses a local file
backend = "rest"
url = ""
service_role_key = ""
timeout_secs = 10
sqlite_path = "~/.local/share/csr-dashboard/records.db"

[server]
host = "127.0.0.1"
port = 3001

[risk]
high_risk_districts = ["Rural District A", "Mountain Region"]
top_n = 10

[forecast]
# seed = 42
base_need = 50000.0
monthly_growth = 2000.0

[export]
lines_per_page = 60
organization = "CSR Partner"
"#;
        template.to_string()
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn resolved_sqlite_path(&self) -> PathBuf {
        expand_tilde(&self.sqlite_path)
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: String::new(),
            service_role_key: String::new(),
            timeout_secs: default_timeout_secs(),
            sqlite_path: default_sqlite_path(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            high_risk_districts: default_high_risk_districts(),
            top_n: default_top_n(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            seed: None,
            base_need: default_base_need(),
            monthly_growth: default_monthly_growth(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            lines_per_page: default_lines_per_page(),
            organization: default_organization(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

fn default_sqlite_path() -> String {
    "~/.local/share/csr-dashboard/records.db".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_high_risk_districts() -> Vec<String> {
    DEFAULT_HIGH_RISK_DISTRICTS
        .iter()
        .map(|d| d.to_string())
        .collect()
}

fn default_top_n() -> usize {
    10
}

fn default_base_need() -> f64 {
    50_000.0
}

fn default_monthly_growth() -> f64 {
    2_000.0
}

fn default_lines_per_page() -> usize {
    60
}

fn default_organization() -> String {
    "CSR Partner".to_string()
}
