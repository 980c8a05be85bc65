use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub options: DownloadOptions,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub sampler: SamplerConfig,
}

/// Required measurement parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadOptions {
    /// Logical domain whose CDN routing is being measured. Used for the DNS
    /// lookup and as the request host on direct-to-IP downloads.
    pub download_domain: String,
    /// Absolute HTTP path of the test object on the CDN.
    pub download_path: String,
    /// Byte count requested per download (Range: bytes=0-<size>).
    pub download_size: u64,
    /// Relative-time expression for SQLite DATETIME('now', ...), e.g. "-30 days".
    pub delete_period: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "data/cdnwatch.db".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Directory the CSV snapshots are written to (created if missing).
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Hosts-alias file scanned for the currently configured operational IP.
    #[serde(default = "default_hosts_file")]
    pub hosts_file: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            hosts_file: default_hosts_file(),
        }
    }
}

fn default_output_dir() -> String {
    "www/data".into()
}

fn default_hosts_file() -> String {
    "/etc/hosts".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SamplerConfig {
    /// Per-download timeout (connect + transfer).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// DNS lookup timeout.
    #[serde(default = "default_dns_timeout_secs")]
    pub dns_timeout_secs: u64,
    /// Pause between downloads, to avoid bursting a target CDN.
    #[serde(default = "default_pause_secs")]
    pub pause_secs: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            dns_timeout_secs: default_dns_timeout_secs(),
            pause_secs: default_pause_secs(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_dns_timeout_secs() -> u64 {
    5
}

fn default_pause_secs() -> u64 {
    5
}

impl SamplerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn dns_timeout(&self) -> Duration {
        Duration::from_secs(self.dns_timeout_secs)
    }

    pub fn pause(&self) -> Duration {
        Duration::from_secs(self.pause_secs)
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("read config {}: {}", path.display(), e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.options.download_domain.is_empty(),
            "options.download_domain must be non-empty"
        );
        anyhow::ensure!(
            self.options.download_path.starts_with('/'),
            "options.download_path must be an absolute path, got {:?}",
            self.options.download_path
        );
        anyhow::ensure!(
            self.options.download_size > 0,
            "options.download_size must be > 0, got {}",
            self.options.download_size
        );
        anyhow::ensure!(
            self.options.delete_period.starts_with('-'),
            "options.delete_period must be a negative relative-time expression like \"-30 days\", got {:?}",
            self.options.delete_period
        );
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            !self.report.output_dir.is_empty(),
            "report.output_dir must be non-empty"
        );
        anyhow::ensure!(
            self.sampler.request_timeout_secs > 0,
            "sampler.request_timeout_secs must be > 0, got {}",
            self.sampler.request_timeout_secs
        );
        anyhow::ensure!(
            self.sampler.dns_timeout_secs > 0,
            "sampler.dns_timeout_secs must be > 0, got {}",
            self.sampler.dns_timeout_secs
        );
        Ok(())
    }
}
