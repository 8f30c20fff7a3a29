use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/api/upload";

/// Upload server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub allowed_extensions: Vec<String>,
    pub max_body_size: usize,
    pub log_level: String,
}

/// Client-side bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub endpoint: String,
    pub timeout: Duration,
    /// Drop submissions of the same form while one is still in flight.
    pub single_flight: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
            single_flight: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let host: IpAddr = env_or("FORMBRIDGE_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid FORMBRIDGE_HOST: {e}"))?;

        let port: u16 = env_or("FORMBRIDGE_PORT", "5000")
            .parse()
            .map_err(|e| format!("Invalid FORMBRIDGE_PORT: {e}"))?;

        let upload_dir = PathBuf::from(env_or("FORMBRIDGE_UPLOAD_DIR", "temp_uploads"));

        let allowed_extensions = parse_extensions(&env_or("FORMBRIDGE_ALLOWED_EXTENSIONS", "csv,xls,xlsx"));
        if allowed_extensions.is_empty() {
            return Err("FORMBRIDGE_ALLOWED_EXTENSIONS must name at least one extension".to_string());
        }

        let max_body_size: usize = env_or("FORMBRIDGE_MAX_BODY_SIZE", "10485760")
            .parse()
            .map_err(|e| format!("Invalid FORMBRIDGE_MAX_BODY_SIZE: {e}"))?;

        let log_level = env_or("FORMBRIDGE_LOG_LEVEL", "info");

        Ok(Config {
            host,
            port,
            upload_dir,
            allowed_extensions,
            max_body_size,
            log_level,
        })
    }
}

impl BridgeConfig {
    pub fn from_env() -> Result<Self, String> {
        let endpoint = env_or("FORMBRIDGE_ENDPOINT", DEFAULT_ENDPOINT);

        let timeout_secs: u64 = env_or("FORMBRIDGE_TIMEOUT_SECS", "30")
            .parse()
            .map_err(|e| format!("Invalid FORMBRIDGE_TIMEOUT_SECS: {e}"))?;

        let single_flight = match env_or("FORMBRIDGE_SINGLE_FLIGHT", "false").as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            other => return Err(format!("Invalid FORMBRIDGE_SINGLE_FLIGHT: {other}")),
        };

        Ok(BridgeConfig {
            endpoint,
            timeout: Duration::from_secs(timeout_secs),
            single_flight,
        })
    }
}

/// Split a comma separated extension list, lowercased, without leading dots.
pub fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
