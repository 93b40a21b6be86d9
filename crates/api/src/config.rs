use std::path::PathBuf;
use std::time::Duration;

use mvforge_comfy::PollConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `900`). Generation
    /// requests block for the full polling wait, so this must exceed
    /// the poll timeout.
    pub request_timeout_secs: u64,
    /// Base URL of the queue server (default: `http://127.0.0.1:8188`).
    pub comfy_url: String,
    /// Public URL prefix under which this service is reachable; used to
    /// build output file URLs (default: `http://localhost:8000`).
    pub public_base_url: String,
    /// Output directory shared with the queue server, served at `/images`.
    pub output_dir: PathBuf,
    /// Directory where uploaded view images are staged.
    pub upload_dir: PathBuf,
    /// Directory holding workflow template files.
    pub template_dir: PathBuf,
    /// Seconds between history polls (default: `3`).
    pub poll_interval_secs: u64,
    /// Total seconds to wait for a job result (default: `600`).
    pub poll_timeout_secs: u64,
    /// Consecutive hard poll failures tolerated (default: `5`).
    pub poll_max_failures: u32,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `8000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `900`                      |
    /// | `COMFY_URL`            | `http://127.0.0.1:8188`    |
    /// | `PUBLIC_BASE_URL`      | `http://localhost:8000`    |
    /// | `OUTPUT_DIR`           | `output`                   |
    /// | `UPLOAD_DIR`           | `tmp`                      |
    /// | `TEMPLATE_DIR`         | `templates`                |
    /// | `POLL_INTERVAL_SECS`   | `3`                        |
    /// | `POLL_TIMEOUT_SECS`    | `600`                      |
    /// | `POLL_MAX_FAILURES`    | `5`                        |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "900".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let comfy_url =
            std::env::var("COMFY_URL").unwrap_or_else(|_| "http://127.0.0.1:8188".into());

        let public_base_url =
            std::env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| "http://localhost:8000".into());
        let public_base_url = public_base_url.trim_end_matches('/').to_string();

        let output_dir = PathBuf::from(std::env::var("OUTPUT_DIR").unwrap_or_else(|_| "output".into()));
        let upload_dir = PathBuf::from(std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "tmp".into()));
        let template_dir =
            PathBuf::from(std::env::var("TEMPLATE_DIR").unwrap_or_else(|_| "templates".into()));

        let poll_interval_secs: u64 = std::env::var("POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "3".into())
            .parse()
            .expect("POLL_INTERVAL_SECS must be a valid u64");

        let poll_timeout_secs: u64 = std::env::var("POLL_TIMEOUT_SECS")
            .unwrap_or_else(|_| "600".into())
            .parse()
            .expect("POLL_TIMEOUT_SECS must be a valid u64");

        let poll_max_failures: u32 = std::env::var("POLL_MAX_FAILURES")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("POLL_MAX_FAILURES must be a valid u32");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            comfy_url,
            public_base_url,
            output_dir,
            upload_dir,
            template_dir,
            poll_interval_secs,
            poll_timeout_secs,
            poll_max_failures,
        }
    }

    /// Polling parameters derived from the configured values.
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_secs(self.poll_interval_secs),
            timeout: Some(Duration::from_secs(self.poll_timeout_secs)),
            max_consecutive_failures: self.poll_max_failures,
        }
    }

    /// Directory where generated meshes land, served at `/files`.
    pub fn model_dir(&self) -> PathBuf {
        self.output_dir.join("3D")
    }
}
