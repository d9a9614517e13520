use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub jobs: JobsConfig,

    #[serde(default)]
    pub converters: ConvertersConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound for uploaded request bodies, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    20926
}
fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobsConfig {
    /// Number of concurrent conversion workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Queue capacity; submissions beyond it are rejected.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Maximum live job records before submissions are rejected.
    #[serde(default = "default_max_jobs")]
    pub max_jobs: usize,

    /// Root directory for uploaded sources and produced artifacts.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Age after which a `processing` job counts as stale for re-queue.
    #[serde(default = "default_stale_after")]
    pub stale_after_secs: u64,
}

fn default_workers() -> usize {
    4
}
fn default_queue_capacity() -> usize {
    256
}
fn default_max_jobs() -> usize {
    10_000
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_stale_after() -> u64 {
    600
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            max_jobs: default_max_jobs(),
            data_dir: default_data_dir(),
            stale_after_secs: default_stale_after(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConvertersConfig {
    #[serde(default)]
    pub advanced: AdvancedConfig,

    #[serde(default)]
    pub cloud: CloudConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdvancedConfig {
    /// External parsing command; reads a document path, writes Markdown
    /// to stdout. Set to "" to disable the advanced mode entirely.
    #[serde(default = "default_advanced_command")]
    pub command: String,

    /// Extra arguments placed before the input path.
    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default = "default_advanced_timeout")]
    pub timeout_secs: u64,
}

fn default_advanced_command() -> String {
    "mineru".to_string()
}
fn default_advanced_timeout() -> u64 {
    300
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            command: default_advanced_command(),
            args: Vec::new(),
            timeout_secs: default_advanced_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CloudConfig {
    /// Remote parsing endpoint; cloud mode is unavailable when unset.
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_cloud_timeout")]
    pub timeout_secs: u64,
}

fn default_cloud_timeout() -> u64 {
    120
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_secs: default_cloud_timeout(),
        }
    }
}
