use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub admission: AdmissionConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub documents: DocumentsConfig,
}

/// Remote verification service endpoints and timeouts
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Base URL for step submissions, without trailing slash
    pub base_url: String,
    /// Base URL for status queries; the remote serves these from a
    /// different host than the step endpoints
    pub status_base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,
    #[serde(default = "default_locale")]
    pub locale: String,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_upload_timeout_secs() -> u64 {
    60
}

fn default_locale() -> String {
    "en-US".to_string()
}

/// Admission sizing and retune tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdmissionConfig {
    #[serde(default = "default_retune_interval_secs")]
    pub retune_interval_secs: u64,
    #[serde(default = "default_cpu_high_percent")]
    pub cpu_high_percent: f32,
    #[serde(default = "default_cpu_low_percent")]
    pub cpu_low_percent: f32,
    #[serde(default = "default_memory_high_percent")]
    pub memory_high_percent: f32,
    #[serde(default = "default_memory_low_percent")]
    pub memory_low_percent: f32,
    #[serde(default = "default_scale_down")]
    pub scale_down: f64,
    #[serde(default = "default_scale_up")]
    pub scale_up: f64,
    #[serde(default = "default_multiplier_floor")]
    pub multiplier_floor: f64,
    #[serde(default = "default_multiplier_ceil")]
    pub multiplier_ceil: f64,
    #[serde(default = "default_min_per_program")]
    pub min_per_program: u32,
    #[serde(default = "default_max_per_program")]
    pub max_per_program: u32,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            retune_interval_secs: default_retune_interval_secs(),
            cpu_high_percent: default_cpu_high_percent(),
            cpu_low_percent: default_cpu_low_percent(),
            memory_high_percent: default_memory_high_percent(),
            memory_low_percent: default_memory_low_percent(),
            scale_down: default_scale_down(),
            scale_up: default_scale_up(),
            multiplier_floor: default_multiplier_floor(),
            multiplier_ceil: default_multiplier_ceil(),
            min_per_program: default_min_per_program(),
            max_per_program: default_max_per_program(),
        }
    }
}

fn default_retune_interval_secs() -> u64 {
    60
}

fn default_cpu_high_percent() -> f32 {
    80.0
}

fn default_cpu_low_percent() -> f32 {
    40.0
}

fn default_memory_high_percent() -> f32 {
    85.0
}

fn default_memory_low_percent() -> f32 {
    60.0
}

fn default_scale_down() -> f64 {
    0.7
}

fn default_scale_up() -> f64 {
    1.2
}

fn default_multiplier_floor() -> f64 {
    0.5
}

fn default_multiplier_ceil() -> f64 {
    2.0
}

fn default_min_per_program() -> u32 {
    5
}

fn default_max_per_program() -> u32 {
    50
}

/// Result poller timing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollerConfig {
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            max_wait_secs: default_max_wait_secs(),
            interval_secs: default_interval_secs(),
        }
    }
}

fn default_max_wait_secs() -> u64 {
    20
}

fn default_interval_secs() -> u64 {
    5
}

/// Proof document template storage
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DocumentsConfig {
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            template_dir: default_template_dir(),
        }
    }
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("documents")
}
