use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    /// In-memory store behaviour
    #[serde(default)]
    pub store: StoreConfig,
    /// Load generator used by the binary
    #[serde(default)]
    pub workload: WorkloadConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "./logs".to_string(),
            log_file: "point_ledger.log".to_string(),
            use_json: false,
            rotation: "never".to_string(),
            store: StoreConfig::default(),
            workload: WorkloadConfig::default(),
        }
    }
}

/// Simulated latency for one store primitive, sampled uniformly from
/// `[min_ms, max_ms]` on every call.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatencyConfig {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl LatencyConfig {
    pub const ZERO: LatencyConfig = LatencyConfig {
        min_ms: 0,
        max_ms: 0,
    };

    /// Fixed latency (min == max)
    pub const fn fixed(ms: u64) -> Self {
        Self {
            min_ms: ms,
            max_ms: ms,
        }
    }

    pub const fn is_zero(&self) -> bool {
        self.max_ms == 0
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default)]
pub struct StoreConfig {
    /// Applied to balance reads and history reads
    #[serde(default)]
    pub read_latency_ms: LatencyConfig,
    /// Applied to balance writes and history appends
    #[serde(default)]
    pub write_latency_ms: LatencyConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WorkloadConfig {
    /// Distinct user ids, numbered from 1
    pub users: u64,
    /// Operations issued per user
    pub ops_per_user: u64,
    /// Amount of every charge
    pub charge_amount: i64,
    /// Every Nth operation is a use of `charge_amount / 2` instead of a charge (0 = never)
    #[serde(default)]
    pub use_every: u64,
    /// Sample every Nth call for latency percentiles
    pub sample_rate: usize,
    /// Worker threads sharing the operations (fixed pool)
    #[serde(default = "default_threads")]
    pub threads: usize,
}

fn default_threads() -> usize {
    100
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            users: 5,
            ops_per_user: 100,
            charge_amount: 1_000,
            use_every: 0,
            sample_rate: 1,
            threads: default_threads(),
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> anyhow::Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse {}", config_path))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: AppConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        for (name, latency) in [
            ("store.read_latency_ms", self.store.read_latency_ms),
            ("store.write_latency_ms", self.store.write_latency_ms),
        ] {
            anyhow::ensure!(
                latency.min_ms <= latency.max_ms,
                "{}: min_ms ({}) > max_ms ({})",
                name,
                latency.min_ms,
                latency.max_ms
            );
        }
        anyhow::ensure!(self.workload.sample_rate > 0, "workload.sample_rate must be > 0");
        anyhow::ensure!(self.workload.threads > 0, "workload.threads must be > 0");
        Ok(())
    }
}
