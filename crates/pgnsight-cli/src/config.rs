use std::path::Path;
use std::time::Duration;

use pgnsight_stockfish::AnalysisSettings;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_stockfish_path")]
    pub binary_path: String,

    #[serde(default = "default_hash_mb")]
    pub hash_mb: u32,

    #[serde(default = "default_threads")]
    pub threads: u32,

    #[serde(default = "default_multipv")]
    pub multipv: u8,

    #[serde(default = "default_ready_timeout")]
    pub ready_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_analysis_depth")]
    pub analysis_depth: u32,

    #[serde(default = "default_display_min_depth")]
    pub display_min_depth: u32,

    #[serde(default = "default_quick_eval_depth")]
    pub quick_eval_depth: u32,

    #[serde(default = "default_quick_eval_timeout")]
    pub quick_eval_timeout_ms: u64,
}

fn default_stockfish_path() -> String {
    std::env::var("STOCKFISH_PATH").unwrap_or_else(|_| "stockfish".to_string())
}

fn default_hash_mb() -> u32 {
    256
}

fn default_threads() -> u32 {
    2
}

fn default_multipv() -> u8 {
    8
}

fn default_ready_timeout() -> u64 {
    10_000
}

fn default_analysis_depth() -> u32 {
    20
}

fn default_display_min_depth() -> u32 {
    10
}

fn default_quick_eval_depth() -> u32 {
    12
}

fn default_quick_eval_timeout() -> u64 {
    3000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary_path: default_stockfish_path(),
            hash_mb: default_hash_mb(),
            threads: default_threads(),
            multipv: default_multipv(),
            ready_timeout_ms: default_ready_timeout(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            analysis_depth: default_analysis_depth(),
            display_min_depth: default_display_min_depth(),
            quick_eval_depth: default_quick_eval_depth(),
            quick_eval_timeout_ms: default_quick_eval_timeout(),
        }
    }
}

impl Config {
    /// Reads `$PGNSIGHT_CONFIG`, or `config/default.toml`, or falls back to
    /// built-in defaults when neither exists.
    pub fn load() -> anyhow::Result<Self> {
        let config_path =
            std::env::var("PGNSIGHT_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
        Self::load_from(&config_path)
    }

    pub fn load_from(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(Self::parse(&content)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn analysis_settings(&self) -> AnalysisSettings {
        AnalysisSettings::default()
            .with_hash(self.engine.hash_mb)
            .with_threads(self.engine.threads)
            .with_multipv(self.engine.multipv)
            .with_analysis_depth(self.analysis.analysis_depth)
            .with_display_min_depth(self.analysis.display_min_depth)
            .with_quick_eval_depth(self.analysis.quick_eval_depth)
            .with_quick_eval_timeout(Duration::from_millis(self.analysis.quick_eval_timeout_ms))
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.engine.ready_timeout_ms)
    }
}
