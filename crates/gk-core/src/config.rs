//! Configuration system for the oxidized-gekko interpreter

use crate::error::{EmulatorError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub cpu: CpuConfig,
    pub memory: MemoryConfig,
    pub debug: DebugConfig,
}

/// CPU emulation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CpuConfig {
    /// Address seeded into LR by `run_function`; execution stops when PC reaches it
    pub return_sentinel: u32,
    /// Log every executed instruction at trace level
    pub trace_instructions: bool,
}

/// Memory map settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MemoryConfig {
    pub sections: Vec<SectionConfig>,
}

/// One mapped section, visible through a cached and an uncached alias
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SectionConfig {
    pub cached_base: u32,
    pub uncached_base: u32,
    pub size: u32,
}

/// Debug settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DebugConfig {
    pub log_level: LogLevel,
    /// Directory that memory dumps are written to
    pub dump_dir: PathBuf,
}

/// Logging level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`
    pub fn as_filter(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            return_sentinel: 0xDEAD_BEE0,
            trace_instructions: false,
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        // GameCube main RAM: 24 MiB, cached at 0x80000000, uncached at 0xC0000000
        Self {
            sections: vec![SectionConfig {
                cached_base: 0x8000_0000,
                uncached_base: 0xC000_0000,
                size: 0x0180_0000,
            }],
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            dump_dir: PathBuf::from("dumps"),
        }
    }
}

impl Config {
    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path();

        if path.exists() {
            Self::load_from(&path)
        } else {
            let config = Self::default();
            config.save()?;
            tracing::info!("Wrote default configuration to {}", path.display());
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("writing config {}", path.display()))?;
        Ok(())
    }

    /// Check settings that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.cpu.return_sentinel % 4 != 0 {
            return Err(EmulatorError::Config(format!(
                "return_sentinel 0x{:08x} is not word aligned",
                self.cpu.return_sentinel
            )));
        }
        if self.memory.sections.is_empty() {
            return Err(EmulatorError::Config("no memory sections configured".into()));
        }
        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("oxidized-gekko")
            .join("config.toml")
    }
}
