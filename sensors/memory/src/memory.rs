//! Memory and swap usage sampler for dwmstatus-rs.
//!
//! This module reads `/proc/meminfo` and renders the fraction of memory and
//! swap in use as one digit each.

use dwmstatus_rs_core::{format, Sampler, SensorError};
use std::fs;
use std::path::{Path, PathBuf};

/// Memory statistics from `/proc/meminfo`.
///
/// Values are kept in kB as the kernel reports them; only their ratios are used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryInfo {
    /// Total physical memory
    pub mem_total: u64,
    /// Free physical memory
    pub mem_free: u64,
    /// Memory used for buffers
    pub mem_buffers: u64,
    /// Memory used for page cache
    pub mem_cached: u64,
    /// Total swap space
    pub swap_total: u64,
    /// Free swap space
    pub swap_free: u64,
}

impl MemoryInfo {
    /// Fraction of physical memory in use, counting buffers and cache as free.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::InvalidData`] if `MemTotal` is zero.
    pub fn mem_usage(&self) -> Result<f64, SensorError> {
        if self.mem_total == 0 {
            return Err(SensorError::invalid_data("MemTotal is zero in '/proc/meminfo'"));
        }
        let reclaimable = self.mem_free + self.mem_buffers + self.mem_cached;
        Ok(1.0 - reclaimable as f64 / self.mem_total as f64)
    }

    /// Fraction of swap in use. A machine without swap reports zero.
    #[must_use]
    pub fn swap_usage(&self) -> f64 {
        if self.swap_total == 0 {
            0.0
        } else {
            1.0 - self.swap_free as f64 / self.swap_total as f64
        }
    }

    /// Render memory and swap usage as two digits, memory first.
    pub fn usage_digits(&self) -> Result<String, SensorError> {
        let mem = format::digit(self.mem_usage()?);
        let swap = format::digit(self.swap_usage());
        Ok([mem, swap].iter().collect())
    }

    /// Parse memory information from a meminfo file path.
    pub fn from_proc_meminfo_path(path: &Path) -> Result<Self, SensorError> {
        let content = fs::read_to_string(path).map_err(|e| SensorError::read(path, e))?;
        Self::parse_meminfo_content(&content)
    }

    /// Parse memory information from meminfo content.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::InvalidData`] naming the first of the six
    /// required keys that is missing, or [`SensorError::Parse`] if one of
    /// their values is not a number.
    pub fn parse_meminfo_content(content: &str) -> Result<Self, SensorError> {
        let mut mem_total = None;
        let mut mem_free = None;
        let mut mem_buffers = None;
        let mut mem_cached = None;
        let mut swap_total = None;
        let mut swap_free = None;

        for line in content.lines() {
            let mut parts = line.split_whitespace();
            let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
                continue;
            };

            let slot = match key.trim_end_matches(':') {
                "MemTotal" => &mut mem_total,
                "MemFree" => &mut mem_free,
                "Buffers" => &mut mem_buffers,
                "Cached" => &mut mem_cached,
                "SwapTotal" => &mut swap_total,
                "SwapFree" => &mut swap_free,
                _ => continue,
            };

            let value = value.parse::<u64>().map_err(|e| {
                SensorError::parse_with_source(format!("Failed to parse {} value", key), e)
            })?;
            *slot = Some(value);
        }

        let require = |value: Option<u64>, key: &str| {
            value.ok_or_else(|| {
                SensorError::invalid_data(format!("Could not find '{}' in '/proc/meminfo'", key))
            })
        };

        Ok(Self {
            mem_total: require(mem_total, "MemTotal")?,
            mem_free: require(mem_free, "MemFree")?,
            mem_buffers: require(mem_buffers, "Buffers")?,
            mem_cached: require(mem_cached, "Cached")?,
            swap_total: require(swap_total, "SwapTotal")?,
            swap_free: require(swap_free, "SwapFree")?,
        })
    }
}

/// Memory and swap usage sampler.
#[derive(Debug)]
pub struct MemorySampler {
    name: String,
    path: PathBuf,
}

impl MemorySampler {
    /// Path to the proc meminfo file.
    const PROC_MEMINFO_PATH: &'static str = "/proc/meminfo";

    /// Create a sampler reading `/proc/meminfo`.
    #[must_use]
    pub fn new() -> Self {
        Self::from_path(Self::PROC_MEMINFO_PATH)
    }

    /// Create a sampler reading a different meminfo file (useful for testing).
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            name: "memory".to_owned(),
            path: path.into(),
        }
    }
}

impl Default for MemorySampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for MemorySampler {
    fn sample(&mut self) -> Result<String, SensorError> {
        MemoryInfo::from_proc_meminfo_path(&self.path)?.usage_digits()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
