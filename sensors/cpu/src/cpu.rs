//! CPU utilization sampler for dwmstatus-rs.
//!
//! This module reads the aggregate and per-core lines of `/proc/stat` and
//! renders the busy fraction of each core since the previous reading as a
//! single digit.

use dwmstatus_rs_core::{format, Sampler, SensorError};
use std::fs;
use std::path::{Path, PathBuf};

/// CPU statistics from one `cpu` line of `/proc/stat`.
///
/// All values are in "jiffies" (clock ticks) since boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuStats {
    /// Time spent in user mode (normal processes)
    pub user: u64,
    /// Time spent in user mode with low priority (nice)
    pub nice: u64,
    /// Time spent in system mode (kernel)
    pub system: u64,
    /// Time spent idle
    pub idle: u64,
    /// Time waiting for I/O to complete
    pub iowait: u64,
    /// Time servicing hardware interrupts
    pub irq: u64,
    /// Time servicing software interrupts
    pub softirq: u64,
    /// Time stolen by virtualization
    pub steal: u64,
}

impl CpuStats {
    /// Ticks counted as busy: user, nice and system time.
    #[must_use]
    pub const fn busy(&self) -> u64 {
        self.user + self.nice + self.system
    }

    /// Parse CPU statistics from a `/proc/stat` line.
    ///
    /// # Errors
    ///
    /// Returns a [`SensorError::Parse`] if the line does not start with `cpu`
    /// or does not carry at least four numeric fields.
    pub fn parse_from_proc_stat_line(line: &str) -> Result<Self, SensorError> {
        if !line.starts_with("cpu") {
            return Err(SensorError::parse("Line does not start with 'cpu'"));
        }

        let values: Result<Vec<u64>, _> = line
            .split_whitespace()
            .skip(1) // Skip "cpu" or "cpuN"
            .take(8)
            .map(str::parse)
            .collect();

        let values = values
            .map_err(|e| SensorError::parse_with_source("Failed to parse CPU statistics", e))?;

        if values.len() < 4 {
            return Err(SensorError::parse(format!(
                "Insufficient CPU statistics: expected at least 4, got {}",
                values.len()
            )));
        }

        Ok(Self {
            user: values[0],
            nice: values[1],
            system: values[2],
            idle: values[3],
            iowait: values.get(4).copied().unwrap_or(0),
            irq: values.get(5).copied().unwrap_or(0),
            softirq: values.get(6).copied().unwrap_or(0),
            steal: values.get(7).copied().unwrap_or(0),
        })
    }
}

/// Busy and idle tick counters of a single core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoreTicks {
    /// Cumulative user + nice + system ticks
    pub busy: u64,
    /// Cumulative idle ticks
    pub idle: u64,
}

impl From<&CpuStats> for CoreTicks {
    fn from(stats: &CpuStats) -> Self {
        Self {
            busy: stats.busy(),
            idle: stats.idle,
        }
    }
}

impl CoreTicks {
    /// Utilization digit for the interval between `prev` and `self`.
    ///
    /// Counters that went backwards count as no progress. An interval with no
    /// ticks at all renders as `0`.
    #[must_use]
    pub fn utilization_digit(&self, prev: &CoreTicks) -> char {
        let busy = self.busy.saturating_sub(prev.busy);
        let idle = self.idle.saturating_sub(prev.idle);
        let total = busy + idle;

        if total == 0 {
            '0'
        } else {
            format::digit(busy as f64 / total as f64)
        }
    }
}

/// One pass over `/proc/stat`: the aggregate line and every core line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuSnapshot {
    /// The aggregate `cpu` line
    pub total: CpuStats,
    /// One entry per `cpuN` line, in file order
    pub cores: Vec<CoreTicks>,
}

impl CpuSnapshot {
    /// Parse a snapshot from `/proc/stat` content, reading at most `max_cpus`
    /// core lines.
    ///
    /// Scanning stops at the first line that is not a well-formed `cpu` line.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::InvalidData`] if the aggregate line is missing or
    /// malformed, or if no terminating line shows up within `max_cpus` lines.
    pub fn parse(content: &str, max_cpus: usize) -> Result<Self, SensorError> {
        let mut lines = content.lines();

        let total = lines
            .next()
            .and_then(|line| CpuStats::parse_from_proc_stat_line(line).ok())
            .ok_or_else(|| SensorError::invalid_data("Could not parse '/proc/stat'"))?;

        let mut cores = Vec::new();
        for _ in 0..max_cpus {
            let Some(line) = lines.next() else {
                return Err(Self::too_many_cores(max_cpus));
            };
            match CpuStats::parse_from_proc_stat_line(line) {
                Ok(stats) => cores.push(CoreTicks::from(&stats)),
                Err(_) => return Ok(Self { total, cores }),
            }
        }

        Err(Self::too_many_cores(max_cpus))
    }

    fn too_many_cores(max_cpus: usize) -> SensorError {
        SensorError::invalid_data(format!(
            "Could not find all {} cpu cores in '/proc/stat'",
            max_cpus
        ))
    }

    /// Render one digit per core, comparing against `prev` when there is one.
    ///
    /// Without a previous snapshot, and for cores the previous snapshot did not
    /// have, the digit is `0`.
    #[must_use]
    pub fn utilization_digits(&self, prev: Option<&CpuSnapshot>) -> String {
        self.cores
            .iter()
            .enumerate()
            .map(|(index, core)| {
                prev.and_then(|prev| prev.cores.get(index))
                    .map_or('0', |prev_core| core.utilization_digit(prev_core))
            })
            .collect()
    }
}

/// CPU utilization sampler.
///
/// Owns the previous snapshot, so each call reports utilization since the
/// call before it.
#[derive(Debug)]
pub struct CpuSampler {
    name: String,
    path: PathBuf,
    max_cpus: usize,
    previous: Option<CpuSnapshot>,
}

impl CpuSampler {
    /// Path to the proc stat file.
    const PROC_STAT_PATH: &'static str = "/proc/stat";

    /// Create a sampler reading `/proc/stat` for up to `max_cpus` cores.
    #[must_use]
    pub fn new(max_cpus: usize) -> Self {
        Self::from_path(Self::PROC_STAT_PATH, max_cpus)
    }

    /// Create a sampler reading a different stat file (useful for testing).
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>, max_cpus: usize) -> Self {
        Self {
            name: "cpu".to_owned(),
            path: path.into(),
            max_cpus,
            previous: None,
        }
    }

    /// The snapshot the next call will compare against.
    #[must_use]
    pub fn previous(&self) -> Option<&CpuSnapshot> {
        self.previous.as_ref()
    }

    fn read_snapshot(&self) -> Result<CpuSnapshot, SensorError> {
        let content = read_file(&self.path)?;
        CpuSnapshot::parse(&content, self.max_cpus)
    }
}

fn read_file(path: &Path) -> Result<String, SensorError> {
    fs::read_to_string(path).map_err(|e| SensorError::read(path, e))
}

impl Sampler for CpuSampler {
    fn sample(&mut self) -> Result<String, SensorError> {
        let snapshot = self.read_snapshot()?;
        let digits = snapshot.utilization_digits(self.previous.as_ref());

        if self.previous.is_none() {
            log::debug!("cpu: seeded with {} cores", snapshot.cores.len());
        }
        self.previous = Some(snapshot);

        Ok(digits)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
