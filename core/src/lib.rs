//! # dwmstatus-rs-core
//!
//! Core library for the dwmstatus-rs suite providing the pieces shared by every
//! metric sampler and by the status daemon.
//!
//! ## Features
//!
//! - **Common sampler trait** - Standardized interface for fatal samplers
//! - **Command capability** - Subprocess output capture that tests can replace
//! - **Configuration** - Compiled-in defaults with an optional RON override file
//! - **Utilization digits** - The shared `0`..`9` percentage rendering
//! - **Error handling** - Error types separating unavailable resources from bad data
//!
//! ## Quick Start
//!
//! ```rust
//! use dwmstatus_rs_core::{Sampler, SensorError};
//!
//! struct Constant;
//!
//! impl Sampler for Constant {
//!     fn sample(&mut self) -> Result<String, SensorError> {
//!         Ok("42".to_owned())
//!     }
//!
//!     fn name(&self) -> &str {
//!         "constant"
//!     }
//! }
//!
//! let mut sampler = Constant;
//! assert_eq!(sampler.sample().unwrap(), "42");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A command line for one of the external tools the samplers read from.
///
/// Stored as a program plus its arguments so that it can be spawned without a
/// shell.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CommandSpec {
    /// Program name, looked up in `PATH`
    pub program: String,
    /// Arguments passed verbatim
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Create a command from a program name and its arguments.
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|arg| (*arg).to_owned()).collect(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Status daemon configuration loaded from ~/.config/dwmstatus-rs/config.ron
///
/// Every field falls back to its compiled-in default, so an empty file (or no
/// file at all) reproduces the stock status line.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Pacing sleep between publishing and the I/O sample, in milliseconds
    pub interval_ms: u64,
    /// Refresh the date every this many loop iterations
    pub date_every: u32,
    /// Refresh the mail flag every this many loop iterations
    pub mail_every: u32,
    /// Refresh the garbage-collection field every this many loop iterations
    pub gc_every: u32,
    /// Whether the garbage-collection sampler runs at all
    pub gc_enabled: bool,
    /// Whether the date is appended to the published status line
    pub show_date: bool,
    /// Upper bound on per-core lines read from `/proc/stat`
    pub max_cpus: usize,
    /// Capacity of the status buffer, terminator included
    pub status_max_length: usize,
    /// Capacity of the date field, terminator included
    pub date_capacity: usize,
    /// Characters of `jvm-stats` output kept before truncating with `+`
    pub gc_capacity: usize,
    /// strftime-style pattern for the date field
    pub date_format: String,
    /// Label of the `sensors` line holding the temperature
    pub temperature_label: String,
    /// Sensor-reporting tool
    pub sensors_command: CommandSpec,
    /// Mail-index count tool
    pub mail_command: CommandSpec,
    /// Device I/O statistics tool, expected to print two tables one second apart
    pub iostat_command: CommandSpec,
    /// JVM statistics tool
    pub gc_command: CommandSpec,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            date_every: 10,
            mail_every: 10,
            gc_every: 5,
            gc_enabled: false,
            show_date: false,
            max_cpus: 128,
            status_max_length: 512,
            date_capacity: 32,
            gc_capacity: 127,
            date_format: "%a %d %b %H:%M".to_owned(),
            temperature_label: "temp1".to_owned(),
            sensors_command: CommandSpec::new("sensors", &[]),
            mail_command: CommandSpec::new("notmuch", &["count", "tag:inbox"]),
            iostat_command: CommandSpec::new("iostat", &["-x", "1", "2"]),
            gc_command: CommandSpec::new("jvm-stats", &["-c1"]),
        }
    }
}

impl StatusConfig {
    /// Minimum allowed pacing interval in milliseconds.
    pub const MIN_INTERVAL_MS: u64 = 100;

    /// Load configuration from the standard config file location.
    ///
    /// Searches for config in:
    /// 1. ~/.config/dwmstatus-rs/config.ron
    /// 2. ~/.dwmstatus-rs/config.ron (fallback)
    ///
    /// Returns default config if no file is found.
    pub fn load() -> Result<Self, SensorError> {
        if let Some(config_path) = Self::find_config_file() {
            Self::load_from_file(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Self, SensorError> {
        let content = std::fs::read_to_string(path).map_err(|e| SensorError::read(path, e))?;

        let config: StatusConfig = ron::from_str(&content).map_err(|e| SensorError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
            value: None,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Find the config file in standard locations.
    pub fn find_config_file() -> Option<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_path = config_dir.join("dwmstatus-rs").join("config.ron");
            if xdg_path.exists() {
                return Some(xdg_path);
            }
        }

        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".dwmstatus-rs").join("config.ron");
            if home_path.exists() {
                return Some(home_path);
            }
        }

        None
    }

    /// Reject values the refresh loop cannot work with.
    pub fn validate(&self) -> Result<(), SensorError> {
        if self.interval_ms < Self::MIN_INTERVAL_MS {
            return Err(SensorError::config_with_value(
                format!("Interval must be at least {}ms", Self::MIN_INTERVAL_MS),
                self.interval_ms.to_string(),
            ));
        }

        for (name, every) in [
            ("date_every", self.date_every),
            ("mail_every", self.mail_every),
            ("gc_every", self.gc_every),
        ] {
            if every == 0 {
                return Err(SensorError::config(format!("{} must be at least 1", name)));
            }
        }

        if self.max_cpus == 0 {
            return Err(SensorError::config("max_cpus must be at least 1"));
        }
        if self.status_max_length < 2 || self.date_capacity < 2 {
            return Err(SensorError::config(
                "status_max_length and date_capacity must leave room for text",
            ));
        }

        Ok(())
    }

    /// Pacing interval as a [`std::time::Duration`].
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.interval_ms)
    }
}

/// Core trait for the samplers whose failures are fatal to the daemon.
///
/// A sampler produces one short token per call. Implementations that need
/// state between calls (the CPU sampler) keep it in `self`.
pub trait Sampler {
    /// Take a fresh sample and render it as the token shown in the status line.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::Read`] or [`SensorError::Launch`] when the data
    /// source is unavailable and [`SensorError::Parse`] or
    /// [`SensorError::InvalidData`] when it yields unusable data.
    fn sample(&mut self) -> Result<String, SensorError>;

    /// Short identifier used in log messages.
    fn name(&self) -> &str;
}

/// Formatting helpers shared by the samplers and the status line.
pub mod format {
    /// Map a fraction to a single utilization digit.
    ///
    /// The fraction is multiplied by ten, truncated and clamped to `0..=9`, so
    /// anything at or above 0.9 renders as `9`. NaN renders as `0`.
    ///
    /// ```rust
    /// use dwmstatus_rs_core::format::digit;
    ///
    /// assert_eq!(digit(0.594), '5');
    /// assert_eq!(digit(1.0), '9');
    /// assert_eq!(digit(-0.3), '0');
    /// ```
    #[must_use]
    pub fn digit(fraction: f64) -> char {
        let tenths = (fraction * 10.0).trunc() as i64;
        char::from(b'0' + tenths.clamp(0, 9) as u8)
    }

    /// Truncate `text` to at most `max_bytes` bytes without splitting a character.
    pub fn truncate_bytes(text: &mut String, max_bytes: usize) {
        if text.len() <= max_bytes {
            return;
        }
        let mut end = max_bytes;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
}

/// Running external tools and capturing their line-oriented output.
pub mod command {
    use super::{CommandSpec, SensorError};
    use std::process::{Command, Stdio};

    /// Capability to run a command and capture its standard output.
    ///
    /// Samplers take a runner instead of spawning processes themselves so that
    /// their parsing can be exercised against canned output.
    pub trait CommandRunner {
        /// Run `spec` to completion and return its standard output split into lines.
        ///
        /// The exit status is not inspected; a tool that prints nothing simply
        /// yields no lines.
        ///
        /// # Errors
        ///
        /// Returns [`SensorError::Launch`] if the process cannot be started.
        fn run(&self, spec: &CommandSpec) -> Result<Vec<String>, SensorError>;
    }

    impl<R: CommandRunner + ?Sized> CommandRunner for &R {
        fn run(&self, spec: &CommandSpec) -> Result<Vec<String>, SensorError> {
            (**self).run(spec)
        }
    }

    /// Runs commands as real subprocesses.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct SystemCommand;

    impl CommandRunner for SystemCommand {
        fn run(&self, spec: &CommandSpec) -> Result<Vec<String>, SensorError> {
            let output = Command::new(&spec.program)
                .args(&spec.args)
                .stdin(Stdio::null())
                .stderr(Stdio::null())
                .output()
                .map_err(|e| SensorError::launch(spec.to_string(), e))?;

            if !output.status.success() {
                log::debug!("`{}` exited with {}", spec, output.status);
            }

            Ok(String::from_utf8_lossy(&output.stdout)
                .lines()
                .map(str::to_owned)
                .collect())
        }
    }

    /// Replays fixed output regardless of the command asked for.
    ///
    /// Used as a stand-in for the external tools in tests.
    #[derive(Debug, Clone, Default)]
    pub struct CannedOutput {
        output: Option<String>,
    }

    impl CannedOutput {
        /// Answer every command with `text` as its standard output.
        pub fn new(text: impl Into<String>) -> Self {
            Self {
                output: Some(text.into()),
            }
        }

        /// Behave as if the program could not be found.
        pub fn missing() -> Self {
            Self { output: None }
        }
    }

    impl CommandRunner for CannedOutput {
        fn run(&self, spec: &CommandSpec) -> Result<Vec<String>, SensorError> {
            match &self.output {
                Some(text) => Ok(text.lines().map(str::to_owned).collect()),
                None => Err(SensorError::launch(
                    spec.to_string(),
                    std::io::Error::new(std::io::ErrorKind::NotFound, "program not found"),
                )),
            }
        }
    }
}

/// Common error types for sampler operations.
///
/// The first two variants mean the data source itself could not be reached;
/// the remaining ones mean it was reached but produced unusable data.
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    /// A kernel file could not be opened or read.
    #[error("Could not open '{}'", .path.display())]
    Read {
        /// The file that failed
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An external command could not be started.
    #[error("Could not open the '{command}' command")]
    Launch {
        /// The command line that failed
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing sampler data from text format.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of what failed to parse
        message: String,
        /// Optional source error for chaining
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error (invalid settings, etc.).
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration issue
        message: String,
        /// The invalid configuration value if applicable
        value: Option<String>,
    },

    /// Expected data was absent or out of range.
    #[error("Invalid data: {message}")]
    InvalidData {
        /// Description of what makes the data invalid
        message: String,
        /// The invalid data if it can be safely displayed
        data: Option<String>,
    },
}

impl SensorError {
    /// Create a new read error for `path`.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Create a new launch error for `command`.
    pub fn launch<S: Into<String>>(command: S, source: std::io::Error) -> Self {
        Self::Launch {
            command: command.into(),
            source,
        }
    }

    /// Create a new parse error with a simple message.
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new parse error with a source error.
    pub fn parse_with_source<S: Into<String>, E>(message: S, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Parse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
            value: None,
        }
    }

    /// Create a new configuration error with the invalid value.
    pub fn config_with_value<S: Into<String>, V: Into<String>>(message: S, value: V) -> Self {
        Self::Config {
            message: message.into(),
            value: Some(value.into()),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data<S: Into<String>>(message: S) -> Self {
        Self::InvalidData {
            message: message.into(),
            data: None,
        }
    }

    /// Create a new invalid data error with the problematic data.
    pub fn invalid_data_with_value<S: Into<String>, D: Into<String>>(message: S, data: D) -> Self {
        Self::InvalidData {
            message: message.into(),
            data: Some(data.into()),
        }
    }

    /// Check if this error means the data source could not be reached at all.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Read { .. } | Self::Launch { .. })
    }
}
