use chrono::{DateTime, Local, TimeZone};
use dwmstatus_rs_core::{Sampler, SensorError};
use std::fmt::{self, Write};

/// Date/time sampler rendering the local wall clock with a strftime pattern.
#[derive(Debug, Clone)]
pub struct ClockSampler {
    name: String,
    pattern: String,
    capacity: usize,
}

impl ClockSampler {
    /// Create a sampler for `pattern` whose output must fit a buffer of
    /// `capacity` bytes, terminator included.
    pub fn new(pattern: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: "clock".to_owned(),
            pattern: pattern.into(),
            capacity,
        }
    }

    /// Render `time` with the configured pattern.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::Config`] if the pattern contains an unknown
    /// specifier and [`SensorError::InvalidData`] if the result is empty or
    /// too long for the buffer.
    pub fn render<Tz>(&self, time: &DateTime<Tz>) -> Result<String, SensorError>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let mut text = String::new();
        write!(text, "{}", time.format(&self.pattern))
            .map_err(|_| SensorError::config_with_value("Invalid date format", self.pattern.clone()))?;

        if text.is_empty() || text.len() >= self.capacity {
            return Err(SensorError::invalid_data_with_value(
                format!("Date does not fit in {} bytes", self.capacity),
                text,
            ));
        }

        Ok(text)
    }
}

impl Sampler for ClockSampler {
    fn sample(&mut self) -> Result<String, SensorError> {
        self.render(&Local::now())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
