use dwmstatus_rs_core::command::{CommandRunner, SystemCommand};
use dwmstatus_rs_core::{CommandSpec, Sampler, SensorError};

/// Temperature sampler backed by the `sensors` tool from lm-sensors.
///
/// Picks the first line whose label matches and shortens its reading to a
/// whole number plus unit letter, e.g. `45C`.
#[derive(Debug)]
pub struct ThermalSampler<R = SystemCommand> {
    name: String,
    label: String,
    command: CommandSpec,
    runner: R,
}

impl ThermalSampler<SystemCommand> {
    pub fn new(label: impl Into<String>, command: CommandSpec) -> Self {
        Self::with_runner(label, command, SystemCommand)
    }
}

impl<R: CommandRunner> ThermalSampler<R> {
    pub fn with_runner(label: impl Into<String>, command: CommandSpec, runner: R) -> Self {
        let label = label.into();
        Self {
            name: format!("thermal-{}", label),
            label,
            command,
            runner,
        }
    }

    /// Find the reading token on the line labelled `self.label`.
    fn find_reading<'a>(&self, lines: &'a [String]) -> Result<&'a str, SensorError> {
        for line in lines {
            let Some(rest) = line
                .strip_prefix(self.label.as_str())
                .and_then(|rest| rest.strip_prefix(':'))
            else {
                continue;
            };

            return rest.split_whitespace().next().ok_or_else(|| {
                SensorError::invalid_data_with_value(
                    format!("No reading after '{}' in sensors", self.label),
                    line.clone(),
                )
            });
        }

        Err(SensorError::invalid_data(format!(
            "Could not find '{}' in sensors",
            self.label
        )))
    }
}

/// Shorten a `sensors` reading such as `+45.0°C` to `45C`.
///
/// The `+` sign, the fractional part and the degree glyph are dropped and the
/// unit letter is kept. The result is right-aligned to at least three
/// characters, so `+5.0°C` becomes ` 5C`.
///
/// # Errors
///
/// Returns [`SensorError::Parse`] if the token is not a number followed by a
/// degree glyph and a single unit letter.
pub fn compact_reading(token: &str) -> Result<String, SensorError> {
    let malformed = || SensorError::parse(format!("Unexpected temperature reading '{}'", token));

    let (number, unit) = token.split_once('°').ok_or_else(malformed)?;

    let mut unit_chars = unit.chars();
    let unit = match (unit_chars.next(), unit_chars.next()) {
        (Some(letter), None) if letter.is_ascii_alphabetic() => letter,
        _ => return Err(malformed()),
    };

    let number = number.strip_prefix('+').unwrap_or(number);
    let whole = number.split('.').next().unwrap_or(number);
    let digits = whole.strip_prefix('-').unwrap_or(whole);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }

    Ok(format!("{:>3}", format!("{}{}", whole, unit)))
}

impl<R: CommandRunner> Sampler for ThermalSampler<R> {
    fn sample(&mut self) -> Result<String, SensorError> {
        let lines = self.runner.run(&self.command)?;
        let reading = self.find_reading(&lines)?;
        compact_reading(reading)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
