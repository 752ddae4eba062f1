use dwmstatus_rs_core::command::{CommandRunner, SystemCommand};
use dwmstatus_rs_core::CommandSpec;

/// Appended when a line is cut short.
pub const OVERFLOW_MARKER: char = '+';

/// Keep at most `capacity` characters of `line`, marking a cut with `+`.
#[must_use]
pub fn clip_line(line: &str, capacity: usize) -> String {
    let mut chars = line.chars();
    let mut clipped: String = chars.by_ref().take(capacity).collect();
    if chars.next().is_some() {
        clipped.push(OVERFLOW_MARKER);
    }
    clipped
}

/// JVM garbage-collection sampler.
#[derive(Debug)]
pub struct GcSampler<R = SystemCommand> {
    command: CommandSpec,
    capacity: usize,
    runner: R,
}

impl GcSampler<SystemCommand> {
    pub fn new(command: CommandSpec, capacity: usize) -> Self {
        Self::with_runner(command, capacity, SystemCommand)
    }
}

impl<R: CommandRunner> GcSampler<R> {
    pub fn with_runner(command: CommandSpec, capacity: usize, runner: R) -> Self {
        Self {
            command,
            capacity,
            runner,
        }
    }

    /// First line of the tool's output, clipped to capacity, or `None` if the
    /// tool could not be run or printed nothing.
    pub fn try_sample(&mut self) -> Option<String> {
        let lines = match self.runner.run(&self.command) {
            Ok(lines) => lines,
            Err(e) => {
                log::debug!("gc: {}", e);
                return None;
            }
        };

        lines.first().map(|line| clip_line(line, self.capacity))
    }
}
