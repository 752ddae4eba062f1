use dwmstatus_rs_core::format;
use std::fmt::Write as _;

/// Latest rendered token of every metric, kept between refreshes so a metric
/// sampled on a slower cadence still shows its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scratch {
    pub gc: String,
    pub temperature: String,
    pub memory: String,
    pub io: String,
    pub cpu: String,
    pub mail: String,
    pub date: String,
}

impl Scratch {
    /// Join the fields into one status line.
    ///
    /// Memory and I/O digits are adjacent; every other field is separated by
    /// a single space, empty fields included. The result is cut to
    /// `capacity - 1` bytes.
    #[must_use]
    pub fn assemble(&self, show_date: bool, capacity: usize) -> String {
        let mut line = format!(
            "{} {} {}{} {} {}",
            self.gc, self.temperature, self.memory, self.io, self.cpu, self.mail
        );
        if show_date {
            line.push(' ');
            line.push_str(&self.date);
        }

        format::truncate_bytes(&mut line, capacity.saturating_sub(1));
        line
    }
}

/// Render `line` for the debug echo: the line itself, then each of its bytes
/// as two uppercase hex digits followed by a space.
#[must_use]
pub fn debug_dump(line: &str) -> String {
    let mut out = String::with_capacity(line.len() * 4 + 2);
    out.push_str(line);
    out.push('\n');
    for byte in line.bytes() {
        let _ = write!(out, "{:02X} ", byte);
    }
    out.push('\n');
    out
}
