use dwmstatus_rs_core::command::{CommandRunner, SystemCommand};
use dwmstatus_rs_core::{format, CommandSpec, SensorError};

/// Ways an `iostat` report can fall short.
#[derive(Debug, thiserror::Error)]
pub enum IoStatError {
    /// The command could not be run
    #[error(transparent)]
    Command(#[from] SensorError),

    /// Fewer than two device tables were printed
    #[error("Expected two device tables, found {found}")]
    MissingTable { found: usize },

    /// The report ended right after the second table header
    #[error("Report ended after the second device table header")]
    Truncated,
}

/// Header prefix of the device table.
const TABLE_HEADER: &str = "Device";

/// Extract the highest `%util` of the second device table, in percent.
///
/// The first table holds averages since boot, so it is skipped along with the
/// line that directly follows the second header. Every remaining line
/// contributes the number after its last space; lines without one, or whose
/// last field is not a number, are ignored. The result is clamped to
/// `0.0..=100.0`.
///
/// # Errors
///
/// Returns [`IoStatError::MissingTable`] or [`IoStatError::Truncated`] if the
/// report does not get that far.
pub fn parse_utilization<S: AsRef<str>>(lines: &[S]) -> Result<f64, IoStatError> {
    let mut lines = lines.iter().map(|line| line.as_ref());

    let mut found = 0;
    while found < 2 {
        match lines.next() {
            Some(line) if line.starts_with(TABLE_HEADER) => found += 1,
            Some(_) => {}
            None => return Err(IoStatError::MissingTable { found }),
        }
    }

    lines.next().ok_or(IoStatError::Truncated)?;

    let max = lines
        .filter_map(|line| line.rfind(' ').map(|space| &line[space + 1..]))
        .filter_map(|field| field.trim().replace(',', ".").parse::<f64>().ok())
        .fold(0.0_f64, f64::max);

    Ok(max.clamp(0.0, 100.0))
}

/// Disk I/O utilization sampler.
///
/// Each call blocks for as long as the command takes, one second with the
/// default `iostat -x 1 2`.
#[derive(Debug)]
pub struct IoStatSampler<R = SystemCommand> {
    command: CommandSpec,
    runner: R,
}

impl IoStatSampler<SystemCommand> {
    pub fn new(command: CommandSpec) -> Self {
        Self::with_runner(command, SystemCommand)
    }
}

impl<R: CommandRunner> IoStatSampler<R> {
    pub fn with_runner(command: CommandSpec, runner: R) -> Self {
        Self { command, runner }
    }

    /// Run the command and return the busiest device's utilization in percent.
    pub fn read(&self) -> Result<f64, IoStatError> {
        let lines = self.runner.run(&self.command)?;
        parse_utilization(&lines)
    }

    /// Sample utilization as one digit, or `None` if no usable report came back.
    pub fn try_sample(&mut self) -> Option<char> {
        match self.read() {
            Ok(util) => Some(format::digit(util / 100.0)),
            Err(e) => {
                log::debug!("iostat: no utilization this round: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dwmstatus_rs_core::command::CannedOutput;

    const REPORT: &str = "\
Linux 6.1.0-13-amd64 (host) \t10/18/2026 \t_x86_64_\t(8 CPU)

avg-cpu:  %user   %nice %system %iowait  %steal   %idle
           3.10    0.01    1.02    0.20    0.00   95.67

Device            r/s     rkB/s   rrqm/s  %rrqm r_await rareq-sz     w/s     wkB/s  aqu-sz  %util
nvme0n1          1.20     40.11     0.01   0.83    0.21    33.42    2.31     51.02    0.00  99.00
sda              0.10      1.00     0.00   0.00    0.50    10.00    0.00      0.00    0.00  98.00


avg-cpu:  %user   %nice %system %iowait  %steal   %idle
          12.50    0.00    3.75    1.25    0.00   82.50

Device            r/s     rkB/s   rrqm/s  %rrqm r_await rareq-sz     w/s     wkB/s  aqu-sz  %util
nvme0n1          0.00      0.00     0.00   0.00    0.00     0.00   40.00   2048.00    0.90  88.00
sda              0.00      0.00     0.00   0.00    0.00     0.00    0.00      0.00    0.00   0.00
sdb             12.00    512.00     0.00   0.00    1.50    42.67    4.00     64.00    0.10  23.70
sdc              3.00     24.00     0.00   0.00    0.80     8.00    1.00      4.00    0.01   5.10

";

    fn sampler(output: CannedOutput) -> IoStatSampler<CannedOutput> {
        IoStatSampler::with_runner(CommandSpec::new("iostat", &["-x", "1", "2"]), output)
    }

    #[test]
    fn test_second_table_maximum() {
        let lines: Vec<&str> = REPORT.lines().collect();
        let util = parse_utilization(&lines).unwrap();
        assert!((util - 23.7).abs() < 1e-9);
    }

    #[test]
    fn test_sample_digit() {
        assert_eq!(sampler(CannedOutput::new(REPORT)).try_sample(), Some('2'));
    }

    #[test]
    fn test_utilization_is_clamped() {
        let report = "Device %util\nDevice %util\nskipped 1.00\nsda 250.00\n";
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(parse_utilization(&lines).unwrap(), 100.0);
        assert_eq!(sampler(CannedOutput::new(report)).try_sample(), Some('9'));
    }

    #[test]
    fn test_decimal_comma_and_junk_lines() {
        let report = "Device %util\nDevice %util\nskipped 1,00\nsda 42,50\nno-space-here\nsdb n/a\n";
        let lines: Vec<&str> = report.lines().collect();
        assert!((parse_utilization(&lines).unwrap() - 42.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_second_table_is_zero() {
        let report = "Device %util\nDevice %util\nskipped 1.00\n";
        assert_eq!(sampler(CannedOutput::new(report)).try_sample(), Some('0'));
    }

    #[test]
    fn test_missing_table_yields_nothing() {
        let only_first = "Device %util\nsda 12.00\n";
        let lines: Vec<&str> = only_first.lines().collect();
        assert!(matches!(
            parse_utilization(&lines),
            Err(IoStatError::MissingTable { found: 1 })
        ));
        assert_eq!(sampler(CannedOutput::new("")).try_sample(), None);
        assert_eq!(sampler(CannedOutput::new(only_first)).try_sample(), None);
    }

    #[test]
    fn test_truncated_report_yields_nothing() {
        let lines = ["Device %util", "sda 1.00", "Device %util"];
        assert!(matches!(parse_utilization(&lines[..]), Err(IoStatError::Truncated)));
    }

    #[test]
    fn test_missing_command_yields_nothing() {
        let mut iostat = sampler(CannedOutput::missing());
        assert!(matches!(iostat.read(), Err(IoStatError::Command(_))));
        assert_eq!(iostat.try_sample(), None);
    }
}
