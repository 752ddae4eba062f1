use dwmstatus_rs_core::command::{CommandRunner, SystemCommand};
use dwmstatus_rs_core::{CommandSpec, Sampler, SensorError};

/// Shown when there is mail.
pub const MAIL_MARKER: char = 'M';

/// Unread-mail sampler.
///
/// The command must print a single integer count; the token is `M` when the
/// count is positive and a space otherwise.
#[derive(Debug)]
pub struct MailSampler<R = SystemCommand> {
    name: String,
    command: CommandSpec,
    runner: R,
}

impl MailSampler<SystemCommand> {
    pub fn new(command: CommandSpec) -> Self {
        Self::with_runner(command, SystemCommand)
    }
}

impl<R: CommandRunner> MailSampler<R> {
    pub fn with_runner(command: CommandSpec, runner: R) -> Self {
        Self {
            name: "mail".to_owned(),
            command,
            runner,
        }
    }

    /// Run the indexer and parse its count.
    pub fn count(&self) -> Result<i64, SensorError> {
        let lines = self.runner.run(&self.command)?;
        let token = lines
            .iter()
            .flat_map(|line| line.split_whitespace())
            .next()
            .ok_or_else(|| SensorError::parse(format!("No output from '{}'", self.command)))?;

        token.parse::<i64>().map_err(|e| {
            SensorError::parse_with_source(format!("Could not parse '{}' output", self.command), e)
        })
    }
}

impl<R: CommandRunner> Sampler for MailSampler<R> {
    fn sample(&mut self) -> Result<String, SensorError> {
        let flag = if self.count()? > 0 { MAIL_MARKER } else { ' ' };
        Ok(flag.to_string())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dwmstatus_rs_core::command::CannedOutput;

    fn sampler(output: CannedOutput) -> MailSampler<CannedOutput> {
        MailSampler::with_runner(CommandSpec::new("notmuch", &["count", "tag:inbox"]), output)
    }

    #[test]
    fn test_no_mail_is_blank() {
        assert_eq!(sampler(CannedOutput::new("0\n")).sample().unwrap(), " ");
    }

    #[test]
    fn test_mail_shows_marker() {
        assert_eq!(sampler(CannedOutput::new("3\n")).sample().unwrap(), "M");
        assert_eq!(sampler(CannedOutput::new("\n  17\n")).count().unwrap(), 17);
    }

    #[test]
    fn test_unparsable_output_is_fatal() {
        let err = sampler(CannedOutput::new("error: database locked\n")).sample().unwrap_err();
        assert!(matches!(err, SensorError::Parse { .. }));

        let err = sampler(CannedOutput::new("")).sample().unwrap_err();
        assert!(matches!(err, SensorError::Parse { .. }));
    }

    #[test]
    fn test_missing_command_is_fatal() {
        let err = sampler(CannedOutput::missing()).sample().unwrap_err();
        assert!(err.is_unavailable());
    }
}
