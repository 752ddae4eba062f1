//! The refresh loop: owns every sampler, the scratch fields and the sink the
//! assembled line is published to.

use crate::cadence::Cadence;
use crate::status::{debug_dump, Scratch};
use dwmstatus_rs_clock::ClockSampler;
use dwmstatus_rs_core::command::CommandRunner;
use dwmstatus_rs_core::{Sampler, SensorError, StatusConfig};
use dwmstatus_rs_cpu::CpuSampler;
use dwmstatus_rs_display::{DisplayError, StatusSink};
use dwmstatus_rs_iostat::IoStatSampler;
use dwmstatus_rs_jvm_gc::GcSampler;
use dwmstatus_rs_mail::MailSampler;
use dwmstatus_rs_memory::MemorySampler;
use dwmstatus_rs_thermal::ThermalSampler;
use std::convert::Infallible;
use std::io::Write;
use std::time::Duration;

/// Failures that stop the daemon.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("{sampler}: {source}")]
    Sample {
        sampler: String,
        #[source]
        source: SensorError,
    },

    #[error("Could not publish the status line: {0}")]
    Publish(#[from] DisplayError),
}

/// Every sampler the loop drives.
///
/// The subprocess-backed samplers share one runner type so tests can swap all
/// external tools at once.
#[derive(Debug)]
pub struct Samplers<R> {
    pub thermal: ThermalSampler<R>,
    pub memory: MemorySampler,
    pub cpu: CpuSampler,
    pub mail: MailSampler<R>,
    pub clock: ClockSampler,
    pub iostat: IoStatSampler<R>,
    /// `None` when garbage-collection sampling is disabled
    pub gc: Option<GcSampler<R>>,
}

impl<R: CommandRunner + Clone> Samplers<R> {
    pub fn from_config(config: &StatusConfig, runner: R) -> Self {
        let gc = config.gc_enabled.then(|| {
            GcSampler::with_runner(config.gc_command.clone(), config.gc_capacity, runner.clone())
        });

        Self {
            thermal: ThermalSampler::with_runner(
                config.temperature_label.clone(),
                config.sensors_command.clone(),
                runner.clone(),
            ),
            memory: MemorySampler::new(),
            cpu: CpuSampler::new(config.max_cpus),
            mail: MailSampler::with_runner(config.mail_command.clone(), runner.clone()),
            clock: ClockSampler::new(config.date_format.clone(), config.date_capacity),
            iostat: IoStatSampler::with_runner(config.iostat_command.clone(), runner),
            gc,
        }
    }
}

fn take<S: Sampler>(sampler: &mut S) -> Result<String, DaemonError> {
    sampler.sample().map_err(|source| DaemonError::Sample {
        sampler: sampler.name().to_owned(),
        source,
    })
}

pub struct StatusDaemon<R, S> {
    samplers: Samplers<R>,
    sink: S,
    scratch: Scratch,
    date_cadence: Cadence,
    mail_cadence: Cadence,
    gc_cadence: Cadence,
    show_date: bool,
    status_max_length: usize,
    interval: Duration,
    echo: bool,
}

impl<R: CommandRunner, S: StatusSink> StatusDaemon<R, S> {
    pub fn new(config: &StatusConfig, samplers: Samplers<R>, sink: S, echo: bool) -> Self {
        Self {
            samplers,
            sink,
            scratch: Scratch::default(),
            date_cadence: Cadence::every(config.date_every),
            mail_cadence: Cadence::every(config.mail_every),
            gc_cadence: Cadence::every(config.gc_every),
            show_date: config.show_date,
            status_max_length: config.status_max_length,
            interval: config.interval(),
            echo,
        }
    }

    #[cfg(test)]
    pub fn scratch(&self) -> &Scratch {
        &self.scratch
    }

    #[cfg(test)]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Seed the CPU sampler's previous snapshot; the digits are discarded.
    pub fn warm_up(&mut self) -> Result<(), DaemonError> {
        take(&mut self.samplers.cpu)?;
        Ok(())
    }

    /// Fill every scratch field once.
    pub fn prime(&mut self) -> Result<(), DaemonError> {
        self.scratch.temperature = take(&mut self.samplers.thermal)?;
        self.scratch.memory = take(&mut self.samplers.memory)?;
        self.scratch.cpu = take(&mut self.samplers.cpu)?;
        self.scratch.mail = take(&mut self.samplers.mail)?;
        self.scratch.date = take(&mut self.samplers.clock)?;
        self.refresh_gc();
        self.scratch.io = self
            .samplers
            .iostat
            .try_sample()
            .map(String::from)
            .unwrap_or_default();
        Ok(())
    }

    /// Sample what is due this iteration, then assemble and publish the line.
    pub fn refresh(&mut self) -> Result<String, DaemonError> {
        self.scratch.temperature = take(&mut self.samplers.thermal)?;
        self.scratch.memory = take(&mut self.samplers.memory)?;
        self.scratch.cpu = take(&mut self.samplers.cpu)?;

        if self.date_cadence.due() {
            self.scratch.date = take(&mut self.samplers.clock)?;
        }
        if self.mail_cadence.due() {
            self.scratch.mail = take(&mut self.samplers.mail)?;
        }
        if self.gc_cadence.due() {
            self.refresh_gc();
        }

        let line = self.scratch.assemble(self.show_date, self.status_max_length);
        self.sink.publish(&line)?;
        Ok(line)
    }

    fn refresh_gc(&mut self) {
        if let Some(gc) = self.samplers.gc.as_mut() {
            self.scratch.gc = gc.try_sample().unwrap_or_default();
        }
    }

    /// Sample I/O utilization. A failed sample keeps the previous digit.
    pub fn refresh_io(&mut self) {
        if let Some(digit) = self.samplers.iostat.try_sample() {
            self.scratch.io = digit.to_string();
        }
    }

    /// Run until a fatal error.
    pub async fn run(mut self) -> Result<Infallible, DaemonError> {
        self.warm_up()?;
        tokio::time::sleep(self.interval).await;
        self.prime()?;
        log::info!("dwmstatus: publishing every {:?}", self.interval);

        loop {
            let line = self.refresh()?;
            if self.echo {
                let mut stdout = std::io::stdout().lock();
                if let Err(e) = stdout.write_all(debug_dump(&line).as_bytes()) {
                    log::debug!("debug echo: {}", e);
                }
            }

            tokio::time::sleep(self.interval).await;
            self.refresh_io();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dwmstatus_rs_core::CommandSpec;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io::Write;
    use std::rc::Rc;

    const SENSORS: &str = "acpitz-acpi-0\ntemp1:        +45.0°C  (crit = +100.0°C)\n";

    const MEMINFO: &str = "\
MemTotal:       16000000 kB
MemFree:         2000000 kB
Buffers:          500000 kB
Cached:          4000000 kB
SwapTotal:       8000000 kB
SwapFree:         400000 kB
";

    const STAT: &str = "\
cpu  200 0 100 1700 0 0 0 0 0 0
cpu0 100 0 50 850 0 0 0 0 0 0
cpu1 100 0 50 850 0 0 0 0 0 0
intr 12345 0 0
";

    const IOSTAT: &str = "\
Linux 6.1.0 (host)  08/26/2013  _x86_64_  (2 CPU)

Device            r/s     w/s   %util
sda              1.00    2.00    5.00

Device            r/s     w/s   %util
sda              1.00    2.00   12.50
sdb              0.00    0.00   25.00
";

    /// Answers each program with whatever output the test set for it last.
    #[derive(Debug, Clone, Default)]
    struct ScriptedRunner {
        outputs: Rc<RefCell<HashMap<String, String>>>,
    }

    impl ScriptedRunner {
        fn set(&self, program: &str, output: &str) {
            self.outputs
                .borrow_mut()
                .insert(program.to_owned(), output.to_owned());
        }

        fn remove(&self, program: &str) {
            self.outputs.borrow_mut().remove(program);
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, spec: &CommandSpec) -> Result<Vec<String>, SensorError> {
            match self.outputs.borrow().get(&spec.program) {
                Some(text) => Ok(text.lines().map(str::to_owned).collect()),
                None => Err(SensorError::launch(
                    spec.to_string(),
                    std::io::Error::new(std::io::ErrorKind::NotFound, "program not found"),
                )),
            }
        }
    }

    #[derive(Debug, Default)]
    struct RecordingSink {
        published: Vec<String>,
    }

    impl StatusSink for RecordingSink {
        fn publish(&mut self, status: &str) -> Result<(), DisplayError> {
            self.published.push(status.to_owned());
            Ok(())
        }
    }

    struct Fixture {
        runner: ScriptedRunner,
        daemon: StatusDaemon<ScriptedRunner, RecordingSink>,
        _stat: tempfile::NamedTempFile,
        _meminfo: tempfile::NamedTempFile,
    }

    fn fixture(config: StatusConfig) -> Fixture {
        let mut stat = tempfile::NamedTempFile::new().unwrap();
        stat.write_all(STAT.as_bytes()).unwrap();
        let mut meminfo = tempfile::NamedTempFile::new().unwrap();
        meminfo.write_all(MEMINFO.as_bytes()).unwrap();

        let runner = ScriptedRunner::default();
        runner.set("sensors", SENSORS);
        runner.set("notmuch", "0\n");
        runner.set("iostat", IOSTAT);
        runner.set("jvm-stats", "S0 12.5\n");

        let mut samplers = Samplers::from_config(&config, runner.clone());
        samplers.cpu = CpuSampler::from_path(stat.path(), config.max_cpus);
        samplers.memory = MemorySampler::from_path(meminfo.path());

        let daemon = StatusDaemon::new(&config, samplers, RecordingSink::default(), false);
        Fixture {
            runner,
            daemon,
            _stat: stat,
            _meminfo: meminfo,
        }
    }

    #[test]
    fn test_first_refresh_publishes_every_field() {
        let mut f = fixture(StatusConfig::default());
        f.daemon.warm_up().unwrap();
        f.daemon.prime().unwrap();

        assert_eq!(f.daemon.scratch().io, "2");
        assert_eq!(f.daemon.scratch().gc, "");

        let line = f.daemon.refresh().unwrap();
        assert_eq!(line, " 45C 592 00  ");
        assert_eq!(f.daemon.sink().published, vec![line]);
    }

    #[test]
    fn test_mail_follows_its_cadence() {
        let mut config = StatusConfig::default();
        config.mail_every = 3;
        let mut f = fixture(config);
        f.daemon.warm_up().unwrap();
        f.daemon.prime().unwrap();
        assert_eq!(f.daemon.scratch().mail, " ");

        f.runner.set("notmuch", "4\n");
        let flags: Vec<String> = (0..4)
            .map(|i| {
                if i == 1 {
                    f.runner.set("notmuch", "0\n");
                }
                f.daemon.refresh().unwrap();
                f.daemon.scratch().mail.clone()
            })
            .collect();

        assert_eq!(flags, vec!["M", "M", "M", " "]);
    }

    #[test]
    fn test_io_keeps_last_digit_when_iostat_fails() {
        let mut f = fixture(StatusConfig::default());
        f.daemon.warm_up().unwrap();
        f.daemon.prime().unwrap();

        f.runner.remove("iostat");
        f.daemon.refresh_io();
        assert_eq!(f.daemon.scratch().io, "2");

        f.runner.set("iostat", "garbage\n");
        f.daemon.refresh_io();
        assert_eq!(f.daemon.scratch().io, "2");
    }

    #[test]
    fn test_gc_when_enabled() {
        let mut config = StatusConfig::default();
        config.gc_enabled = true;
        let mut f = fixture(config);
        f.daemon.warm_up().unwrap();
        f.daemon.prime().unwrap();
        assert_eq!(f.daemon.scratch().gc, "S0 12.5");

        f.runner.remove("jvm-stats");
        let line = f.daemon.refresh().unwrap();
        assert_eq!(f.daemon.scratch().gc, "");
        assert!(line.starts_with(" 45C"));
    }

    #[test]
    fn test_date_is_appended_when_shown() {
        let mut config = StatusConfig::default();
        config.show_date = true;
        config.date_format = "today".to_owned();
        let mut f = fixture(config);
        f.daemon.warm_up().unwrap();
        f.daemon.prime().unwrap();

        assert_eq!(f.daemon.refresh().unwrap(), " 45C 592 00   today");
    }

    #[test]
    fn test_missing_sensor_tool_is_fatal() {
        let mut f = fixture(StatusConfig::default());
        f.daemon.warm_up().unwrap();
        f.daemon.prime().unwrap();

        f.runner.remove("sensors");
        let err = f.daemon.refresh().unwrap_err();
        match err {
            DaemonError::Sample { sampler, source } => {
                assert_eq!(sampler, "thermal-temp1");
                assert!(source.is_unavailable());
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(f.daemon.sink().published.is_empty());
    }

    #[test]
    fn test_missing_stat_file_fails_warm_up() {
        let config = StatusConfig::default();
        let mut samplers = Samplers::from_config(&config, ScriptedRunner::default());
        samplers.cpu = CpuSampler::from_path("/nonexistent/stat", config.max_cpus);
        let mut daemon = StatusDaemon::new(&config, samplers, RecordingSink::default(), false);

        assert!(matches!(
            daemon.warm_up(),
            Err(DaemonError::Sample { ref sampler, .. }) if sampler == "cpu"
        ));
    }
}
