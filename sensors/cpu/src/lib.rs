//! Per-core CPU utilization for dwmstatus-rs.
//!
//! This crate reads the cumulative tick counters in `/proc/stat` and turns the
//! difference between two consecutive readings into one utilization digit per
//! core, suitable for a compact status line.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dwmstatus_rs_cpu::CpuSampler;
//! use dwmstatus_rs_core::Sampler;
//!
//! let mut sampler = CpuSampler::new(128);
//!
//! // The first reading has nothing to compare against and is all zeros.
//! let _ = sampler.sample()?;
//! std::thread::sleep(std::time::Duration::from_secs(1));
//! println!("per-core usage: {}", sampler.sample()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cpu;

pub use cpu::{CoreTicks, CpuSampler, CpuSnapshot, CpuStats};
