//! # dwmstatus-rs-iostat
//!
//! Busiest-device I/O utilization for dwmstatus-rs, read from the extended
//! device report of `iostat` (sysstat).
//!
//! Unlike the other samplers this one never fails: when `iostat` is missing or
//! its report is cut short, it simply produces no digit.

mod iostat;

pub use iostat::{parse_utilization, IoStatError, IoStatSampler};
