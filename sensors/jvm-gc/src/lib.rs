//! Garbage-collection share of running JVMs for dwmstatus-rs.
//!
//! Shows the first line printed by `jvm-stats -c1`. Like the I/O sampler it
//! degrades to no output instead of failing.

pub mod gc;

pub use gc::{clip_line, GcSampler, OVERFLOW_MARKER};
