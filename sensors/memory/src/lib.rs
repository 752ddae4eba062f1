//! Memory and swap usage for dwmstatus-rs.
//!
//! This crate reads memory statistics from `/proc/meminfo` and renders memory
//! and swap pressure as two digits.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dwmstatus_rs_memory::MemorySampler;
//! use dwmstatus_rs_core::Sampler;
//!
//! let mut sampler = MemorySampler::new();
//! println!("memory/swap: {}", sampler.sample()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod memory;

pub use memory::{MemoryInfo, MemorySampler};
