pub mod thermal;

pub use thermal::{compact_reading, ThermalSampler};
