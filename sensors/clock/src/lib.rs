//! Local date and time for dwmstatus-rs.

pub mod clock;

pub use clock::ClockSampler;
