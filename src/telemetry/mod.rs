//! Temperature sampling
//!
//! Independent 1 Hz loop over up to four sensor slots. Discovery happens
//! once at startup and the slot assignment never changes afterward; absent
//! slots are logged as empty cells so every record has the same shape.

mod sampler;

pub use sampler::TemperatureSampler;
