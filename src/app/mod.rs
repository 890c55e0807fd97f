// Application layer: wiring configuration into the engine and rendering results.

pub mod builder;
pub mod report;

pub use builder::{build_engine, read_history};
