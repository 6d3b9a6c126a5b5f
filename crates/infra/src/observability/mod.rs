//! Observability helpers

pub mod logging;

pub use logging::init_tracing;
