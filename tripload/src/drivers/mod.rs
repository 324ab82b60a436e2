//! Concrete sinks for pipeline output.

pub mod gs;
pub mod postgres;
pub(crate) mod postgres_shared;
