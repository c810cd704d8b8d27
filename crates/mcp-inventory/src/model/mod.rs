//! Inventory domain types: normalized records and host context.

pub mod host;
pub mod record;

pub use host::*;
pub use record::*;
