//! Core record model shared by the parsers, writers and renderer.

pub mod record;

pub use record::{PortId, Record, CSV_COLUMNS};
