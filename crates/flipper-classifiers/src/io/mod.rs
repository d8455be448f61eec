//! IO utilities for loading measurement tables.

pub mod penguins_csv;

pub use penguins_csv::{read_penguins_csv, read_penguins_from_reader, LoadSummary};
