//! Mortality assumptions: the annual qx table and its CSV loader

mod mortality;
pub mod loader;

pub use mortality::{MortalityTable, Gender, FALLBACK_QX};
pub use loader::{load_mortality_table, load_mortality_table_from_reader, DEFAULT_TABLE_PATH};
