//! Database repositories.

pub mod records;
pub mod settings;

pub use records::{Collection, RecordsRepo};
pub use settings::SettingsRepo;
