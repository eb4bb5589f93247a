pub mod config;
pub mod data_models;
pub mod engine;
pub mod errors;
pub mod merger;
pub mod parsers;
pub mod units;

pub use config::FilePileSettings;
pub use data_models::Record;
pub use engine::{ArchiveListener, Engine};
pub use merger::FilePile;
pub use units::UnitSystem;
