pub mod settings;

pub use settings::{RelayConfig, Settings};
