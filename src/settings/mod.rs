//! TOML settings plus the small CLI that selects the settings file.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
