//! Tracing setup with a reloadable filter: bootstrap at `info`, then apply
//! the filter from the settings file once it has been parsed.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
