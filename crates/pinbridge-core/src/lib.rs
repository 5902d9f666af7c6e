pub mod board;
pub mod constants;
pub mod error;
pub mod types;

pub use board::{BoardScheme, rpi_header_map};
pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
