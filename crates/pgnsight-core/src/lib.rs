//! Position, move and evaluation types shared by the pgnsight crates.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::*;
pub use types::*;
