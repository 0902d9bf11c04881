mod analysis;
mod chess;
mod quality;

pub use analysis::*;
pub use chess::*;
pub use quality::*;
