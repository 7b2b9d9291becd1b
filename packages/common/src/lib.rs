pub mod error;
pub mod filesystem;

pub use error::*;
pub use filesystem::*;
