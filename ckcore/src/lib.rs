pub mod buf;
pub mod error;
pub mod hash;
pub mod trailer;

pub use error::ChecksumError;
