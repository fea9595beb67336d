//! Lantern ABI crate: stable contracts shared by the session core and model runtimes.

pub mod runtime;
pub mod token;

pub use runtime::*;
pub use token::*;
