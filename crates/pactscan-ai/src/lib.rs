//! Model access layer: the opaque text generator, prompt templates, and
//! language/contract-type detection.

pub mod detect;
pub mod generator;
pub mod prompt;

pub use detect::{detect_contract_type, detect_language};
pub use generator::{GenerateError, Generator, HttpGenerator};
