pub mod classify;
mod matcher;
mod parser;
mod types;

pub use types::{CompileError, Pattern};
