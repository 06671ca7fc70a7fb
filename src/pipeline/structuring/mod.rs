pub mod client;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod types;

pub use client::*;
pub use orchestrator::*;
pub use parser::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StructuringError {
    #[error("Chat request failed: {0}")]
    Request(String),

    #[error("Chat API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Chat response contained no choices")]
    EmptyResponse,
}
