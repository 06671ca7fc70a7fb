//! Document processing pipeline: extraction (PDF rendering + OCR) and
//! structuring (chat model + tolerant JSON parsing).

pub mod extraction;
pub mod processor;
pub mod structuring;

pub use processor::*;
