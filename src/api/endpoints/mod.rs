pub mod documents;
pub mod upload;
