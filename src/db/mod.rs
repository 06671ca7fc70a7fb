pub mod sqlite;
pub mod store;

pub use sqlite::*;
pub use store::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid column name: {0}")]
    InvalidColumn(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
