use thiserror::Error;

use crate::types::{Key, PageNum};

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Duplicate key: {key}")]
    DuplicateKey { key: Key },

    #[error("Table full (max_pages: {max_pages})")]
    TableFull { max_pages: u32 },

    #[error("Tried to fetch page number out of bounds: {page_num} >= {max_pages}")]
    PageOutOfBounds { page_num: PageNum, max_pages: u32 },

    #[error("Tried to flush unmaterialized page {page_num}")]
    FlushUnmaterializedPage { page_num: PageNum },

    #[error("Corrupted page: page_num={page_num}, reason={reason}")]
    CorruptedPage { page_num: PageNum, reason: String },

    #[error("Invalid node type: {0}")]
    InvalidNodeType(u8),

    #[error("Field '{field}' is too long: {actual} bytes (max: {max})")]
    FieldTooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("Serialization/deserialization error: {details}")]
    SerializationError { details: String },

    #[error("Invalid configuration value for {name}: {reason}")]
    InvalidConfig { name: String, reason: String },
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
