pub mod error;
pub mod statement;
