use crate::{
    planner::error::PrepareError,
    types::{Key, row::Row},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Insert(Row),
    Select,
}

/// Turn one line of input into a statement. Inserts come back with a row
/// that already fits the column widths.
pub fn prepare(input: &str) -> Result<Statement, PrepareError> {
    let input = input.trim();
    if input.starts_with("insert") {
        return prepare_insert(input);
    }
    if input == "select" {
        return Ok(Statement::Select);
    }
    Err(PrepareError::UnrecognizedStatement(input.to_string()))
}

fn prepare_insert(input: &str) -> Result<Statement, PrepareError> {
    let mut tokens = input.split_whitespace();
    if tokens.next() != Some("insert") {
        return Err(PrepareError::UnrecognizedStatement(input.to_string()));
    }
    let (Some(id), Some(username), Some(email)) = (tokens.next(), tokens.next(), tokens.next())
    else {
        return Err(PrepareError::SyntaxError);
    };

    let id: i64 = id.parse().map_err(|_| PrepareError::SyntaxError)?;
    if id < 0 {
        return Err(PrepareError::NegativeId);
    }
    let id = Key::try_from(id).map_err(|_| PrepareError::SyntaxError)?;

    let row = Row::new(id, username, email).map_err(|_| PrepareError::StringTooLong)?;
    Ok(Statement::Insert(row))
}
