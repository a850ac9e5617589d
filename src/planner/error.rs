#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrepareError {
    #[error("ID must be positive.")]
    NegativeId,
    #[error("String is too long.")]
    StringTooLong,
    #[error("Syntax error. Could not parse statement.")]
    SyntaxError,
    #[error("Unrecognized keyword at start of '{0}'.")]
    UnrecognizedStatement(String),
}
