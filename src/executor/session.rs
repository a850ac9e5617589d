use tracing::error;

use crate::{
    executor::{ExecuteOutcome, execute},
    planner::statement::prepare,
    storage::table::Table,
    types::error::DatabaseError,
};

/// What the caller should do after one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineResult {
    pub output: Vec<String>,
    pub exit: bool,
}

impl LineResult {
    fn with_output(output: Vec<String>) -> Self {
        Self {
            output,
            exit: false,
        }
    }
}

/// Interactive front end over one open table. Lines starting with `.` are
/// meta commands, everything else is a statement.
pub struct Session {
    table: Option<Table>,
}

impl Session {
    pub fn new(table: Table) -> Self {
        Self { table: Some(table) }
    }

    pub fn is_closed(&self) -> bool {
        self.table.is_none()
    }

    pub fn handle_line(&mut self, line: &str) -> Result<LineResult, DatabaseError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(LineResult::with_output(Vec::new()));
        }
        if line.starts_with('.') {
            return self.meta_command(line);
        }

        let statement = match prepare(line) {
            Ok(statement) => statement,
            Err(e) => return Ok(LineResult::with_output(vec![e.to_string()])),
        };
        let Some(table) = self.table.as_mut() else {
            return Ok(LineResult {
                output: Vec::new(),
                exit: true,
            });
        };

        let output = match execute(table, statement) {
            Ok(ExecuteOutcome::Inserted) => vec!["Executed.".to_string()],
            Ok(ExecuteOutcome::Rows(rows)) => {
                let mut output: Vec<String> = rows.iter().map(|row| row.to_string()).collect();
                output.push("Executed.".to_string());
                output
            }
            Err(DatabaseError::DuplicateKey { .. }) => vec!["Error: Duplicate key.".to_string()],
            Err(DatabaseError::TableFull { .. }) => vec!["Error: Table full.".to_string()],
            Err(e) => {
                error!(error = %e, "statement failed");
                return Err(e);
            }
        };
        Ok(LineResult::with_output(output))
    }

    fn meta_command(&mut self, line: &str) -> Result<LineResult, DatabaseError> {
        match line {
            ".exit" => {
                self.close()?;
                Ok(LineResult {
                    output: Vec::new(),
                    exit: true,
                })
            }
            ".btree" => {
                let Some(table) = self.table.as_mut() else {
                    return Ok(LineResult::with_output(Vec::new()));
                };
                let mut output = vec!["Tree:".to_string()];
                output.extend(table.dump_tree()?.lines().map(str::to_string));
                Ok(LineResult::with_output(output))
            }
            ".constants" => {
                let mut output = vec!["Constants:".to_string()];
                output.extend(Table::constants().lines().map(str::to_string));
                Ok(LineResult::with_output(output))
            }
            _ => Ok(LineResult::with_output(vec![format!(
                "Unrecognized command '{line}'"
            )])),
        }
    }

    /// Flush and close the table. Calling this twice is a no-op.
    pub fn close(&mut self) -> Result<(), DatabaseError> {
        match self.table.take() {
            Some(table) => table.close(),
            None => Ok(()),
        }
    }
}
