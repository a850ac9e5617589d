pub mod session;

use crate::{
    planner::statement::Statement,
    storage::table::Table,
    types::{error::DatabaseError, row::Row},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteOutcome {
    Inserted,
    Rows(Vec<Row>),
}

pub fn execute(table: &mut Table, statement: Statement) -> Result<ExecuteOutcome, DatabaseError> {
    match statement {
        Statement::Insert(row) => {
            table.insert(&row)?;
            Ok(ExecuteOutcome::Inserted)
        }
        Statement::Select => Ok(ExecuteOutcome::Rows(table.select_all()?)),
    }
}
