use std::fmt;

use crate::types::{
    COLUMN_EMAIL_SIZE, COLUMN_USERNAME_SIZE, EMAIL_OFFSET, ID_OFFSET, ID_SIZE, Key, ROW_SIZE,
    USERNAME_OFFSET, error::DatabaseError,
};

/// The single fixed-schema record stored by a table. `id` doubles as the
/// primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: Key,
    pub username: String,
    pub email: String,
}

impl Row {
    pub fn new(
        id: Key,
        username: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, DatabaseError> {
        let row = Self {
            id,
            username: username.into(),
            email: email.into(),
        };
        row.check_widths()?;
        Ok(row)
    }

    /// Both string columns must fit their fixed slots.
    fn check_widths(&self) -> Result<(), DatabaseError> {
        check_width("username", &self.username, COLUMN_USERNAME_SIZE)?;
        check_width("email", &self.email, COLUMN_EMAIL_SIZE)
    }

    /// Write the fixed-width encoding into `destination`, which must hold at
    /// least `ROW_SIZE` bytes. String columns are NUL-padded; a column wider
    /// than its slot is `FieldTooLong` and nothing is written.
    pub fn serialize(&self, destination: &mut [u8]) -> Result<(), DatabaseError> {
        self.check_widths()?;
        if destination.len() < ROW_SIZE {
            return Err(DatabaseError::SerializationError {
                details: format!(
                    "row buffer too small: expected {} bytes, got {}",
                    ROW_SIZE,
                    destination.len()
                ),
            });
        }
        destination[ID_OFFSET..ID_OFFSET + ID_SIZE].copy_from_slice(&self.id.to_le_bytes());
        write_padded(
            &mut destination[USERNAME_OFFSET..USERNAME_OFFSET + COLUMN_USERNAME_SIZE],
            self.username.as_bytes(),
        );
        write_padded(
            &mut destination[EMAIL_OFFSET..EMAIL_OFFSET + COLUMN_EMAIL_SIZE],
            self.email.as_bytes(),
        );
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<[u8; ROW_SIZE], DatabaseError> {
        let mut buffer = [0u8; ROW_SIZE];
        self.serialize(&mut buffer)?;
        Ok(buffer)
    }

    pub fn deserialize(source: &[u8]) -> Result<Self, DatabaseError> {
        if source.len() < ROW_SIZE {
            return Err(DatabaseError::SerializationError {
                details: format!(
                    "row buffer too small: expected {} bytes, got {}",
                    ROW_SIZE,
                    source.len()
                ),
            });
        }
        let id = Key::from_le_bytes([
            source[ID_OFFSET],
            source[ID_OFFSET + 1],
            source[ID_OFFSET + 2],
            source[ID_OFFSET + 3],
        ]);
        let username = read_padded(
            "username",
            &source[USERNAME_OFFSET..USERNAME_OFFSET + COLUMN_USERNAME_SIZE],
        )?;
        let email = read_padded("email", &source[EMAIL_OFFSET..EMAIL_OFFSET + COLUMN_EMAIL_SIZE])?;
        Ok(Self {
            id,
            username,
            email,
        })
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username, self.email)
    }
}

fn check_width(field: &'static str, value: &str, max: usize) -> Result<(), DatabaseError> {
    if value.len() > max {
        return Err(DatabaseError::FieldTooLong {
            field,
            max,
            actual: value.len(),
        });
    }
    Ok(())
}

// Callers check the width first.
fn write_padded(column: &mut [u8], value: &[u8]) {
    column[..value.len()].copy_from_slice(value);
    column[value.len()..].fill(0);
}

// Bytes after the first NUL are not part of the value.
fn read_padded(field: &str, column: &[u8]) -> Result<String, DatabaseError> {
    let end = column.iter().position(|&b| b == 0).unwrap_or(column.len());
    String::from_utf8(column[..end].to_vec()).map_err(|e| DatabaseError::SerializationError {
        details: format!("{} is not valid UTF-8: {}", field, e),
    })
}
