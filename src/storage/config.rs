//! Storage configuration.
//!
//! # Environment Variables
//!
//! - `LAUREL_MAX_PAGES`: maximum number of pages a table may use (default: `100`)
//! - `LAUREL_INTERNAL_NODE_MAX_KEYS`: keys an internal node holds before it
//!   splits (default: the layout capacity, `510`)

use crate::types::{INTERNAL_NODE_MAX_CELLS, TABLE_MAX_PAGES, error::DatabaseError};

pub const MAX_PAGES_VAR: &str = "LAUREL_MAX_PAGES";
pub const INTERNAL_NODE_MAX_KEYS_VAR: &str = "LAUREL_INTERNAL_NODE_MAX_KEYS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageConfig {
    /// Page numbers at or above this bound are rejected, and an insert that
    /// would need one fails with `TableFull`.
    pub max_pages: u32,
    /// Lowering this below the layout capacity only changes when internal
    /// nodes split, never the on-disk format.
    pub internal_node_max_keys: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_pages: TABLE_MAX_PAGES,
            internal_node_max_keys: INTERNAL_NODE_MAX_CELLS,
        }
    }
}

impl StorageConfig {
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_internal_node_max_keys(mut self, max_keys: u32) -> Self {
        self.internal_node_max_keys = max_keys;
        self
    }

    pub fn validate(&self) -> Result<(), DatabaseError> {
        if self.max_pages == 0 {
            return Err(DatabaseError::InvalidConfig {
                name: "max_pages".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if !(2..=INTERNAL_NODE_MAX_CELLS).contains(&self.internal_node_max_keys) {
            return Err(DatabaseError::InvalidConfig {
                name: "internal_node_max_keys".to_string(),
                reason: format!(
                    "must be between 2 and {}, got {}",
                    INTERNAL_NODE_MAX_CELLS, self.internal_node_max_keys
                ),
            });
        }
        Ok(())
    }

    pub fn from_env() -> Result<Self, DatabaseError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from a variable lookup. Unset variables keep their
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DatabaseError> {
        let defaults = Self::default();
        let config = Self {
            max_pages: parse_var(&lookup, MAX_PAGES_VAR)?.unwrap_or(defaults.max_pages),
            internal_node_max_keys: parse_var(&lookup, INTERNAL_NODE_MAX_KEYS_VAR)?
                .unwrap_or(defaults.internal_node_max_keys),
        };
        config.validate()?;
        Ok(config)
    }
}

fn parse_var(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<u32>, DatabaseError> {
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|e| DatabaseError::InvalidConfig {
                name: name.to_string(),
                reason: format!("'{}' is not a valid unsigned integer: {}", raw, e),
            }),
    }
}
