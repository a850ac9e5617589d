use std::path::Path;

use tracing::info;

use crate::{
    storage::{bplus_tree::BPlusTree, config::StorageConfig, cursor::TableScan},
    types::{Key, PageNum, error::DatabaseError, page::constants_report, row::Row},
};

/// Handle on the single table stored in one database file.
pub struct Table {
    tree: BPlusTree,
}

impl Table {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        Self::open_with_config(path, StorageConfig::default())
    }

    pub fn open_with_config<P: AsRef<Path>>(
        path: P,
        config: StorageConfig,
    ) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        let tree = BPlusTree::open(path, config)?;
        info!(
            path = %path.display(),
            num_pages = tree.pager.num_pages(),
            max_pages = config.max_pages,
            "opened table"
        );
        Ok(Self { tree })
    }

    pub fn root_page_num(&self) -> PageNum {
        self.tree.root_page_num
    }

    pub fn num_pages(&self) -> u32 {
        self.tree.pager.num_pages()
    }

    pub fn btree(&mut self) -> &mut BPlusTree {
        &mut self.tree
    }

    /// Insert a row keyed by its id. Fails with `DuplicateKey` or `TableFull`
    /// without modifying the table.
    pub fn insert(&mut self, row: &Row) -> Result<(), DatabaseError> {
        self.tree.insert(row)
    }

    pub fn get(&mut self, id: Key) -> Result<Option<Row>, DatabaseError> {
        self.tree.get(id)
    }

    pub fn scan(&mut self) -> Result<TableScan<'_>, DatabaseError> {
        Ok(TableScan::new(self.tree.table_start()?))
    }

    pub fn select_all(&mut self) -> Result<Vec<Row>, DatabaseError> {
        self.scan()?.collect()
    }

    pub fn dump_tree(&mut self) -> Result<String, DatabaseError> {
        self.tree.dump_tree()
    }

    pub fn constants() -> String {
        constants_report()
    }

    /// Flush every page to disk and close the file.
    pub fn close(self) -> Result<(), DatabaseError> {
        let path = self.tree.pager.path().to_path_buf();
        let num_pages = self.tree.pager.num_pages();
        self.tree.pager.close()?;
        info!(path = %path.display(), num_pages, "closed table");
        Ok(())
    }
}
