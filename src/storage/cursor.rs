use crate::{
    storage::bplus_tree::BPlusTree,
    types::{Key, PageNum, error::DatabaseError, page::LeafNode, row::Row},
};

/// A position inside a leaf. `end_of_table` marks the position one past the
/// last row.
pub struct Cursor<'a> {
    tree: &'a mut BPlusTree,
    page_num: PageNum,
    cell_num: u32,
    end_of_table: bool,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(
        tree: &'a mut BPlusTree,
        page_num: PageNum,
        cell_num: u32,
        end_of_table: bool,
    ) -> Self {
        Self {
            tree,
            page_num,
            cell_num,
            end_of_table,
        }
    }

    pub fn page_num(&self) -> PageNum {
        self.page_num
    }

    pub fn cell_num(&self) -> u32 {
        self.cell_num
    }

    pub fn is_end_of_table(&self) -> bool {
        self.end_of_table
    }

    /// Key under the cursor, `None` when the cursor sits past the last cell
    /// of its leaf.
    pub fn key(&mut self) -> Result<Option<Key>, DatabaseError> {
        if self.end_of_table {
            return Ok(None);
        }
        let page = self.tree.pager.get_page(self.page_num)?;
        let leaf = LeafNode::new(&page[..]);
        if self.cell_num >= leaf.num_cells() {
            return Ok(None);
        }
        Ok(Some(leaf.key(self.cell_num)))
    }

    /// Encoded row under the cursor.
    pub fn value(&mut self) -> Result<Option<&[u8]>, DatabaseError> {
        if self.end_of_table {
            return Ok(None);
        }
        let cell_num = self.cell_num;
        let page = self.tree.pager.get_page(self.page_num)?;
        if cell_num >= LeafNode::new(&page[..]).num_cells() {
            return Ok(None);
        }
        Ok(Some(LeafNode::new(&page[..]).into_value(cell_num)))
    }

    pub fn row(&mut self) -> Result<Option<Row>, DatabaseError> {
        match self.value()? {
            Some(bytes) => Row::deserialize(bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Step to the next cell, following the leaf chain at the end of a leaf.
    pub fn advance(&mut self) -> Result<(), DatabaseError> {
        let page = self.tree.pager.get_page(self.page_num)?;
        let leaf = LeafNode::new(&page[..]);
        self.cell_num += 1;
        if self.cell_num >= leaf.num_cells() {
            match leaf.next_leaf() {
                0 => self.end_of_table = true,
                next_page_num => {
                    self.page_num = next_page_num;
                    self.cell_num = 0;
                }
            }
        }
        Ok(())
    }

    /// Insert `row` at the cursor position, splitting the leaf (and its
    /// ancestors) when full. Nothing is written if the table lacks the pages
    /// for the split.
    pub fn insert(self, row: &Row) -> Result<(), DatabaseError> {
        self.tree.ensure_capacity(self.page_num)?;
        self.tree.leaf_node_insert(self.page_num, self.cell_num, row)
    }
}

/// Iterator over every row in key order.
pub struct TableScan<'a> {
    cursor: Cursor<'a>,
    failed: bool,
}

impl<'a> TableScan<'a> {
    pub fn new(cursor: Cursor<'a>) -> Self {
        Self {
            cursor,
            failed: false,
        }
    }
}

impl Iterator for TableScan<'_> {
    type Item = Result<Row, DatabaseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.cursor.is_end_of_table() {
            return None;
        }
        let result = self
            .cursor
            .row()
            .and_then(|row| self.cursor.advance().map(|_| row));
        match result {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
