use std::{cmp::Ordering, fmt::Write, path::Path};

use tracing::{debug, warn};

use crate::{
    storage::{
        config::StorageConfig,
        cursor::Cursor,
        pager::{PageBuffer, Pager},
    },
    types::{
        Key, LEAF_NODE_LEFT_SPLIT_COUNT, LEAF_NODE_MAX_CELLS, LEAF_NODE_RIGHT_SPLIT_COUNT, PageNum,
        error::DatabaseError,
        page::{InternalNode, LeafNode, NodeType, node_type, set_node_parent, set_node_root},
        row::Row,
    },
};

fn corrupted(page_num: PageNum, reason: &str) -> DatabaseError {
    DatabaseError::CorruptedPage {
        page_num,
        reason: reason.to_string(),
    }
}

/// The B+ tree of one table. Leaves hold `(key, row)` cells and are chained in
/// key order; internal nodes record for each child the largest key under it.
/// The root always lives on `root_page_num`; a root split moves the old root's
/// contents out instead of moving the root.
pub struct BPlusTree {
    pub(crate) pager: Pager,
    pub(crate) root_page_num: PageNum,
    internal_node_max_keys: u32,
}

impl BPlusTree {
    pub fn open<P: AsRef<Path>>(path: P, config: StorageConfig) -> Result<Self, DatabaseError> {
        config.validate()?;
        let mut pager = Pager::open(path, config.max_pages)?;
        let root_page_num = 0;
        if pager.num_pages() == 0 {
            let root = pager.get_page(root_page_num)?;
            let mut node = LeafNode::new(&mut root[..]);
            node.initialize();
            node.set_root(true);
        }
        Ok(Self {
            pager,
            root_page_num,
            internal_node_max_keys: config.internal_node_max_keys,
        })
    }

    pub fn internal_node_max_keys(&self) -> u32 {
        self.internal_node_max_keys
    }

    pub fn root_page_num(&self) -> PageNum {
        self.root_page_num
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    /// Read-only view of a page, loading it if needed. Pages change only
    /// through the tree's own operations.
    pub fn page(&mut self, page_num: PageNum) -> Result<&PageBuffer, DatabaseError> {
        self.pager.get_page(page_num).map(|page| &*page)
    }

    /// Position of `key`, or of the slot it would be inserted at.
    pub fn find(&mut self, key: Key) -> Result<Cursor<'_>, DatabaseError> {
        let (page_num, cell_num) = self.find_position(key)?;
        Ok(Cursor::new(self, page_num, cell_num, false))
    }

    /// Cursor at the smallest key, already at the end for an empty table.
    pub fn table_start(&mut self) -> Result<Cursor<'_>, DatabaseError> {
        let (page_num, cell_num) = self.find_position(0)?;
        let page = self.pager.get_page(page_num)?;
        let end_of_table = LeafNode::new(&page[..]).num_cells() == 0;
        Ok(Cursor::new(self, page_num, cell_num, end_of_table))
    }

    fn find_position(&mut self, key: Key) -> Result<(PageNum, u32), DatabaseError> {
        let mut page_num = self.root_page_num;
        for _ in 0..=self.pager.max_pages() {
            let page = self.pager.get_page(page_num)?;
            match node_type(&page[..])? {
                NodeType::Leaf => return Ok((page_num, LeafNode::new(&page[..]).find(key))),
                NodeType::Internal => {
                    let node = InternalNode::new(&page[..]);
                    let child_index = node.find_child(key);
                    page_num = node
                        .child(child_index)
                        .ok_or_else(|| corrupted(page_num, "child index out of range"))?;
                }
            }
        }
        Err(corrupted(page_num, "descent from the root does not reach a leaf"))
    }

    pub fn insert(&mut self, row: &Row) -> Result<(), DatabaseError> {
        let mut cursor = self.find(row.id)?;
        if cursor.key()? == Some(row.id) {
            return Err(DatabaseError::DuplicateKey { key: row.id });
        }
        cursor.insert(row)
    }

    pub fn get(&mut self, key: Key) -> Result<Option<Row>, DatabaseError> {
        let mut cursor = self.find(key)?;
        if cursor.key()? != Some(key) {
            return Ok(None);
        }
        cursor.row()
    }

    /// Largest key anywhere under `page_num`, found by following rightmost
    /// children down to a leaf.
    pub fn subtree_max_key(&mut self, page_num: PageNum) -> Result<Key, DatabaseError> {
        let mut current = page_num;
        for _ in 0..=self.pager.max_pages() {
            let page = self.pager.get_page(current)?;
            match node_type(&page[..])? {
                NodeType::Leaf => {
                    return LeafNode::new(&page[..])
                        .max_key()
                        .ok_or_else(|| corrupted(current, "empty leaf has no max key"));
                }
                NodeType::Internal => current = InternalNode::new(&page[..]).right_child(),
            }
        }
        Err(corrupted(page_num, "rightmost descent does not reach a leaf"))
    }

    /// Fail with `TableFull` before touching anything if inserting into this
    /// leaf would need more pages than remain.
    pub(crate) fn ensure_capacity(&mut self, leaf_page_num: PageNum) -> Result<(), DatabaseError> {
        let page = self.pager.get_page(leaf_page_num)?;
        let leaf = LeafNode::new(&page[..]);
        if leaf.num_cells() < LEAF_NODE_MAX_CELLS {
            return Ok(());
        }
        let mut needed: u64 = 1;
        let mut is_root = leaf.is_root();
        let mut parent = leaf.parent();
        for _ in 0..=self.pager.max_pages() {
            if is_root {
                needed += 1;
                break;
            }
            let page = self.pager.get_page(parent)?;
            let node = InternalNode::new(&page[..]);
            if node.num_keys() < self.internal_node_max_keys {
                break;
            }
            needed += 1;
            is_root = node.is_root();
            parent = node.parent();
        }
        let max_pages = self.pager.max_pages();
        if u64::from(self.pager.num_pages()) + needed > u64::from(max_pages) {
            warn!(
                num_pages = self.pager.num_pages(),
                needed, max_pages, "insert rejected, table full"
            );
            return Err(DatabaseError::TableFull { max_pages });
        }
        Ok(())
    }

    pub(crate) fn leaf_node_insert(
        &mut self,
        page_num: PageNum,
        cell_num: u32,
        row: &Row,
    ) -> Result<(), DatabaseError> {
        let value = row.to_bytes()?;
        let page = self.pager.get_page(page_num)?;
        let num_cells = LeafNode::new(&page[..]).num_cells();
        if num_cells >= LEAF_NODE_MAX_CELLS {
            return self.leaf_node_split_and_insert(page_num, cell_num, row.id, &value);
        }
        let mut leaf = LeafNode::new(&mut page[..]);
        for i in (cell_num + 1..=num_cells).rev() {
            leaf.copy_cell_within(i - 1, i);
        }
        leaf.set_num_cells(num_cells + 1);
        leaf.set_key(cell_num, row.id);
        leaf.value_mut(cell_num).copy_from_slice(&value);
        Ok(())
    }

    fn leaf_node_split_and_insert(
        &mut self,
        old_page_num: PageNum,
        cell_num: u32,
        key: Key,
        value: &[u8],
    ) -> Result<(), DatabaseError> {
        let old_page = *self.pager.get_page(old_page_num)?;
        let old = LeafNode::new(&old_page[..]);
        let old_max = old
            .max_key()
            .ok_or_else(|| corrupted(old_page_num, "splitting an empty leaf"))?;

        let new_page_num = self.pager.allocate_page_number();
        {
            let new_page = self.pager.get_page(new_page_num)?;
            let mut right = LeafNode::new(&mut new_page[..]);
            right.initialize();
            right.set_parent(old.parent());
            right.set_next_leaf(old.next_leaf());
            for i in LEAF_NODE_LEFT_SPLIT_COUNT..=LEAF_NODE_MAX_CELLS {
                place_split_cell(&mut right, i - LEAF_NODE_LEFT_SPLIT_COUNT, &old, i, cell_num, key, value);
            }
            right.set_num_cells(LEAF_NODE_RIGHT_SPLIT_COUNT);
        }
        let new_max = {
            let page = self.pager.get_page(old_page_num)?;
            let mut left = LeafNode::new(&mut page[..]);
            for i in 0..LEAF_NODE_LEFT_SPLIT_COUNT {
                place_split_cell(&mut left, i, &old, i, cell_num, key, value);
            }
            left.set_num_cells(LEAF_NODE_LEFT_SPLIT_COUNT);
            left.set_next_leaf(new_page_num);
            left.key(LEAF_NODE_LEFT_SPLIT_COUNT - 1)
        };
        debug!(
            page_num = old_page_num,
            new_page_num, old_max, new_max, "split leaf node"
        );

        if old.is_root() {
            self.create_new_root(new_page_num)
        } else {
            let parent_page_num = old.parent();
            self.update_internal_node_key(parent_page_num, old_max, new_max)?;
            self.internal_node_insert(parent_page_num, new_page_num)
        }
    }

    /// Move the root's contents to a fresh page that becomes the left child,
    /// then turn the root page into an internal node over that copy and
    /// `right_child_page_num`.
    fn create_new_root(&mut self, right_child_page_num: PageNum) -> Result<(), DatabaseError> {
        let root_page_num = self.root_page_num;
        let root_snapshot = *self.pager.get_page(root_page_num)?;

        let left_child_page_num = self.pager.allocate_page_number();
        {
            let left = self.pager.get_page(left_child_page_num)?;
            *left = root_snapshot;
            set_node_root(&mut left[..], false);
            set_node_parent(&mut left[..], root_page_num);
        }
        if node_type(&root_snapshot[..])? == NodeType::Internal {
            let moved = InternalNode::new(&root_snapshot[..]);
            for i in 0..=moved.num_keys() {
                let child = moved
                    .child(i)
                    .ok_or_else(|| corrupted(root_page_num, "child index out of range"))?;
                self.set_parent(child, left_child_page_num)?;
            }
        }
        let left_child_max = self.subtree_max_key(left_child_page_num)?;
        {
            let root = self.pager.get_page(root_page_num)?;
            let mut node = InternalNode::new(&mut root[..]);
            node.initialize();
            node.set_root(true);
            node.set_children(&[
                (left_child_page_num, left_child_max),
                (right_child_page_num, 0),
            ]);
        }
        self.set_parent(right_child_page_num, root_page_num)?;
        debug!(
            root_page_num,
            left_child_page_num, right_child_page_num, left_child_max, "created new root"
        );
        Ok(())
    }

    fn set_parent(&mut self, page_num: PageNum, parent: PageNum) -> Result<(), DatabaseError> {
        let page = self.pager.get_page(page_num)?;
        set_node_parent(&mut page[..], parent);
        Ok(())
    }

    fn update_internal_node_key(
        &mut self,
        page_num: PageNum,
        old_key: Key,
        new_key: Key,
    ) -> Result<(), DatabaseError> {
        let page = self.pager.get_page(page_num)?;
        let mut node = InternalNode::new(&mut page[..]);
        let index = node.find_child(old_key);
        // The rightmost child has no recorded key to update.
        if index < node.num_keys() {
            node.set_key(index, new_key);
        }
        Ok(())
    }

    fn internal_node_insert(
        &mut self,
        parent_page_num: PageNum,
        child_page_num: PageNum,
    ) -> Result<(), DatabaseError> {
        let child_max = self.subtree_max_key(child_page_num)?;
        let (num_keys, right_child) = {
            let page = self.pager.get_page(parent_page_num)?;
            let node = InternalNode::new(&page[..]);
            (node.num_keys(), node.right_child())
        };
        if num_keys >= self.internal_node_max_keys {
            return self.internal_node_split_and_insert(parent_page_num, child_page_num, child_max);
        }
        let right_max = self.subtree_max_key(right_child)?;

        let page = self.pager.get_page(parent_page_num)?;
        let mut node = InternalNode::new(&mut page[..]);
        if child_max > right_max {
            node.set_cell(num_keys, right_child, right_max);
            node.set_right_child(child_page_num);
        } else {
            let index = node.find_child(child_max);
            for i in (index + 1..=num_keys).rev() {
                node.copy_cell_within(i - 1, i);
            }
            node.set_cell(index, child_page_num, child_max);
        }
        node.set_num_keys(num_keys + 1);
        self.set_parent(child_page_num, parent_page_num)
    }

    fn internal_node_split_and_insert(
        &mut self,
        old_page_num: PageNum,
        child_page_num: PageNum,
        child_max: Key,
    ) -> Result<(), DatabaseError> {
        let old_page = *self.pager.get_page(old_page_num)?;
        let old = InternalNode::new(&old_page[..]);

        let mut entries: Vec<(PageNum, Key)> = Vec::with_capacity(old.num_keys() as usize + 2);
        for i in 0..old.num_keys() {
            let child = old
                .child(i)
                .ok_or_else(|| corrupted(old_page_num, "child index out of range"))?;
            entries.push((child, old.key(i)));
        }
        let right_child = old.right_child();
        entries.push((right_child, self.subtree_max_key(right_child)?));
        let position = entries.partition_point(|&(_, max)| max < child_max);
        entries.insert(position, (child_page_num, child_max));

        // Largest key under this node, which is what its parent has recorded.
        let old_max = entries.last().map_or(child_max, |&(_, max)| max);
        let right_count = entries.len().div_ceil(2);
        let left_count = entries.len() - right_count;
        let (left, right) = entries.split_at(left_count);
        let new_max = left
            .last()
            .map(|&(_, max)| max)
            .ok_or_else(|| corrupted(old_page_num, "internal split left no children"))?;

        let new_page_num = self.pager.allocate_page_number();
        {
            let page = self.pager.get_page(new_page_num)?;
            let mut node = InternalNode::new(&mut page[..]);
            node.initialize();
            node.set_parent(old.parent());
            node.set_children(right);
        }
        {
            let page = self.pager.get_page(old_page_num)?;
            InternalNode::new(&mut page[..]).set_children(left);
        }
        for &(child, _) in right {
            self.set_parent(child, new_page_num)?;
        }
        if position < left_count {
            self.set_parent(child_page_num, old_page_num)?;
        }
        debug!(
            page_num = old_page_num,
            new_page_num,
            left_children = left.len(),
            right_children = right.len(),
            "split internal node"
        );

        if old.is_root() {
            self.create_new_root(new_page_num)
        } else {
            let parent_page_num = old.parent();
            self.update_internal_node_key(parent_page_num, old_max, new_max)?;
            self.internal_node_insert(parent_page_num, new_page_num)
        }
    }

    /// Text rendering of the tree, depth first and left to right.
    pub fn dump_tree(&mut self) -> Result<String, DatabaseError> {
        let mut out = String::new();
        self.dump_node(self.root_page_num, 0, &mut out)?;
        Ok(out)
    }

    fn dump_node(
        &mut self,
        page_num: PageNum,
        level: u32,
        out: &mut String,
    ) -> Result<(), DatabaseError> {
        if level > self.pager.max_pages() {
            return Err(corrupted(page_num, "tree deeper than the page count"));
        }
        let page = *self.pager.get_page(page_num)?;
        match node_type(&page[..])? {
            NodeType::Leaf => {
                let node = LeafNode::new(&page[..]);
                indent(out, level);
                let _ = writeln!(out, "- leaf (size {})", node.num_cells());
                for i in 0..node.num_cells() {
                    indent(out, level + 1);
                    let _ = writeln!(out, "- {}", node.key(i));
                }
            }
            NodeType::Internal => {
                let node = InternalNode::new(&page[..]);
                indent(out, level);
                let _ = writeln!(out, "- internal (size {})", node.num_keys());
                for i in 0..node.num_keys() {
                    let child = node
                        .child(i)
                        .ok_or_else(|| corrupted(page_num, "child index out of range"))?;
                    self.dump_node(child, level + 1, out)?;
                    indent(out, level + 1);
                    let _ = writeln!(out, "- key {}", node.key(i));
                }
                self.dump_node(node.right_child(), level + 1, out)?;
            }
        }
        Ok(())
    }
}

/// Place logical cell `i` of an overflowing leaf (old cells plus the new one
/// at `cell_num`) into `dest_index` of `dest`.
fn place_split_cell<B: AsRef<[u8]> + AsMut<[u8]>>(
    dest: &mut LeafNode<B>,
    dest_index: u32,
    old: &LeafNode<&[u8]>,
    i: u32,
    cell_num: u32,
    key: Key,
    value: &[u8],
) {
    match i.cmp(&cell_num) {
        Ordering::Equal => {
            dest.set_key(dest_index, key);
            dest.value_mut(dest_index).copy_from_slice(value);
        }
        Ordering::Greater => dest.cell_mut(dest_index).copy_from_slice(old.cell(i - 1)),
        Ordering::Less => dest.cell_mut(dest_index).copy_from_slice(old.cell(i)),
    }
}

fn indent(out: &mut String, level: u32) {
    for _ in 0..level {
        out.push_str("  ");
    }
}
