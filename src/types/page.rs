use std::fmt::Write;

use crate::types::{
    COMMON_NODE_HEADER_SIZE, INTERNAL_NODE_CELL_SIZE, INTERNAL_NODE_CHILD_SIZE,
    INTERNAL_NODE_HEADER_SIZE, INTERNAL_NODE_NUM_KEYS_OFFSET, INTERNAL_NODE_RIGHT_CHILD_OFFSET,
    IS_ROOT_OFFSET, Key, LEAF_NODE_CELL_SIZE, LEAF_NODE_HEADER_SIZE, LEAF_NODE_KEY_OFFSET,
    LEAF_NODE_MAX_CELLS, LEAF_NODE_NEXT_LEAF_OFFSET, LEAF_NODE_NUM_CELLS_OFFSET,
    LEAF_NODE_SPACE_FOR_CELLS, LEAF_NODE_VALUE_OFFSET, LEAF_NODE_VALUE_SIZE, NODE_TYPE_OFFSET,
    PARENT_POINTER_OFFSET, PageNum, ROW_SIZE, error::DatabaseError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Internal = 0,
    Leaf = 1,
}

impl NodeType {
    pub fn from_u8(value: u8) -> Result<Self, DatabaseError> {
        match value {
            0 => Ok(NodeType::Internal),
            1 => Ok(NodeType::Leaf),
            _ => Err(DatabaseError::InvalidNodeType(value)),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            NodeType::Internal => 0,
            NodeType::Leaf => 1,
        }
    }
}

/*
 * Node Layout inside one page (all integers little-endian u32 unless noted)
 * ┌──────────────────────────────────────────────────────────────────┐
 * │ COMMON HEADER (6 bytes)                                          │
 * │  node_type(1) | is_root(1) | parent(4)                           │
 * ├──────────────────────────────────────────────────────────────────┤
 * │ LEAF:     num_cells(4) | next_leaf(4)                            │
 * │           [key(4) + row(291)] * num_cells                        │
 * ├──────────────────────────────────────────────────────────────────┤
 * │ INTERNAL: num_keys(4) | right_child(4)                           │
 * │           [child(4) + key(4)] * num_keys                         │
 * └──────────────────────────────────────────────────────────────────┘
 */

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn write_u32(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

pub fn node_type(page: &[u8]) -> Result<NodeType, DatabaseError> {
    NodeType::from_u8(page[NODE_TYPE_OFFSET])
}

pub fn set_node_type(page: &mut [u8], node_type: NodeType) {
    page[NODE_TYPE_OFFSET] = node_type.as_u8();
}

pub fn is_node_root(page: &[u8]) -> bool {
    page[IS_ROOT_OFFSET] != 0
}

pub fn set_node_root(page: &mut [u8], is_root: bool) {
    page[IS_ROOT_OFFSET] = u8::from(is_root);
}

pub fn node_parent(page: &[u8]) -> PageNum {
    read_u32(page, PARENT_POINTER_OFFSET)
}

pub fn set_node_parent(page: &mut [u8], parent: PageNum) {
    write_u32(page, PARENT_POINTER_OFFSET, parent);
}

/// Largest key recorded in the node itself: the last cell key of a leaf, or
/// the last array key of an internal node. `None` for a node without keys.
pub fn node_max_key(page: &[u8]) -> Result<Option<Key>, DatabaseError> {
    Ok(match node_type(page)? {
        NodeType::Leaf => LeafNode::new(page).max_key(),
        NodeType::Internal => InternalNode::new(page).max_key(),
    })
}

/// Typed view of a leaf node over a borrowed page buffer.
pub struct LeafNode<B> {
    buf: B,
}

impl<B: AsRef<[u8]>> LeafNode<B> {
    pub fn new(buf: B) -> Self {
        Self { buf }
    }

    fn bytes(&self) -> &[u8] {
        self.buf.as_ref()
    }

    fn cell_offset(cell_num: u32) -> usize {
        LEAF_NODE_HEADER_SIZE + cell_num as usize * LEAF_NODE_CELL_SIZE
    }

    pub fn is_root(&self) -> bool {
        is_node_root(self.bytes())
    }

    pub fn parent(&self) -> PageNum {
        node_parent(self.bytes())
    }

    pub fn num_cells(&self) -> u32 {
        read_u32(self.bytes(), LEAF_NODE_NUM_CELLS_OFFSET)
    }

    /// Page number of the next leaf in key order, 0 at the end of the chain.
    pub fn next_leaf(&self) -> PageNum {
        read_u32(self.bytes(), LEAF_NODE_NEXT_LEAF_OFFSET)
    }

    pub fn cell(&self, cell_num: u32) -> &[u8] {
        let offset = Self::cell_offset(cell_num);
        &self.bytes()[offset..offset + LEAF_NODE_CELL_SIZE]
    }

    pub fn key(&self, cell_num: u32) -> Key {
        read_u32(self.bytes(), Self::cell_offset(cell_num) + LEAF_NODE_KEY_OFFSET)
    }

    pub fn value(&self, cell_num: u32) -> &[u8] {
        let offset = Self::cell_offset(cell_num) + LEAF_NODE_VALUE_OFFSET;
        &self.bytes()[offset..offset + LEAF_NODE_VALUE_SIZE]
    }

    pub fn max_key(&self) -> Option<Key> {
        match self.num_cells() {
            0 => None,
            n => Some(self.key(n - 1)),
        }
    }

    /// Binary search for `key`. Returns the index of the matching cell, or
    /// the index the key would be inserted at.
    pub fn find(&self, key: Key) -> u32 {
        let mut min_index = 0;
        let mut one_past_max_index = self.num_cells();
        while one_past_max_index != min_index {
            let index = (min_index + one_past_max_index) / 2;
            let key_at_index = self.key(index);
            if key == key_at_index {
                return index;
            }
            if key < key_at_index {
                one_past_max_index = index;
            } else {
                min_index = index + 1;
            }
        }
        min_index
    }
}

impl<'a> LeafNode<&'a [u8]> {
    /// Like `value`, but the slice borrows the page rather than the view.
    pub fn into_value(self, cell_num: u32) -> &'a [u8] {
        let offset = Self::cell_offset(cell_num) + LEAF_NODE_VALUE_OFFSET;
        &self.buf[offset..offset + LEAF_NODE_VALUE_SIZE]
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> LeafNode<B> {
    fn bytes_mut(&mut self) -> &mut [u8] {
        self.buf.as_mut()
    }

    pub fn initialize(&mut self) {
        let bytes = self.bytes_mut();
        set_node_type(bytes, NodeType::Leaf);
        set_node_root(bytes, false);
        write_u32(bytes, LEAF_NODE_NUM_CELLS_OFFSET, 0);
        write_u32(bytes, LEAF_NODE_NEXT_LEAF_OFFSET, 0);
    }

    pub fn set_root(&mut self, is_root: bool) {
        set_node_root(self.bytes_mut(), is_root);
    }

    pub fn set_parent(&mut self, parent: PageNum) {
        set_node_parent(self.bytes_mut(), parent);
    }

    pub fn set_num_cells(&mut self, num_cells: u32) {
        write_u32(self.bytes_mut(), LEAF_NODE_NUM_CELLS_OFFSET, num_cells);
    }

    pub fn set_next_leaf(&mut self, next_leaf: PageNum) {
        write_u32(self.bytes_mut(), LEAF_NODE_NEXT_LEAF_OFFSET, next_leaf);
    }

    pub fn cell_mut(&mut self, cell_num: u32) -> &mut [u8] {
        let offset = Self::cell_offset(cell_num);
        &mut self.bytes_mut()[offset..offset + LEAF_NODE_CELL_SIZE]
    }

    pub fn set_key(&mut self, cell_num: u32, key: Key) {
        let offset = Self::cell_offset(cell_num) + LEAF_NODE_KEY_OFFSET;
        write_u32(self.bytes_mut(), offset, key);
    }

    pub fn value_mut(&mut self, cell_num: u32) -> &mut [u8] {
        let offset = Self::cell_offset(cell_num) + LEAF_NODE_VALUE_OFFSET;
        &mut self.bytes_mut()[offset..offset + LEAF_NODE_VALUE_SIZE]
    }

    /// Copy one whole cell onto another slot of the same node.
    pub fn copy_cell_within(&mut self, from: u32, to: u32) {
        let src = Self::cell_offset(from);
        let dest = Self::cell_offset(to);
        self.bytes_mut()
            .copy_within(src..src + LEAF_NODE_CELL_SIZE, dest);
    }
}

/// Typed view of an internal node over a borrowed page buffer.
pub struct InternalNode<B> {
    buf: B,
}

impl<B: AsRef<[u8]>> InternalNode<B> {
    pub fn new(buf: B) -> Self {
        Self { buf }
    }

    fn bytes(&self) -> &[u8] {
        self.buf.as_ref()
    }

    fn cell_offset(cell_num: u32) -> usize {
        INTERNAL_NODE_HEADER_SIZE + cell_num as usize * INTERNAL_NODE_CELL_SIZE
    }

    pub fn is_root(&self) -> bool {
        is_node_root(self.bytes())
    }

    pub fn parent(&self) -> PageNum {
        node_parent(self.bytes())
    }

    pub fn num_keys(&self) -> u32 {
        read_u32(self.bytes(), INTERNAL_NODE_NUM_KEYS_OFFSET)
    }

    pub fn right_child(&self) -> PageNum {
        read_u32(self.bytes(), INTERNAL_NODE_RIGHT_CHILD_OFFSET)
    }

    pub fn key(&self, key_num: u32) -> Key {
        read_u32(
            self.bytes(),
            Self::cell_offset(key_num) + INTERNAL_NODE_CHILD_SIZE,
        )
    }

    /// Child pointer by index. Index `num_keys` is the rightmost child;
    /// anything beyond it does not exist.
    pub fn child(&self, child_num: u32) -> Option<PageNum> {
        let num_keys = self.num_keys();
        if child_num > num_keys {
            None
        } else if child_num == num_keys {
            Some(self.right_child())
        } else {
            Some(read_u32(self.bytes(), Self::cell_offset(child_num)))
        }
    }

    pub fn max_key(&self) -> Option<Key> {
        match self.num_keys() {
            0 => None,
            n => Some(self.key(n - 1)),
        }
    }

    /// Index of the child that should contain `key`: the first key that is
    /// >= `key`, or `num_keys` for the rightmost child.
    pub fn find_child(&self, key: Key) -> u32 {
        let mut min_index = 0;
        let mut max_index = self.num_keys();
        while min_index != max_index {
            let index = (min_index + max_index) / 2;
            if self.key(index) >= key {
                max_index = index;
            } else {
                min_index = index + 1;
            }
        }
        min_index
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> InternalNode<B> {
    fn bytes_mut(&mut self) -> &mut [u8] {
        self.buf.as_mut()
    }

    pub fn initialize(&mut self) {
        let bytes = self.bytes_mut();
        set_node_type(bytes, NodeType::Internal);
        set_node_root(bytes, false);
        write_u32(bytes, INTERNAL_NODE_NUM_KEYS_OFFSET, 0);
        write_u32(bytes, INTERNAL_NODE_RIGHT_CHILD_OFFSET, 0);
    }

    pub fn set_root(&mut self, is_root: bool) {
        set_node_root(self.bytes_mut(), is_root);
    }

    pub fn set_parent(&mut self, parent: PageNum) {
        set_node_parent(self.bytes_mut(), parent);
    }

    pub fn set_num_keys(&mut self, num_keys: u32) {
        write_u32(self.bytes_mut(), INTERNAL_NODE_NUM_KEYS_OFFSET, num_keys);
    }

    pub fn set_right_child(&mut self, child: PageNum) {
        write_u32(self.bytes_mut(), INTERNAL_NODE_RIGHT_CHILD_OFFSET, child);
    }

    pub fn set_key(&mut self, key_num: u32, key: Key) {
        let offset = Self::cell_offset(key_num) + INTERNAL_NODE_CHILD_SIZE;
        write_u32(self.bytes_mut(), offset, key);
    }

    /// Same routing as `child`: index `num_keys` writes the rightmost child.
    pub fn set_child(&mut self, child_num: u32, child: PageNum) {
        if child_num == self.num_keys() {
            self.set_right_child(child);
        } else {
            let offset = Self::cell_offset(child_num);
            write_u32(self.bytes_mut(), offset, child);
        }
    }

    pub fn set_cell(&mut self, cell_num: u32, child: PageNum, key: Key) {
        let offset = Self::cell_offset(cell_num);
        let bytes = self.bytes_mut();
        write_u32(bytes, offset, child);
        write_u32(bytes, offset + INTERNAL_NODE_CHILD_SIZE, key);
    }

    pub fn copy_cell_within(&mut self, from: u32, to: u32) {
        let src = Self::cell_offset(from);
        let dest = Self::cell_offset(to);
        self.bytes_mut()
            .copy_within(src..src + INTERNAL_NODE_CELL_SIZE, dest);
    }

    /// Rewrite the node's children from `(child, max key)` pairs in key order.
    /// The last pair becomes the rightmost child and its key is not stored.
    pub fn set_children(&mut self, entries: &[(PageNum, Key)]) {
        let Some((&(right_child, _), keyed)) = entries.split_last() else {
            self.set_num_keys(0);
            return;
        };
        for (i, &(child, key)) in keyed.iter().enumerate() {
            self.set_cell(i as u32, child, key);
        }
        self.set_num_keys(keyed.len() as u32);
        self.set_right_child(right_child);
    }
}

/// Layout constants in the format of the `.constants` meta-command.
pub fn constants_report() -> String {
    let mut report = String::new();
    let _ = writeln!(report, "ROW_SIZE: {}", ROW_SIZE);
    let _ = writeln!(report, "COMMON_NODE_HEADER_SIZE: {}", COMMON_NODE_HEADER_SIZE);
    let _ = writeln!(report, "LEAF_NODE_HEADER_SIZE: {}", LEAF_NODE_HEADER_SIZE);
    let _ = writeln!(report, "LEAF_NODE_CELL_SIZE: {}", LEAF_NODE_CELL_SIZE);
    let _ = writeln!(report, "LEAF_NODE_SPACE_FOR_CELLS: {}", LEAF_NODE_SPACE_FOR_CELLS);
    let _ = writeln!(report, "LEAF_NODE_MAX_CELLS: {}", LEAF_NODE_MAX_CELLS);
    report
}
