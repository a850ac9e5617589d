use laurel::types::{
    COMMON_NODE_HEADER_SIZE, INTERNAL_NODE_HEADER_SIZE, INTERNAL_NODE_MAX_CELLS,
    LEAF_NODE_CELL_SIZE, LEAF_NODE_HEADER_SIZE, LEAF_NODE_LEFT_SPLIT_COUNT, LEAF_NODE_MAX_CELLS,
    LEAF_NODE_RIGHT_SPLIT_COUNT, LEAF_NODE_SPACE_FOR_CELLS, PAGE_SIZE, ROW_SIZE,
    error::DatabaseError,
    page::{
        InternalNode, LeafNode, NodeType, constants_report, is_node_root, node_max_key,
        node_parent, node_type, set_node_parent, set_node_root, set_node_type,
    },
    row::Row,
};

fn leaf_with_keys(keys: &[u32]) -> Vec<u8> {
    let mut page = vec![0u8; PAGE_SIZE];
    let mut leaf = LeafNode::new(&mut page[..]);
    leaf.initialize();
    for (i, &key) in keys.iter().enumerate() {
        let row = Row::new(key, format!("user{}", key), format!("person{}@example.com", key))
            .unwrap();
        leaf.set_key(i as u32, key);
        row.serialize(leaf.value_mut(i as u32)).unwrap();
    }
    leaf.set_num_cells(keys.len() as u32);
    page
}

#[test]
fn test_layout_constants() {
    assert_eq!(ROW_SIZE, 291);
    assert_eq!(COMMON_NODE_HEADER_SIZE, 6);
    assert_eq!(LEAF_NODE_HEADER_SIZE, 14);
    assert_eq!(LEAF_NODE_CELL_SIZE, 295);
    assert_eq!(LEAF_NODE_SPACE_FOR_CELLS, 4082);
    assert_eq!(LEAF_NODE_MAX_CELLS, 13);
    assert_eq!(LEAF_NODE_RIGHT_SPLIT_COUNT, 7);
    assert_eq!(LEAF_NODE_LEFT_SPLIT_COUNT, 7);
    assert_eq!(INTERNAL_NODE_HEADER_SIZE, 14);
    assert_eq!(INTERNAL_NODE_MAX_CELLS, 510);
}

#[test]
fn test_constants_report() {
    let expected = "ROW_SIZE: 291\n\
                    COMMON_NODE_HEADER_SIZE: 6\n\
                    LEAF_NODE_HEADER_SIZE: 14\n\
                    LEAF_NODE_CELL_SIZE: 295\n\
                    LEAF_NODE_SPACE_FOR_CELLS: 4082\n\
                    LEAF_NODE_MAX_CELLS: 13\n";
    assert_eq!(constants_report(), expected);
}

#[test]
fn test_node_type_byte_values() {
    assert_eq!(NodeType::Internal.as_u8(), 0);
    assert_eq!(NodeType::Leaf.as_u8(), 1);
    assert_eq!(NodeType::from_u8(0).unwrap(), NodeType::Internal);
    assert_eq!(NodeType::from_u8(1).unwrap(), NodeType::Leaf);
    assert!(matches!(
        NodeType::from_u8(7),
        Err(DatabaseError::InvalidNodeType(7))
    ));
}

#[test]
fn test_common_header_accessors() {
    let mut page = vec![0u8; PAGE_SIZE];
    set_node_type(&mut page, NodeType::Internal);
    set_node_root(&mut page, true);
    set_node_parent(&mut page, 0x0102_0304);

    assert_eq!(node_type(&page).unwrap(), NodeType::Internal);
    assert!(is_node_root(&page));
    assert_eq!(node_parent(&page), 0x0102_0304);
    assert_eq!(page[0], 0);
    assert_eq!(page[1], 1);
    assert_eq!(&page[2..6], &[0x04, 0x03, 0x02, 0x01]);
}

#[test]
fn test_leaf_initialize() {
    let mut page = vec![0xAAu8; PAGE_SIZE];
    let mut leaf = LeafNode::new(&mut page[..]);
    leaf.initialize();

    assert_eq!(leaf.num_cells(), 0);
    assert_eq!(leaf.next_leaf(), 0);
    assert!(!leaf.is_root());
    assert_eq!(leaf.max_key(), None);
    assert_eq!(node_type(&page).unwrap(), NodeType::Leaf);
}

#[test]
fn test_leaf_cells_and_values() {
    let page = leaf_with_keys(&[3, 8, 15]);
    let leaf = LeafNode::new(&page[..]);

    assert_eq!(leaf.num_cells(), 3);
    assert_eq!(leaf.key(1), 8);
    assert_eq!(leaf.max_key(), Some(15));

    let row = Row::deserialize(leaf.value(2)).unwrap();
    assert_eq!(row.id, 15);
    assert_eq!(row.username, "user15");

    // num_cells sits at offset 6, the first key right after the header.
    assert_eq!(&page[6..10], &[3, 0, 0, 0]);
    assert_eq!(&page[LEAF_NODE_HEADER_SIZE..LEAF_NODE_HEADER_SIZE + 4], &[3, 0, 0, 0]);
}

#[test]
fn test_leaf_find() {
    let page = leaf_with_keys(&[2, 4, 6, 8]);
    let leaf = LeafNode::new(&page[..]);

    assert_eq!(leaf.find(2), 0);
    assert_eq!(leaf.find(6), 2);
    assert_eq!(leaf.find(1), 0);
    assert_eq!(leaf.find(5), 2);
    assert_eq!(leaf.find(9), 4);

    let empty = leaf_with_keys(&[]);
    assert_eq!(LeafNode::new(&empty[..]).find(10), 0);
}

#[test]
fn test_leaf_copy_cell_within() {
    let mut page = leaf_with_keys(&[1, 2]);
    let mut leaf = LeafNode::new(&mut page[..]);
    leaf.copy_cell_within(1, 2);
    leaf.set_num_cells(3);

    assert_eq!(leaf.key(2), 2);
    let row = Row::deserialize(leaf.value(2)).unwrap();
    assert_eq!(row.username, "user2");
}

#[test]
fn test_internal_children_and_find_child() {
    let mut page = vec![0u8; PAGE_SIZE];
    let mut node = InternalNode::new(&mut page[..]);
    node.initialize();
    node.set_children(&[(1, 7), (2, 15), (3, 22), (4, 30)]);

    assert_eq!(node.num_keys(), 3);
    assert_eq!(node.right_child(), 4);
    assert_eq!(node.child(0), Some(1));
    assert_eq!(node.child(2), Some(3));
    assert_eq!(node.child(3), Some(4));
    assert_eq!(node.child(4), None);
    assert_eq!(node.max_key(), Some(22));

    assert_eq!(node.find_child(1), 0);
    assert_eq!(node.find_child(7), 0);
    assert_eq!(node.find_child(8), 1);
    assert_eq!(node.find_child(22), 2);
    assert_eq!(node.find_child(23), 3);
    assert_eq!(node.find_child(1000), 3);
}

#[test]
fn test_internal_set_child_routes_rightmost() {
    let mut page = vec![0u8; PAGE_SIZE];
    let mut node = InternalNode::new(&mut page[..]);
    node.initialize();
    node.set_children(&[(1, 10), (2, 0)]);

    node.set_child(1, 9);
    assert_eq!(node.right_child(), 9);
    node.set_child(0, 5);
    assert_eq!(node.child(0), Some(5));
    assert_eq!(node.key(0), 10);
}

#[test]
fn test_node_max_key_dispatches_on_type() {
    let leaf = leaf_with_keys(&[4, 9]);
    assert_eq!(node_max_key(&leaf).unwrap(), Some(9));

    let mut page = vec![0u8; PAGE_SIZE];
    let mut node = InternalNode::new(&mut page[..]);
    node.initialize();
    assert_eq!(node_max_key(&page).unwrap(), None);

    let mut node = InternalNode::new(&mut page[..]);
    node.set_children(&[(1, 5), (2, 11), (3, 0)]);
    assert_eq!(node_max_key(&page).unwrap(), Some(11));
}
