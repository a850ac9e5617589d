use laurel::{
    StorageConfig, Table,
    types::{Key, PAGE_SIZE, error::DatabaseError, row::Row},
    utils::mock::TempDatabase,
};

fn create_test_row(id: Key) -> Row {
    Row::new(id, format!("user{}", id), format!("person{}@example.com", id)).unwrap()
}

#[test]
fn test_empty_table_select() {
    let db = TempDatabase::new().unwrap();
    let mut table = db.open().unwrap();

    assert_eq!(table.root_page_num(), 0);
    assert!(table.select_all().unwrap().is_empty());
    assert_eq!(table.dump_tree().unwrap(), "- leaf (size 0)\n");
}

#[test]
fn test_insert_and_select_in_key_order() {
    let db = TempDatabase::new().unwrap();
    let mut table = db.open().unwrap();
    for id in [5, 1, 3] {
        table.insert(&create_test_row(id)).unwrap();
    }

    let ids: Vec<Key> = table.select_all().unwrap().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 3, 5]);
}

#[test]
fn test_scan_iterator() {
    let db = TempDatabase::new().unwrap();
    let mut table = db.open().unwrap();
    for id in 1..=30 {
        table.insert(&create_test_row(id)).unwrap();
    }

    let rows: Vec<Row> = table
        .scan()
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(rows.len(), 30);
    assert_eq!(rows[0], create_test_row(1));
    assert_eq!(rows[29], create_test_row(30));

    let first_two: Vec<Key> = table
        .scan()
        .unwrap()
        .take(2)
        .map(|r| r.unwrap().id)
        .collect();
    assert_eq!(first_two, vec![1, 2]);
}

#[test]
fn test_get_by_id() {
    let db = TempDatabase::new().unwrap();
    let mut table = db.open().unwrap();
    table
        .insert(&Row::new(7, "grace", "grace@example.com").unwrap())
        .unwrap();

    let row = table.get(7).unwrap().unwrap();
    assert_eq!(row.username, "grace");
    assert!(table.get(8).unwrap().is_none());
}

#[test]
fn test_oversized_row_literal_is_rejected() {
    let db = TempDatabase::new().unwrap();
    let mut table = db.open().unwrap();
    table.insert(&create_test_row(2)).unwrap();

    // 33 bytes, the last character straddling the 32-byte column boundary.
    let username = format!("{}é", "a".repeat(31));
    let row = Row {
        id: 1,
        username,
        email: "e".to_string(),
    };
    assert!(matches!(
        table.insert(&row),
        Err(DatabaseError::FieldTooLong {
            field: "username",
            max: 32,
            actual: 33
        })
    ));

    let long_email = Row {
        id: 3,
        username: "u".to_string(),
        email: "e".repeat(256),
    };
    assert!(matches!(
        table.insert(&long_email),
        Err(DatabaseError::FieldTooLong { field: "email", .. })
    ));

    assert_eq!(table.select_all().unwrap(), vec![create_test_row(2)]);
    assert!(table.get(1).unwrap().is_none());
}

#[test]
fn test_duplicate_insert() {
    let db = TempDatabase::new().unwrap();
    let mut table = db.open().unwrap();
    table.insert(&create_test_row(1)).unwrap();

    assert!(matches!(
        table.insert(&create_test_row(1)),
        Err(DatabaseError::DuplicateKey { key: 1 })
    ));
    assert_eq!(table.select_all().unwrap().len(), 1);
}

#[test]
fn test_data_persists_after_close() {
    let db = TempDatabase::new().unwrap();
    {
        let mut table = db.open().unwrap();
        table
            .insert(&Row::new(1, "user1", "person1@example.com").unwrap())
            .unwrap();
        table.close().unwrap();
    }

    let mut table = db.open().unwrap();
    assert_eq!(
        table.select_all().unwrap(),
        vec![Row::new(1, "user1", "person1@example.com").unwrap()]
    );
}

#[test]
fn test_multi_level_tree_persists() {
    let db = TempDatabase::new().unwrap();
    let before = {
        let mut table = db.open().unwrap();
        for id in (1..=100).rev() {
            table.insert(&create_test_row(id)).unwrap();
        }
        let dump = table.dump_tree().unwrap();
        table.close().unwrap();
        dump
    };

    let file_len = db.file_len().unwrap();
    assert_eq!(file_len % PAGE_SIZE as u64, 0);

    let mut table = db.open().unwrap();
    assert_eq!(u64::from(table.num_pages()) * PAGE_SIZE as u64, file_len);
    assert_eq!(table.dump_tree().unwrap(), before);
    let ids: Vec<Key> = table.select_all().unwrap().iter().map(|r| r.id).collect();
    assert_eq!(ids, (1..=100).collect::<Vec<_>>());

    // Reopened tables keep accepting rows.
    table.insert(&create_test_row(101)).unwrap();
    assert_eq!(table.get(101).unwrap().unwrap().id, 101);
}

#[test]
fn test_unclosed_table_writes_nothing() {
    let db = TempDatabase::new().unwrap();
    {
        let mut table = db.open().unwrap();
        table.insert(&create_test_row(1)).unwrap();
    }
    assert_eq!(db.file_len().unwrap(), 0);
}

#[test]
fn test_table_full_message_and_recovery() {
    let db = TempDatabase::new().unwrap();
    let mut table = db
        .open_with_config(StorageConfig::default().with_max_pages(3))
        .unwrap();
    for id in 1..=20 {
        table.insert(&create_test_row(id)).unwrap();
    }

    let err = table.insert(&create_test_row(21)).unwrap_err();
    assert!(matches!(err, DatabaseError::TableFull { max_pages: 3 }));
    assert_eq!(table.select_all().unwrap().len(), 20);
    table.close().unwrap();

    let mut table = db.open().unwrap();
    assert_eq!(table.select_all().unwrap().len(), 20);
}

#[test]
fn test_constants() {
    let constants = Table::constants();
    assert!(constants.contains("ROW_SIZE: 291\n"));
    assert!(constants.contains("LEAF_NODE_MAX_CELLS: 13\n"));
}

#[test]
fn test_config_from_lookup() {
    let config = StorageConfig::from_lookup(|name| match name {
        "LAUREL_MAX_PAGES" => Some("250".to_string()),
        _ => None,
    })
    .unwrap();
    assert_eq!(config.max_pages, 250);
    assert_eq!(config, StorageConfig::default().with_max_pages(250));

    let err = StorageConfig::from_lookup(|name| match name {
        "LAUREL_INTERNAL_NODE_MAX_KEYS" => Some("many".to_string()),
        _ => None,
    })
    .unwrap_err();
    assert!(matches!(err, DatabaseError::InvalidConfig { .. }));

    let err = StorageConfig::from_lookup(|name| match name {
        "LAUREL_INTERNAL_NODE_MAX_KEYS" => Some("511".to_string()),
        _ => None,
    })
    .unwrap_err();
    assert!(matches!(err, DatabaseError::InvalidConfig { .. }));

    assert!(
        StorageConfig::from_lookup(|_| Some("0".to_string())).is_err(),
        "zero pages is not a usable table"
    );
}
