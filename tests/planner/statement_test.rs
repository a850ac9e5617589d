use laurel::{
    planner::{
        error::PrepareError,
        statement::{Statement, prepare},
    },
    types::row::Row,
};

#[test]
fn test_prepare_insert() {
    let statement = prepare("insert 1 user1 person1@example.com").unwrap();
    assert_eq!(
        statement,
        Statement::Insert(Row::new(1, "user1", "person1@example.com").unwrap())
    );
}

#[test]
fn test_prepare_select() {
    assert_eq!(prepare("select").unwrap(), Statement::Select);
    assert_eq!(prepare("  select  ").unwrap(), Statement::Select);
}

#[test]
fn test_prepare_ignores_extra_tokens() {
    let statement = prepare("insert 2   bob  bob@example.com trailing words").unwrap();
    assert_eq!(
        statement,
        Statement::Insert(Row::new(2, "bob", "bob@example.com").unwrap())
    );
}

#[test]
fn test_prepare_missing_arguments() {
    assert_eq!(prepare("insert"), Err(PrepareError::SyntaxError));
    assert_eq!(prepare("insert 1 bob"), Err(PrepareError::SyntaxError));
}

#[test]
fn test_prepare_non_numeric_id() {
    assert_eq!(prepare("insert abc bob b@x.com"), Err(PrepareError::SyntaxError));
    assert_eq!(prepare("insert 1.5 bob b@x.com"), Err(PrepareError::SyntaxError));
}

#[test]
fn test_prepare_negative_id() {
    assert_eq!(prepare("insert -1 cstack foo@bar.com"), Err(PrepareError::NegativeId));
}

#[test]
fn test_prepare_id_bounds() {
    assert!(prepare("insert 0 zero zero@example.com").is_ok());
    assert!(prepare("insert 4294967295 max max@example.com").is_ok());
    assert_eq!(
        prepare("insert 4294967296 big big@example.com"),
        Err(PrepareError::SyntaxError)
    );
}

#[test]
fn test_prepare_string_lengths() {
    let username = "a".repeat(32);
    let email = "a".repeat(255);
    assert!(prepare(&format!("insert 1 {} {}", username, email)).is_ok());

    let long_username = "a".repeat(33);
    assert_eq!(
        prepare(&format!("insert 1 {} {}", long_username, email)),
        Err(PrepareError::StringTooLong)
    );

    let long_email = "a".repeat(256);
    assert_eq!(
        prepare(&format!("insert 1 {} {}", username, long_email)),
        Err(PrepareError::StringTooLong)
    );
}

#[test]
fn test_prepare_unrecognized() {
    assert_eq!(
        prepare("update 1 a b"),
        Err(PrepareError::UnrecognizedStatement("update 1 a b".to_string()))
    );
    assert_eq!(
        prepare("select *"),
        Err(PrepareError::UnrecognizedStatement("select *".to_string()))
    );
}

#[test]
fn test_prepare_error_messages() {
    assert_eq!(PrepareError::NegativeId.to_string(), "ID must be positive.");
    assert_eq!(PrepareError::StringTooLong.to_string(), "String is too long.");
    assert_eq!(
        PrepareError::SyntaxError.to_string(),
        "Syntax error. Could not parse statement."
    );
    assert_eq!(
        PrepareError::UnrecognizedStatement("foo".to_string()).to_string(),
        "Unrecognized keyword at start of 'foo'."
    );
}
