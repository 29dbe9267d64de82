//! End-to-end tests of `DataClient` against SQLite.

use strata_core::prelude::*;
use strata_sqlite::{connect, memory_client, SqliteOptions};

fn users(client: &mut DataClient) {
    client
        .add_table(
            "users",
            vec![
                Column::big_int("id").primary_key().auto_increment(),
                Column::string("name").size(100).not_null(),
                Column::integer("age"),
                Column::string("email"),
            ],
        )
        .unwrap();
}

#[test]
fn test_add_and_remove_table() {
    let mut client = memory_client().unwrap();
    assert!(!client.table_exists("t").unwrap());

    client.add_table("t", vec![Column::integer("a")]).unwrap();
    assert!(client.table_exists("t").unwrap());

    client.remove_table("t").unwrap();
    assert!(!client.table_exists("t").unwrap());
}

#[test]
fn test_insert_count_delete() {
    let mut client = memory_client().unwrap();
    users(&mut client);

    let inserted = client
        .insert("users", &["name", "age"], Some(vec!["Alice".into(), 30.into()]))
        .unwrap();
    assert_eq!(inserted, 1);
    assert_eq!(client.count("users", Some(&Filter::eq("age", 30))).unwrap(), 1);

    client
        .delete("users", Some(&Filter::eq("name", "Alice")))
        .unwrap();
    assert_eq!(client.count("users", Some(&Filter::eq("age", 30))).unwrap(), 0);
}

#[test]
fn test_insert_returning_generated_key() {
    let mut client = memory_client().unwrap();
    users(&mut client);

    let first = client
        .insert_returning("users", "id", &["name"], Some(vec!["a".into()]))
        .unwrap();
    let second = client
        .insert_returning("users", "id", &["name"], Some(vec!["b".into()]))
        .unwrap();
    assert_eq!(first, SqlValue::Int(1));
    assert_eq!(second, SqlValue::Int(2));
}

#[test]
fn test_update_with_null_condition() {
    let mut client = memory_client().unwrap();
    users(&mut client);
    client
        .insert("users", &["name", "age"], Some(vec!["a".into(), 20.into()]))
        .unwrap();
    client
        .insert(
            "users",
            &["name", "age", "email"],
            Some(vec!["b".into(), 20.into(), "b@example.com".into()]),
        )
        .unwrap();

    let filter = Filter::is_null("email").and(Filter::eq("age", 20));
    let updated = client
        .update("users", &["name", "age"], Some(vec!["z".into(), 21.into()]), Some(&filter))
        .unwrap();
    assert_eq!(updated, 1);
    assert_eq!(client.count("users", Some(&Filter::eq("name", "z"))).unwrap(), 1);
    assert_eq!(client.count("users", Some(&Filter::eq("age", 20))).unwrap(), 1);
}

#[test]
fn test_select_filter_order_and_pages() {
    let mut client = memory_client().unwrap();
    users(&mut client);
    for (name, age) in [("a", 10), ("b", 20), ("c", 30), ("d", 40)] {
        client
            .insert("users", &["name", "age"], Some(vec![name.into(), age.into()]))
            .unwrap();
    }

    let query = SelectQuery::from("users")
        .columns(&["name", "age"])
        .filter(Filter::gt("age", 10))
        .order_by(OrderBy::desc("age"))
        .skip(1)
        .take(2);
    let rows = client.select(&query).unwrap();
    let names: Vec<&SqlValue> = rows.column_values("name");
    assert_eq!(names, vec![&SqlValue::from("c"), &SqlValue::from("b")]);

    let all = client.select(&SelectQuery::from("users")).unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all.get(0, "NAME"), Some(&SqlValue::from("a")));
}

#[test]
fn test_insert_without_values_uses_nulls() {
    let mut client = memory_client().unwrap();
    client
        .add_table("t", vec![Column::integer("a"), Column::string("b")])
        .unwrap();
    client.insert("t", &["a", "b"], None).unwrap();
    assert!(client.exists("t", Some(&Filter::is_null("a"))).unwrap());
    assert!(!client.exists("t", Some(&Filter::is_not_null("b"))).unwrap());
}

#[test]
fn test_rename_table_and_column() {
    let mut client = memory_client().unwrap();
    client.add_table("rev", vec![Column::integer("a")]).unwrap();
    client.rename_table("rev", "revbar").unwrap();
    client.rename_column("revbar", "a", "b").unwrap();
    assert!(client.table_exists("revbar").unwrap());
    assert!(!client.table_exists("rev").unwrap());
    client.insert("revbar", &["b"], Some(vec![1.into()])).unwrap();
    assert!(client.exists("revbar", Some(&Filter::eq("b", 1))).unwrap());
}

#[test]
fn test_columns_indexes_and_unique_keys() {
    let mut client = memory_client().unwrap();
    client.add_table("t", vec![Column::integer("a")]).unwrap();
    client.add_column("t", &Column::string("b")).unwrap();
    client.add_index("ix_t_a", "t", &["a"]).unwrap();
    client.add_unique_key("uk_t_b", "t", &["b"]).unwrap();

    client.insert("t", &["a", "b"], Some(vec![1.into(), "x".into()])).unwrap();
    let duplicate = client
        .insert("t", &["a", "b"], Some(vec![2.into(), "x".into()]))
        .unwrap_err();
    assert!(matches!(duplicate, Error::SqlExecution { .. }));

    client.remove_unique_key("uk_t_b", "t").unwrap();
    client.remove_index("ix_t_a", "t").unwrap();
    client.insert("t", &["a", "b"], Some(vec![2.into(), "x".into()])).unwrap();
    client.remove_column("t", "b").unwrap();
    assert_eq!(client.count("t", None).unwrap(), 2);
}

#[test]
fn test_lenient_client_ignores_existing_table() {
    let mut client = connect(
        &SqliteOptions::memory(),
        None,
        ClientConfig::new().strict(false),
    )
    .unwrap();
    client.add_table("t", vec![Column::integer("a")]).unwrap();
    client.add_table("t", vec![Column::integer("a")]).unwrap();

    let mut strict = memory_client().unwrap();
    strict.add_table("t", vec![Column::integer("a")]).unwrap();
    let err = strict.add_table("t", vec![Column::integer("a")]).unwrap_err();
    assert!(err.is_already_exists());
}

#[test]
fn test_lenient_client_ignores_existing_columns_and_indexes() {
    let mut client = connect(
        &SqliteOptions::memory(),
        None,
        ClientConfig::new().strict(false),
    )
    .unwrap();
    client.add_table("t", vec![Column::integer("a")]).unwrap();
    for _ in 0..2 {
        client.add_column("t", &Column::integer("b")).unwrap();
        client.add_index("ix_t_a", "t", &["a"]).unwrap();
        client.add_unique_key("uk_t_b", "t", &["b"]).unwrap();
    }

    let mut strict = memory_client().unwrap();
    strict.add_table("t", vec![Column::integer("a")]).unwrap();
    strict.add_column("t", &Column::integer("b")).unwrap();
    strict.add_index("ix_t_a", "t", &["a"]).unwrap();
    strict.add_unique_key("uk_t_b", "t", &["b"]).unwrap();
    assert!(strict
        .add_column("t", &Column::integer("b"))
        .unwrap_err()
        .is_already_exists());
    assert!(strict
        .add_index("ix_t_a", "t", &["a"])
        .unwrap_err()
        .is_already_exists());
    assert!(strict
        .add_unique_key("uk_t_b", "t", &["b"])
        .unwrap_err()
        .is_already_exists());
}

#[test]
fn test_unique_key_with_default_schema() {
    let mut client = connect(
        &SqliteOptions::memory(),
        None,
        ClientConfig::new().default_schema("main"),
    )
    .unwrap();
    client.add_table("t", vec![Column::integer("a")]).unwrap();
    client.add_index("ix_t_a", "t", &["a"]).unwrap();
    client.add_unique_key("uk_t_a", "t", &["a"]).unwrap();

    client.insert("t", &["a"], Some(vec![1.into()])).unwrap();
    let err = client.insert("t", &["a"], Some(vec![1.into()])).unwrap_err();
    assert!(matches!(err, Error::SqlExecution { .. }));

    client.remove_unique_key("uk_t_a", "t").unwrap();
    client.insert("t", &["a"], Some(vec![1.into()])).unwrap();
}

#[test]
fn test_transaction_is_caller_controlled() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("app.db").display());
    let options = SqliteOptions::new(&url).transactional(true);

    let mut client = connect(&options, None, ClientConfig::default()).unwrap();
    client.add_table("t", vec![Column::integer("a")]).unwrap();
    client.commit().unwrap();
    client.insert("t", &["a"], Some(vec![1.into()])).unwrap();
    client.rollback().unwrap();
    client.insert("t", &["a"], Some(vec![2.into()])).unwrap();
    client.commit().unwrap();
    client.close().unwrap();

    let mut reopened = connect(&SqliteOptions::new(&url), None, ClientConfig::default()).unwrap();
    assert_eq!(reopened.count("t", None).unwrap(), 1);
    assert!(reopened.exists("t", Some(&Filter::eq("a", 2))).unwrap());
}

#[test]
fn test_failed_statement_reports_sql_and_parameters() {
    let mut client = memory_client().unwrap();
    let err = client
        .insert("missing", &["a"], Some(vec![5.into()]))
        .unwrap_err();
    match err {
        Error::SqlExecution { sql, parameters, .. } => {
            assert_eq!(sql, "INSERT INTO \"missing\" (\"a\") VALUES (?1)");
            assert_eq!(parameters[0].value(), Some(&SqlValue::Int(5)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unsupported_operations_fail_cleanly() {
    let mut client = memory_client().unwrap();
    client.add_table("t", vec![Column::integer("a")]).unwrap();
    assert!(matches!(
        client.modify_column("t", "a", &Column::string("a")),
        Err(Error::UnsupportedOperation { .. })
    ));
    assert!(matches!(
        client.add_foreign_key(&ForeignKey::new("fk", "t", "a", "u", "id")),
        Err(Error::UnsupportedOperation { .. })
    ));
}
