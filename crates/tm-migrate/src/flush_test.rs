use super::*;
use crate::error::MigrateError;
use crate::hooks::Callback;
use crate::precheck::AllowAll;
use crate::testing::{context, RecordingCallback, RecordingConnection};
use tm_core::{FieldDef, FieldName, IndexDef, IndexName};
use tm_db::Connection;

fn sample_set() -> AlterationSet {
    let mut set = AlterationSet::default();
    set.add
        .fields
        .insert(FieldName::new("email"), FieldDef::of_type("string"));
    set.add
        .indexes
        .insert(IndexName::new("idx_email"), IndexDef::on(["email"]));
    set.drop.fields.insert(FieldName::new("legacy"));
    set.change.fields.insert(
        FieldName::new("name"),
        FieldDef {
            name: Some(FieldName::new("full_name")),
            ..FieldDef::of_type("string")
        },
    );
    set.change.fields.insert(
        FieldName::new("age"),
        FieldDef {
            name: Some(FieldName::new("age")),
            ..FieldDef::of_type("integer")
        },
    );
    set
}

#[test]
fn test_flush_actions_grouping() {
    let actions: Vec<String> = flush_actions(&TableName::new("users"), &sample_set())
        .iter()
        .map(|a| a.to_string())
        .collect();
    assert_eq!(
        actions,
        vec![
            "add_index users.idx_email",
            "add_field users.email",
            "drop_field users.legacy",
            "rename_field users.name -> full_name",
            "change_field users.age",
        ]
    );
}

#[test]
fn test_flush_one_statement_per_table() {
    let conn = RecordingConnection::new();
    conn.setup(
        "CREATE TABLE users (id INTEGER, legacy VARCHAR, name VARCHAR); \
         CREATE TABLE posts (id INTEGER);",
    );
    let mut ctx = context(&conn, false, &AllowAll, None);

    let users = ctx.alterations_for(&TableName::new("users"));
    users.drop.fields.insert(FieldName::new("legacy"));
    users
        .add
        .fields
        .insert(FieldName::new("email"), FieldDef::of_type("string"));
    users.add.fields.insert(FieldName::new("age"), FieldDef::of_type("integer"));
    ctx.alterations_for(&TableName::new("posts"))
        .add
        .fields
        .insert(FieldName::new("title"), FieldDef::of_type("text"));

    flush(&mut ctx).unwrap();

    let executed = conn.executed();
    assert_eq!(executed.len(), 2);
    assert!(executed[0].contains("\"users\""));
    assert!(executed[0].contains("\"legacy\""));
    assert!(executed[0].contains("\"email\""));
    assert!(executed[0].contains("\"age\""));
    assert!(executed[1].contains("\"posts\""));
    assert!(ctx.alterations().is_empty());

    let columns = conn.inner().describe_table(&TableName::new("users")).unwrap();
    let names: Vec<&str> = columns.keys().map(|c| c.as_str()).collect();
    assert_eq!(names, vec!["id", "name", "email", "age"]);
}

#[test]
fn test_flush_notifies_around_execution() {
    let conn = RecordingConnection::new();
    conn.setup("CREATE TABLE users (id INTEGER, name VARCHAR)");
    let callback = RecordingCallback::default();
    let mut ctx = context(&conn, false, &AllowAll, Some(&callback as &dyn Callback));

    let users = ctx.alterations_for(&TableName::new("users"));
    users
        .add
        .fields
        .insert(FieldName::new("email"), FieldDef::of_type("string"));
    users.change.fields.insert(
        FieldName::new("name"),
        FieldDef {
            name: Some(FieldName::new("full_name")),
            ..FieldDef::of_type("string")
        },
    );

    flush(&mut ctx).unwrap();

    assert_eq!(
        callback.events(),
        vec![
            "before add_field users.email",
            "before rename_field users.name -> full_name",
            "after add_field users.email",
            "after rename_field users.name -> full_name",
        ]
    );
}

#[test]
fn test_flush_dry_run_logs_without_executing() {
    let conn = RecordingConnection::new();
    let callback = RecordingCallback::default();
    let mut ctx = context(&conn, true, &AllowAll, Some(&callback as &dyn Callback));
    *ctx.alterations_for(&TableName::new("users")) = sample_set();

    flush(&mut ctx).unwrap();

    assert_eq!(ctx.log().len(), 1);
    assert!(ctx.log()[0].contains("ALTER TABLE \"users\""));
    assert!(conn.calls().is_empty());
    assert!(callback.events().is_empty());
}

#[test]
fn test_flush_skips_empty_sets() {
    let conn = RecordingConnection::new();
    let mut ctx = context(&conn, false, &AllowAll, None);
    ctx.alterations_for(&TableName::new("users"));

    flush(&mut ctx).unwrap();
    assert!(conn.executed().is_empty());
}

#[test]
fn test_flush_failure_stops_remaining_tables() {
    let conn = RecordingConnection::new().failing_on("\"first\"");
    let callback = RecordingCallback::default();
    let mut ctx = context(&conn, false, &AllowAll, Some(&callback as &dyn Callback));
    ctx.alterations_for(&TableName::new("first"))
        .drop
        .fields
        .insert(FieldName::new("a"));
    ctx.alterations_for(&TableName::new("second"))
        .drop
        .fields
        .insert(FieldName::new("b"));

    let err = flush(&mut ctx).unwrap_err();
    assert!(matches!(err, MigrateError::SqlExecution { .. }));
    assert_eq!(conn.executed().len(), 1);
    assert_eq!(callback.events(), vec!["before drop_field first.a"]);
}
