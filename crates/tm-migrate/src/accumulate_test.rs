use super::*;
use crate::hooks::ActionData;
use crate::precheck::{AllowAll, Precheck};
use crate::testing::{context, yaml, RecordingConnection};
use tm_core::{KeyKind, Operation, OperationType};

fn alter_payload(op: OperationType, text: &str) -> (AlterationKind, IndexMap<TableName, FieldRequests>) {
    match Operation::parse(op, &yaml(text)).unwrap() {
        Operation::Alter { kind, tables } => (kind, tables),
        other => panic!("unexpected operation {other:?}"),
    }
}

fn run(
    conn: &RecordingConnection,
    precheck: &dyn Precheck,
    op: OperationType,
    text: &str,
) -> IndexMap<TableName, tm_core::AlterationSet> {
    let (kind, tables) = alter_payload(op, text);
    let mut ctx = context(conn, false, precheck, None);
    accumulate(&mut ctx, kind, &tables).unwrap();
    ctx.take_alterations()
}

/// Vetoes every action on a field or index named `secret`.
struct DenySecret;

impl Precheck for DenySecret {
    fn before_action(&self, _conn: &dyn Connection, action: &Action) -> MigrateResult<bool> {
        let denied = match &action.data {
            ActionData::Field { field, .. } => field.as_str() == "secret",
            ActionData::Index { index, .. } => index.as_str() == "secret",
            _ => false,
        };
        Ok(!denied)
    }
}

#[test]
fn test_add_stores_definition_as_is() {
    let conn = RecordingConnection::new();
    let sets = run(
        &conn,
        &AllowAll,
        OperationType::CreateField,
        "users: {email: {type: string, length: 120}, indexes: {idx_email: {column: email}}}",
    );
    let set = &sets["users"];
    let email = &set.add.fields["email"];
    assert_eq!(email.type_name.as_deref(), Some("string"));
    assert_eq!(email.length, Some(Some(120)));
    assert!(set.add.indexes.contains_key("idx_email"));
    assert!(conn.executed().is_empty());
    assert_eq!(conn.calls(), vec!["list_indexes: users"]);
}

#[test]
fn test_drop_accepts_list_and_map_forms() {
    let conn = RecordingConnection::new();
    let sets = run(
        &conn,
        &AllowAll,
        OperationType::DropField,
        "users: [legacy, unused]\nposts: {draft: ~, indexes: [idx_draft]}",
    );
    let users: Vec<&str> = sets["users"].drop.fields.iter().map(|f| f.as_str()).collect();
    assert_eq!(users, vec!["legacy", "unused"]);
    assert!(sets["posts"].drop.fields.contains("draft"));
    assert!(sets["posts"].drop.indexes.contains("idx_draft"));
}

#[test]
fn test_change_without_type_merges_over_current() {
    let conn = RecordingConnection::new().with_columns(
        "users",
        "email: {type: string, length: 255, null: false, comment: login}",
    );
    let sets = run(
        &conn,
        &AllowAll,
        OperationType::AlterField,
        "users: {email: {null: true}}",
    );
    let email = &sets["users"].change.fields["email"];
    assert_eq!(email.type_name.as_deref(), Some("string"));
    assert_eq!(email.length, Some(Some(255)));
    assert_eq!(email.null, Some(true));
    assert_eq!(email.comment.as_deref(), Some("login"));
}

#[test]
fn test_change_with_same_type_merges() {
    let conn = RecordingConnection::new()
        .with_columns("users", "email: {type: string, length: 255, null: false}");
    let sets = run(
        &conn,
        &AllowAll,
        OperationType::AlterField,
        "users: {email: {type: STRING, length: 320}}",
    );
    let email = &sets["users"].change.fields["email"];
    assert_eq!(email.length, Some(Some(320)));
    assert_eq!(email.null, Some(false));
}

#[test]
fn test_change_with_new_type_replaces_definition() {
    let conn = RecordingConnection::new()
        .with_columns("users", "age: {type: string, length: 3, null: false}");
    let sets = run(
        &conn,
        &AllowAll,
        OperationType::AlterField,
        "users: {age: {type: integer}}",
    );
    assert_eq!(sets["users"].change.fields["age"], FieldDef::of_type("integer"));
}

#[test]
fn test_change_to_date_clears_stored_length() {
    let conn = RecordingConnection::new()
        .with_columns("events", "happened: {type: date, length: 10, null: true}");
    let sets = run(
        &conn,
        &AllowAll,
        OperationType::AlterField,
        "events: {happened: {type: date}}",
    );
    let happened = &sets["events"].change.fields["happened"];
    assert_eq!(happened.type_name.as_deref(), Some("date"));
    assert_eq!(happened.length, None);
    assert_eq!(happened.null, Some(true));
}

#[test]
fn test_changed_definition_temporal_rules() {
    let current = FieldDef {
        type_name: Some("datetime".into()),
        length: Some(Some(19)),
        ..Default::default()
    };
    let merged = changed_definition(&FieldDef::default(), Some(&current));
    assert_eq!(merged.length, None);

    let requested = FieldDef {
        type_name: Some("timestamp".into()),
        length: Some(Some(6)),
        ..Default::default()
    };
    assert_eq!(changed_definition(&requested, None).length, None);

    let requested = FieldDef {
        type_name: Some("string".into()),
        length: Some(Some(10)),
        ..Default::default()
    };
    assert_eq!(changed_definition(&requested, Some(&current)).length, Some(Some(10)));
}

#[test]
fn test_rename_starts_from_current_definition() {
    let conn = RecordingConnection::new()
        .with_columns("users", "name: {type: string, length: 80, key: unique}");
    let sets = run(
        &conn,
        &AllowAll,
        OperationType::RenameField,
        "users: {name: full_name, nickname: alias}",
    );
    let change = &sets["users"].change.fields;

    let name = &change["name"];
    assert_eq!(name.name.as_ref().map(|n| n.as_str()), Some("full_name"));
    assert_eq!(name.length, Some(Some(80)));
    assert_eq!(name.key, Some(KeyKind::Unique));

    let nickname = &change["nickname"];
    assert_eq!(nickname.name.as_ref().map(|n| n.as_str()), Some("alias"));
    assert!(nickname.type_name.is_none());
}

#[test]
fn test_describe_once_per_table() {
    let conn = RecordingConnection::new()
        .with_columns("users", "a: {type: integer}\nb: {type: integer}\nc: {type: integer}");
    run(
        &conn,
        &AllowAll,
        OperationType::AlterField,
        "users: {a: {null: true}, b: {null: true}, c: {null: true}}",
    );
    let describes = conn
        .calls()
        .iter()
        .filter(|c| c.starts_with("describe_table"))
        .count();
    assert_eq!(describes, 1);
}

#[test]
fn test_precheck_veto_excludes_only_that_field() {
    let conn = RecordingConnection::new();
    let sets = run(
        &conn,
        &DenySecret,
        OperationType::CreateField,
        "users: {x: {type: integer}, secret: {type: string}, z: {type: integer}}",
    );
    let fields: Vec<&str> = sets["users"].add.fields.keys().map(|f| f.as_str()).collect();
    assert_eq!(fields, vec!["x", "z"]);
}

#[test]
fn test_precheck_veto_excludes_only_that_index() {
    let conn = RecordingConnection::new();
    let sets = run(
        &conn,
        &DenySecret,
        OperationType::DropField,
        "users: {indexes: [secret, idx_public]}",
    );
    let indexes: Vec<&str> = sets["users"].drop.indexes.iter().map(|i| i.as_str()).collect();
    assert_eq!(indexes, vec!["idx_public"]);
}

#[test]
fn test_index_rename_becomes_drop_and_add() {
    let conn = RecordingConnection::new();
    conn.setup("CREATE TABLE users (id INTEGER, email VARCHAR); CREATE UNIQUE INDEX idx_mail ON users (email);");
    let sets = run(
        &conn,
        &AllowAll,
        OperationType::RenameField,
        "users: {indexes: {idx_mail: idx_users_email}}",
    );
    let set = &sets["users"];
    assert!(set.drop.indexes.contains("idx_mail"));
    let added = &set.add.indexes["idx_users_email"];
    assert!(added.unique);
    assert_eq!(added.column, vec![FieldName::new("email")]);
}

#[test]
fn test_index_rename_of_missing_index_fails() {
    let conn = RecordingConnection::new();
    conn.setup("CREATE TABLE users (id INTEGER)");
    let (kind, tables) = alter_payload(
        OperationType::RenameField,
        "users: {indexes: {idx_ghost: idx_spirit}}",
    );
    let mut ctx = context(&conn, false, &AllowAll, None);
    let err = accumulate(&mut ctx, kind, &tables).unwrap_err();
    assert!(err.to_string().contains("idx_ghost"));
}

#[test]
fn test_change_on_missing_table_is_introspection_error() {
    let conn = RecordingConnection::new();
    let (kind, tables) = alter_payload(OperationType::AlterField, "ghost: {a: {null: true}}");
    let mut ctx = context(&conn, false, &AllowAll, None);
    let err = accumulate(&mut ctx, kind, &tables).unwrap_err();
    assert!(matches!(err, MigrateError::Introspection(_)));
}

#[test]
fn test_repeated_calls_share_one_set_per_table() {
    let conn = RecordingConnection::new();
    let mut ctx = context(&conn, false, &AllowAll, None);
    let (kind, tables) = alter_payload(OperationType::CreateField, "users: {a: {type: integer}}");
    accumulate(&mut ctx, kind, &tables).unwrap();
    let (kind, tables) = alter_payload(OperationType::DropField, "users: [b]");
    accumulate(&mut ctx, kind, &tables).unwrap();

    let sets = ctx.alterations();
    assert_eq!(sets.len(), 1);
    assert_eq!(sets["users"].len(), 2);
}

#[test]
fn test_explicit_null_clears_current_attributes() {
    let current = FieldDef {
        type_name: Some("string".into()),
        length: Some(Some(64)),
        default_expr: Some("'x'".into()),
        ..Default::default()
    };
    let requested = FieldDef::from_value(&yaml("{length: ~, default: ~}")).unwrap();

    let def = changed_definition(&requested, Some(&current));
    assert_eq!(def.type_name.as_deref(), Some("string"));
    assert_eq!(def.length, Some(None));
    assert_eq!(def.default, Some(serde_yaml::Value::Null));
    assert_eq!(def.default_expr, None);
}

#[test]
fn test_change_reads_columns_and_indexes_once() {
    let conn = RecordingConnection::new();
    conn.setup(
        "CREATE TABLE users (id INTEGER, name VARCHAR, email VARCHAR); \
         CREATE INDEX idx_email ON users (email);",
    );
    let sets = run(
        &conn,
        &AllowAll,
        OperationType::AlterField,
        "users: {name: {null: true}, email: {null: true}}",
    );
    let existing = sets["users"].existing_indexes.as_ref().unwrap();
    assert_eq!(existing["idx_email"].column, vec![FieldName::new("email")]);
    assert_eq!(
        conn.calls(),
        vec!["list_indexes: users", "describe_table: users"]
    );
}

#[test]
fn test_vetoed_entries_read_nothing() {
    let conn = RecordingConnection::new();
    let sets = run(
        &conn,
        &DenySecret,
        OperationType::CreateField,
        "users: {secret: {type: string}}",
    );
    assert!(sets["users"].is_empty());
    assert!(sets["users"].existing_indexes.is_none());
    assert!(conn.calls().is_empty());
}
