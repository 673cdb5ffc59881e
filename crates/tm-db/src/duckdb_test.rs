use super::*;
use crate::builder::DuckDbSchemaBuilder;
use crate::traits::SchemaBuilder;
use tm_core::TableDef;

fn users_def() -> TableDef {
    let yaml: serde_yaml::Value = serde_yaml::from_str(
        r#"
id: {type: integer, key: primary}
email: {type: string, length: 255, null: false}
status: {type: string, default: active}
tableParameters: {comment: Registered users}
"#,
    )
    .unwrap();
    TableDef::from_value("create_table", &yaml).unwrap()
}

fn db_with_users() -> DuckDbConnection {
    let db = DuckDbConnection::in_memory().unwrap();
    let sql = DuckDbSchemaBuilder.build_create_sql(&TableName::new("users"), &users_def());
    db.execute(&sql).unwrap();
    db
}

#[test]
fn test_in_memory() {
    let db = DuckDbConnection::in_memory().unwrap();
    assert_eq!(db.db_type(), "duckdb");
}

#[test]
fn test_new_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.duckdb");
    let db = DuckDbConnection::new(path.to_str().unwrap()).unwrap();
    db.execute("CREATE TABLE t (id INTEGER)").unwrap();
    assert!(db.table_exists(&TableName::new("t")).unwrap());
}

#[test]
fn test_execute_batch() {
    let db = DuckDbConnection::in_memory().unwrap();
    db.execute("CREATE TABLE t1 (id INT); CREATE TABLE t2 (id INT);")
        .unwrap();
    assert_eq!(
        db.list_tables().unwrap(),
        vec![TableName::new("t1"), TableName::new("t2")]
    );
}

#[test]
fn test_execute_error_mentions_table() {
    let db = DuckDbConnection::in_memory().unwrap();
    let err = db.execute("DROP TABLE missing").unwrap_err();
    assert!(err.to_string().contains("missing"));
}

#[test]
fn test_table_exists() {
    let db = db_with_users();
    assert!(db.table_exists(&TableName::new("users")).unwrap());
    assert!(!db.table_exists(&TableName::new("nonexistent")).unwrap());
}

#[test]
fn test_schema_qualified_tables() {
    let db = DuckDbConnection::in_memory().unwrap();
    db.execute("CREATE SCHEMA staging; CREATE TABLE staging.events (id INTEGER);")
        .unwrap();
    let table = TableName::new("staging.events");
    assert!(db.table_exists(&table).unwrap());
    assert!(db.list_tables().unwrap().contains(&table));
    assert_eq!(db.quote_table(&table), "\"staging\".\"events\"");
}

#[test]
fn test_describe_table() {
    let db = db_with_users();
    let fields = db.describe_table(&TableName::new("users")).unwrap();

    let names: Vec<&str> = fields.keys().map(|f| f.as_str()).collect();
    assert_eq!(names, vec!["id", "email", "status"]);

    let id = &fields["id"];
    assert_eq!(id.type_name.as_deref(), Some("integer"));
    assert_eq!(id.key, Some(KeyKind::Primary));
    assert_eq!(id.null, Some(false));

    let email = &fields["email"];
    assert_eq!(email.type_name.as_deref(), Some("string"));
    assert_eq!(email.null, Some(false));

    let status = &fields["status"];
    assert_eq!(status.null, Some(true));
    assert!(status.default.is_none());
    assert!(status
        .default_expr
        .as_deref()
        .is_some_and(|d| d.contains("active")));
}

#[test]
fn test_describe_missing_table() {
    let db = DuckDbConnection::in_memory().unwrap();
    let err = db.describe_table(&TableName::new("ghost")).unwrap_err();
    assert!(matches!(err, DbError::TableNotFound(_)));
}

#[test]
fn test_list_indexes() {
    let db = db_with_users();
    db.execute("CREATE UNIQUE INDEX idx_users_email ON users (email);")
        .unwrap();

    let indexes = db.list_indexes(&TableName::new("users")).unwrap();
    let primary = &indexes[PRIMARY_INDEX];
    assert_eq!(primary.column, vec![FieldName::new("id")]);

    let email = &indexes["idx_users_email"];
    assert!(email.unique);
    assert_eq!(email.column, vec![FieldName::new("email")]);
}

#[test]
fn test_read_table_parameters() {
    let db = db_with_users();
    let params = db.read_table_parameters(&TableName::new("users")).unwrap();
    assert_eq!(params.comment.as_deref(), Some("Registered users"));

    let err = db
        .read_table_parameters(&TableName::new("ghost"))
        .unwrap_err();
    assert!(matches!(err, DbError::TableNotFound(_)));
}

#[test]
fn test_transaction_rollback_discards_ddl() {
    let db = DuckDbConnection::in_memory().unwrap();
    db.begin().unwrap();
    db.execute("CREATE TABLE scratch (id INTEGER)").unwrap();
    db.rollback().unwrap();
    assert!(!db.table_exists(&TableName::new("scratch")).unwrap());
}

#[test]
fn test_transaction_commit_keeps_ddl() {
    let db = DuckDbConnection::in_memory().unwrap();
    db.begin().unwrap();
    db.execute("CREATE TABLE kept (id INTEGER)").unwrap();
    db.commit().unwrap();
    assert!(db.table_exists(&TableName::new("kept")).unwrap());
}

#[test]
fn test_commit_without_transaction_fails() {
    let db = DuckDbConnection::in_memory().unwrap();
    let err = db.commit().unwrap_err();
    assert!(matches!(err, DbError::TransactionError { .. }));
}

#[test]
fn test_index_columns_parsing() {
    assert_eq!(
        index_columns("CREATE INDEX idx ON t(\"a\", b);"),
        vec![FieldName::new("a"), FieldName::new("b")]
    );
    assert!(index_columns("CREATE INDEX idx").is_empty());
}
