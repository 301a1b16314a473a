//! Rendering tests for the qb module.

use crate::qb::{Placeholder, SqlQb, delete, insert, select, update};
use crate::value::Value;

#[test]
fn test_select_all() {
    let stmt = select("persons").build().unwrap();
    assert_eq!(stmt.sql, "SELECT * FROM persons");
    assert!(stmt.params.is_empty());
}

#[test]
fn test_select_by_key_each_dialect() {
    let expected = [
        (Placeholder::Question, "SELECT * FROM persons WHERE id = ?"),
        (Placeholder::Dollar, "SELECT * FROM persons WHERE id = $1"),
        (Placeholder::Colon, "SELECT * FROM persons WHERE id = :1"),
        (Placeholder::AtP, "SELECT * FROM persons WHERE id = @p1"),
    ];
    for (placeholder, sql) in expected {
        let stmt = select("persons")
            .placeholder(placeholder)
            .eq("id", 1_i64)
            .build()
            .unwrap();
        assert_eq!(stmt.sql, sql);
        assert_eq!(stmt.params, vec![Value::Int(1)]);
    }
}

#[test]
fn test_insert_keeps_column_order() {
    let stmt = insert("persons")
        .placeholder(Placeholder::Dollar)
        .set("id", 1_i64)
        .set("name", "Joe")
        .build()
        .unwrap();
    assert_eq!(stmt.sql, "INSERT INTO persons (id, name) VALUES ($1, $2)");
    assert_eq!(stmt.params, vec![Value::Int(1), Value::from("Joe")]);
}

#[test]
fn test_insert_question_marks() {
    let stmt = insert("persons")
        .set("id", 1_i64)
        .set("name", "Joe")
        .build()
        .unwrap();
    assert_eq!(stmt.sql, "INSERT INTO persons (id, name) VALUES (?, ?)");
}

#[test]
fn test_insert_without_columns_fails() {
    let err = insert("persons").build().unwrap_err();
    assert!(err.is_query_build());
}

#[test]
fn test_insert_without_columns_can_use_default_values() {
    let stmt = insert("persons").or_default_values().build().unwrap();
    assert_eq!(stmt.sql, "INSERT INTO persons DEFAULT VALUES");
    assert!(stmt.params.is_empty());

    let stmt = insert("persons")
        .or_default_values()
        .set("name", "Joe")
        .build()
        .unwrap();
    assert_eq!(stmt.sql, "INSERT INTO persons (name) VALUES (?)");
}

#[test]
fn test_insert_duplicate_column_fails() {
    let err = insert("persons")
        .set("name", "a")
        .set("name", "b")
        .build()
        .unwrap_err();
    assert!(err.is_query_build());
}

#[test]
fn test_update_numbers_set_before_where() {
    let stmt = update("persons")
        .placeholder(Placeholder::AtP)
        .set("name", "foo")
        .set("age", 30_i32)
        .eq("id", 1_i64)
        .build()
        .unwrap();
    assert_eq!(
        stmt.sql,
        "UPDATE persons SET name = @p1, age = @p2 WHERE id = @p3"
    );
    assert_eq!(
        stmt.params,
        vec![Value::from("foo"), Value::Int(30), Value::Int(1)]
    );
}

#[test]
fn test_update_requires_set_and_where() {
    assert!(update("persons").eq("id", 1_i64).build().unwrap_err().is_query_build());
    assert!(update("persons").set("name", "x").build().unwrap_err().is_query_build());
}

#[test]
fn test_delete_by_key() {
    let stmt = delete("persons")
        .placeholder(Placeholder::Colon)
        .eq("id", 7_i64)
        .build()
        .unwrap();
    assert_eq!(stmt.sql, "DELETE FROM persons WHERE id = :1");
    assert_eq!(stmt.params, vec![Value::Int(7)]);
}

#[test]
fn test_delete_without_where_fails() {
    let err = delete("persons").build().unwrap_err();
    assert!(err.is_query_build());
}

#[test]
fn test_null_predicate_renders_is_null() {
    let stmt = select("persons")
        .placeholder(Placeholder::Dollar)
        .eq("name", Value::Null)
        .eq("id", 2_i64)
        .build()
        .unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT * FROM persons WHERE name IS NULL AND id = $1"
    );
    assert_eq!(stmt.params, vec![Value::Int(2)]);
}

#[test]
fn test_rejects_unsafe_identifiers() {
    assert!(select("persons; DROP TABLE persons").build().is_err());
    assert!(insert("persons").set("name) VALUES (1); --", 1_i64).build().is_err());
    assert!(update("persons").set("name", "x").eq("id = 1 OR 1", 1_i64).build().is_err());
}

#[test]
fn test_schema_qualified_table() {
    let stmt = select("public.persons").build().unwrap();
    assert_eq!(stmt.sql, "SELECT * FROM public.persons");
}

#[test]
fn test_to_sql_reports_build_errors() {
    assert_eq!(delete("t").eq("id", 1_i64).to_sql(), "DELETE FROM t WHERE id = ?");
    assert!(delete("t").to_sql().starts_with("<Query build error"));
}

#[test]
fn test_statement_display_lists_params() {
    let stmt = update("persons")
        .placeholder(Placeholder::Dollar)
        .set("name", "foo")
        .eq("id", 1_i64)
        .build()
        .unwrap();
    assert_eq!(
        stmt.to_string(),
        r#"UPDATE persons SET name = $1 WHERE id = $2 -- ["foo", 1]"#
    );
}
