//! End-to-end tests against an in-memory SQLite database.

use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use sqlbridge_adapter::{AdapterError, AdapterSettings, SqliteAdapter};
use sqlbridge_core::query::{Filter, OrderBy, Where};
use sqlbridge_core::{ModelSchema, PropertyDescriptor, QueryError, Record, Value};

fn user() -> ModelSchema {
    ModelSchema::new("User")
        .property("name", PropertyDescriptor::string())
        .property("age", PropertyDescriptor::number().indexed())
}

async fn setup(models: Vec<ModelSchema>) -> SqliteAdapter {
    SqliteAdapter::initialize(AdapterSettings::default(), models)
        .await
        .expect("Failed to open in-memory adapter")
}

async fn seed(adapter: &SqliteAdapter) {
    for (name, age) in [("Alice", 30), ("Bob", 45), ("Carol", 22), ("Dave", 61)] {
        adapter
            .create("User", &Record::new().with("name", name).with("age", age))
            .await
            .unwrap();
    }
}

fn names(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| r.get("name").and_then(Value::as_str).map(String::from))
        .collect()
}

#[tokio::test]
async fn test_initialize_creates_tables_and_indexes() {
    let adapter = setup(vec![user()]).await;
    let (columns, indexes) = adapter.introspect(adapter.model("User").unwrap()).await.unwrap();

    let column_names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(column_names, vec!["id", "name", "age"]);
    assert!(columns[0].primary_key);
    assert_eq!(columns[1].sql_type, "VARCHAR(255)");
    assert!(indexes.iter().any(|i| i.name == "User_age" && !i.unique));
    assert!(adapter.is_actual().await.unwrap());
}

#[tokio::test]
async fn test_create_and_find() {
    let adapter = setup(vec![user()]).await;
    let id = adapter
        .create("User", &Record::new().with("name", "Alice").with("age", 30))
        .await
        .unwrap();
    assert_eq!(id, 1);

    let alice = adapter.find_by_id("User", id).await.unwrap().unwrap();
    assert_eq!(alice.id(), Some(1));
    assert_eq!(alice.get("name"), Some(&Value::Text("Alice".into())));
    assert_eq!(alice.get("age"), Some(&Value::Int(30)));

    assert!(adapter.exists("User", id).await.unwrap());
    assert!(!adapter.exists("User", 99).await.unwrap());
    assert!(adapter.find_by_id("User", 99).await.unwrap().is_none());
}

#[tokio::test]
async fn test_all_with_between_order_and_limit() {
    let adapter = setup(vec![user()]).await;
    seed(&adapter).await;

    let filter = Filter::new().where_clause(Where::new().between("age", 20, 40));
    let mut found = names(&adapter.all("User", &filter).await.unwrap());
    found.sort();
    assert_eq!(found, vec!["Alice", "Carol"]);

    let filter = Filter::new()
        .order_by(OrderBy::desc("age"))
        .limit(2)
        .offset(1);
    assert_eq!(names(&adapter.all("User", &filter).await.unwrap()), vec!["Bob", "Alice"]);

    let filter = Filter::new().order_by(OrderBy::asc("name")).offset(3);
    assert_eq!(names(&adapter.all("User", &filter).await.unwrap()), vec!["Dave"]);
}

#[tokio::test]
async fn test_json_filter() {
    let adapter = setup(vec![user()]).await;
    seed(&adapter).await;

    let filter = Filter::try_from(&json!({
        "where": {"or": [{"name": "Alice"}, {"age": {"gt": 50}}]},
        "order": "name",
    }))
    .unwrap();
    assert_eq!(names(&adapter.all("User", &filter).await.unwrap()), vec!["Alice", "Dave"]);

    let filter = Filter::try_from(&json!({"where": {"name": "/^[BC]/"}, "order": "-name"})).unwrap();
    assert_eq!(names(&adapter.all("User", &filter).await.unwrap()), vec!["Carol", "Bob"]);

    let filter = Filter::try_from(&json!({"where": {"age": {"inq": []}}})).unwrap();
    assert!(adapter.all("User", &filter).await.unwrap().is_empty());
    let filter = Filter::try_from(&json!({"where": {"age": {"nin": []}}})).unwrap();
    assert_eq!(adapter.all("User", &filter).await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_hostile_values_are_stored_verbatim() {
    let adapter = setup(vec![user()]).await;
    let name = "Robert'); DROP TABLE `User`; --";
    adapter
        .create("User", &Record::new().with("name", name).with("age", 1))
        .await
        .unwrap();
    let tree = Where::new().eq("name", name);
    assert_eq!(adapter.count("User", Some(&tree)).await.unwrap(), 1);
    adapter
        .save("User", &Record::new().with("id", 1).with("name", "x'y\"z"))
        .await
        .unwrap();
    let found = adapter.find_by_id("User", 1).await.unwrap().unwrap();
    assert_eq!(found.get("name"), Some(&Value::Text("x'y\"z".into())));
}

#[tokio::test]
async fn test_types_round_trip() {
    let event = ModelSchema::new("Event")
        .property("title", PropertyDescriptor::text())
        .property("at", PropertyDescriptor::date())
        .property("done", PropertyDescriptor::boolean())
        .property("meta", PropertyDescriptor::json());
    let adapter = setup(vec![event]).await;

    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 45).unwrap();
    let meta = json!({"tags": ["a", "b"], "n": 1});
    let id = adapter
        .create(
            "Event",
            &Record::new()
                .with("title", "launch")
                .with("at", at + Duration::milliseconds(250))
                .with("done", true)
                .with("meta", meta.clone()),
        )
        .await
        .unwrap();

    let found = adapter.find_by_id("Event", id).await.unwrap().unwrap();
    assert_eq!(found.get("at"), Some(&Value::Date(at)));
    assert_eq!(found.get("done"), Some(&Value::Bool(true)));
    assert_eq!(found.get("meta"), Some(&Value::Json(meta)));

    let tree = Where::new().between(
        "at",
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap(),
    );
    assert_eq!(adapter.count("Event", Some(&tree)).await.unwrap(), 1);
    let tree = Where::new().eq("done", false);
    assert_eq!(adapter.count("Event", Some(&tree)).await.unwrap(), 0);
}

#[tokio::test]
async fn test_update_and_delete() {
    let adapter = setup(vec![user()]).await;
    seed(&adapter).await;

    adapter
        .update_attributes("User", 2, Record::new().with("age", 46))
        .await
        .unwrap();
    let bob = adapter.find_by_id("User", 2).await.unwrap().unwrap();
    assert_eq!(bob.get("age"), Some(&Value::Int(46)));

    let replaced = adapter
        .update_or_create("User", Record::new().with("id", 2).with("name", "Robert").with("age", 47))
        .await
        .unwrap();
    assert_eq!(replaced.id(), Some(2));
    let created = adapter
        .update_or_create("User", Record::new().with("name", "Erin").with("age", 19))
        .await
        .unwrap();
    assert_eq!(created.id(), Some(5));
    assert_eq!(adapter.count("User", None).await.unwrap(), 5);

    let err = adapter.remove("User", None).await.unwrap_err();
    assert!(matches!(err, AdapterError::Query(QueryError::MissingWhere)));

    let removed = adapter
        .remove("User", Some(&Where::new().lt("age", 25)))
        .await
        .unwrap();
    assert_eq!(removed, 2);
    assert!(adapter.destroy("User", 1).await.unwrap());
    assert!(!adapter.destroy("User", 1).await.unwrap());
    assert_eq!(adapter.destroy_all("User").await.unwrap(), 2);
    assert_eq!(adapter.count("User", None).await.unwrap(), 0);
}

#[tokio::test]
async fn test_autoupdate_keeps_data() {
    let mut adapter = setup(vec![user()]).await;
    seed(&adapter).await;

    adapter.define(
        ModelSchema::new("User")
            .property("name", PropertyDescriptor::string().unique())
            .property("email", PropertyDescriptor::string().limit(100)),
    );
    assert!(!adapter.is_actual().await.unwrap());
    let plan = adapter.plan().await.unwrap();
    assert_eq!(plan.len(), 1);
    assert!(plan[0]
        .statements
        .contains(&String::from("ALTER TABLE `User` ADD COLUMN `email` VARCHAR(100) NULL")));

    adapter.autoupdate().await.unwrap();
    assert!(adapter.is_actual().await.unwrap());

    let (columns, indexes) = adapter.introspect(adapter.model("User").unwrap()).await.unwrap();
    let column_names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(column_names, vec!["id", "name", "email"]);
    assert!(indexes.iter().any(|i| i.name == "User_name" && i.unique));
    assert!(!indexes.iter().any(|i| i.name == "User_age"));

    let alice = adapter.find_by_id("User", 1).await.unwrap().unwrap();
    assert_eq!(alice.get("name"), Some(&Value::Text("Alice".into())));
    assert_eq!(alice.get("email"), Some(&Value::Null));
}

#[tokio::test]
async fn test_autoupdate_rebuilds_changed_columns() {
    let mut adapter = setup(vec![user()]).await;
    seed(&adapter).await;

    adapter
        .define_property("User", "age", PropertyDescriptor::string().limit(8).indexed())
        .unwrap();
    adapter
        .define_property("User", "name", PropertyDescriptor::string().not_null())
        .unwrap();
    adapter.autoupdate().await.unwrap();
    assert!(adapter.is_actual().await.unwrap());

    let (columns, _) = adapter.introspect(adapter.model("User").unwrap()).await.unwrap();
    assert_eq!(columns[1].sql_type, "VARCHAR(255)");
    assert!(!columns[1].nullable);
    assert_eq!(columns[2].sql_type, "VARCHAR(8)");
    assert_eq!(adapter.count("User", None).await.unwrap(), 4);

    let id = adapter
        .create("User", &Record::new().with("name", "Erin").with("age", "19"))
        .await
        .unwrap();
    assert_eq!(id, 5);
}

#[tokio::test]
async fn test_failed_model_does_not_stop_the_batch() {
    let mut adapter = setup(vec![user()]).await;
    adapter.define(ModelSchema::new("Broken").table("sqlite_master"));

    let err = adapter.automigrate().await.unwrap_err();
    match err {
        AdapterError::Migration(failures) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].model, "Broken");
        }
        other => panic!("unexpected error: {other}"),
    }
    // The healthy model was still recreated.
    let (columns, _) = adapter.introspect(adapter.model("User").unwrap()).await.unwrap();
    assert_eq!(columns.len(), 3);
}

#[tokio::test]
async fn test_file_database_is_not_migrated_on_startup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("startup.sqlite3");

    let settings = AdapterSettings::new(path.to_string_lossy());
    let adapter = SqliteAdapter::initialize(settings, [user()]).await.unwrap();
    assert!(!adapter.is_actual().await.unwrap());
    adapter.autoupdate().await.unwrap();
    assert!(adapter.is_actual().await.unwrap());
    adapter.disconnect().await;
    assert!(path.exists());
}
