//! The adapter façade: model registry and CRUD.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Instant;

use sqlbridge_core::marshal::from_storage_row;
use sqlbridge_core::query::{Filter, Where};
use sqlbridge_core::value::{row_value, SqlValue, StoredRow};
use sqlbridge_core::{ModelSchema, PropertyDescriptor, QueryBuilder, Record, SqlDialect};
use sqlbridge_sqlite::SqliteDialect;
use tracing::debug;

use crate::driver::{Driver, RunResult, SqliteDriver};
use crate::error::{AdapterError, Result};
use crate::settings::AdapterSettings;

/// An ORM adapter: a set of registered models, a dialect to render them
/// and a driver to run the statements.
///
/// Every call issues its statements one at a time but independent calls
/// are not serialized against each other.
#[derive(Debug)]
pub struct Adapter<R, D> {
    pub(crate) driver: R,
    pub(crate) dialect: D,
    pub(crate) settings: AdapterSettings,
    pub(crate) models: BTreeMap<String, ModelSchema>,
}

/// The adapter over SQLite.
pub type SqliteAdapter = Adapter<SqliteDriver, SqliteDialect>;

impl SqliteAdapter {
    /// Connects to `settings.database` and registers `models`.
    ///
    /// An in-memory database starts empty, so its tables are created right
    /// away with [`Adapter::automigrate`].
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails or, for an in-memory
    /// database, if any table cannot be created.
    pub async fn initialize(
        settings: AdapterSettings,
        models: impl IntoIterator<Item = ModelSchema>,
    ) -> Result<Self> {
        let driver = SqliteDriver::connect(&settings.database).await?;
        let mut adapter = Self::new(driver, SqliteDialect::new(), settings);
        for model in models {
            adapter.define(model);
        }
        if adapter.settings.is_memory() {
            adapter.automigrate().await?;
        }
        Ok(adapter)
    }
}

impl<R: Driver, D: SqlDialect> Adapter<R, D> {
    /// Creates an adapter with no models.
    #[must_use]
    pub const fn new(driver: R, dialect: D, settings: AdapterSettings) -> Self {
        Self {
            driver,
            dialect,
            settings,
            models: BTreeMap::new(),
        }
    }

    /// Registers a model, replacing any model of the same name.
    pub fn define(&mut self, model: ModelSchema) {
        self.models.insert(model.name.clone(), model);
    }

    /// Adds or replaces one property of a registered model.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::UnknownModel`] if `model` is not registered.
    pub fn define_property(
        &mut self,
        model: &str,
        property: &str,
        descriptor: PropertyDescriptor,
    ) -> Result<()> {
        self.models
            .get_mut(model)
            .ok_or_else(|| AdapterError::UnknownModel(model.to_string()))?
            .define_property(property, descriptor);
        Ok(())
    }

    /// Returns a registered model.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::UnknownModel`] if `model` is not registered.
    pub fn model(&self, model: &str) -> Result<&ModelSchema> {
        self.models
            .get(model)
            .ok_or_else(|| AdapterError::UnknownModel(model.to_string()))
    }

    /// Iterates over the registered models in name order.
    pub fn models(&self) -> impl Iterator<Item = &ModelSchema> {
        self.models.values()
    }

    /// Returns the dialect.
    #[must_use]
    pub const fn dialect(&self) -> &D {
        &self.dialect
    }

    /// Returns the driver.
    #[must_use]
    pub const fn driver(&self) -> &R {
        &self.driver
    }

    /// Returns the settings.
    #[must_use]
    pub const fn settings(&self) -> &AdapterSettings {
        &self.settings
    }

    fn builder(&self, model: &str) -> Result<QueryBuilder<'_, D>> {
        Ok(QueryBuilder::new(&self.dialect, self.model(model)?).or_mode(self.settings.or_mode))
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        match self.settings.statement_timeout() {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| AdapterError::Timeout(limit))?,
            None => call.await,
        }
    }

    async fn command(&self, sql: &str, params: Vec<SqlValue>) -> Result<RunResult> {
        let started = Instant::now();
        let result = self.bounded(self.driver.run(sql, params)).await;
        debug!(sql = %sql, elapsed_ms = started.elapsed().as_millis(), "run");
        result
    }

    pub(crate) async fn execute_batch(&self, statements: &[String]) -> Result<()> {
        let started = Instant::now();
        let result = self.bounded(self.driver.run_all(statements)).await;
        debug!(
            sql = %statements.join(";\n"),
            elapsed_ms = started.elapsed().as_millis(),
            "run_all"
        );
        result
    }

    pub(crate) async fn query_all(&self, sql: &str) -> Result<Vec<StoredRow>> {
        let started = Instant::now();
        let result = self.bounded(self.driver.all(sql, Vec::new())).await;
        debug!(sql = %sql, elapsed_ms = started.elapsed().as_millis(), "all");
        result
    }

    async fn query_one(&self, sql: &str) -> Result<Option<StoredRow>> {
        let started = Instant::now();
        let result = self.bounded(self.driver.get(sql, Vec::new())).await;
        debug!(sql = %sql, elapsed_ms = started.elapsed().as_millis(), "get");
        result
    }

    /// Inserts `data` and returns the generated id.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is unknown or the driver fails.
    pub async fn create(&self, model: &str, data: &Record) -> Result<i64> {
        let (sql, params) = self.builder(model)?.insert(data);
        Ok(self.command(&sql, params).await?.last_insert_id)
    }

    /// Inserts `data`, replacing the row with the same id if there is one,
    /// and returns the data with its id set.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is unknown or the driver fails.
    pub async fn update_or_create(&self, model: &str, mut data: Record) -> Result<Record> {
        let (sql, params) = self.builder(model)?.upsert(&data);
        let done = self.command(&sql, params).await?;
        if data.id().is_none() {
            data.insert("id", done.last_insert_id);
        }
        Ok(data)
    }

    /// Writes the declared properties of `data` to the row with its id.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` has no id or no declared property, if the
    /// model is unknown or if the driver fails.
    pub async fn save(&self, model: &str, data: &Record) -> Result<()> {
        let sql = self.builder(model)?.update(data)?;
        self.command(&sql, Vec::new()).await?;
        Ok(())
    }

    /// Writes `data` to the row with the given id.
    ///
    /// # Errors
    ///
    /// Same as [`Adapter::save`].
    pub async fn update_attributes(&self, model: &str, id: i64, mut data: Record) -> Result<()> {
        data.insert("id", id);
        self.save(model, &data).await
    }

    /// Loads one row by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is unknown or the driver fails.
    pub async fn find_by_id(&self, model: &str, id: i64) -> Result<Option<Record>> {
        let schema = self.model(model)?;
        let sql = self.builder(model)?.find_by_id(id);
        Ok(self.query_one(&sql).await?.map(|row| {
            let mut record = from_storage_row(schema, row);
            record.insert("id", id);
            record
        }))
    }

    /// Loads every row matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is unknown, the filter does not
    /// compile or the driver fails.
    pub async fn all(&self, model: &str, filter: &Filter) -> Result<Vec<Record>> {
        let schema = self.model(model)?;
        let sql = self.builder(model)?.select(filter)?;
        let rows = self.query_all(&sql).await?;
        Ok(rows
            .into_iter()
            .map(|row| from_storage_row(schema, row))
            .collect())
    }

    /// Returns `true` if a row with this id exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is unknown or the driver fails.
    pub async fn exists(&self, model: &str, id: i64) -> Result<bool> {
        let sql = self.builder(model)?.exists(id);
        Ok(self.query_one(&sql).await?.is_some())
    }

    /// Deletes the rows matching `tree` and returns how many went.
    ///
    /// `None` is refused before anything is sent; pass an empty tree or use
    /// [`Adapter::destroy_all`] to delete every row.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MissingWhere`](sqlbridge_core::QueryError) for
    /// `None`, or an error if the tree does not compile or the driver fails.
    pub async fn remove(&self, model: &str, tree: Option<&Where>) -> Result<u64> {
        let sql = self.builder(model)?.delete(tree)?;
        Ok(self.command(&sql, Vec::new()).await?.rows_affected)
    }

    /// Deletes the row with this id. Returns `false` if there was none.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is unknown or the driver fails.
    pub async fn destroy(&self, model: &str, id: i64) -> Result<bool> {
        let sql = self.builder(model)?.delete_by_id(id);
        Ok(self.command(&sql, Vec::new()).await?.rows_affected > 0)
    }

    /// Deletes every row of the model.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is unknown or the driver fails.
    pub async fn destroy_all(&self, model: &str) -> Result<u64> {
        let sql = self.builder(model)?.delete_all();
        Ok(self.command(&sql, Vec::new()).await?.rows_affected)
    }

    /// Counts the rows matching `tree`, or every row.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is unknown, the tree does not compile
    /// or the driver fails.
    pub async fn count(&self, model: &str, tree: Option<&Where>) -> Result<i64> {
        let sql = self.builder(model)?.count(tree)?;
        let row = self.query_one(&sql).await?;
        Ok(row
            .as_ref()
            .and_then(|row| row_value(row, "cnt"))
            .and_then(SqlValue::as_i64)
            .unwrap_or(0))
    }

    /// Closes the connection.
    pub async fn disconnect(self) {
        self.driver.close().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use sqlbridge_core::{GenericDialect, QueryError};

    use super::*;

    /// Records every statement and answers with canned rows.
    #[derive(Debug, Default)]
    struct RecordingDriver {
        log: Mutex<Vec<(String, Vec<SqlValue>)>>,
        rows: Vec<StoredRow>,
        delay: Option<Duration>,
    }

    impl RecordingDriver {
        fn with_rows(rows: Vec<StoredRow>) -> Self {
            Self {
                rows,
                ..Self::default()
            }
        }

        async fn record(&self, sql: &str, params: Vec<SqlValue>) {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.log.lock().unwrap().push((sql.to_string(), params));
        }

        fn statements(&self) -> Vec<String> {
            self.log.lock().unwrap().iter().map(|(sql, _)| sql.clone()).collect()
        }
    }

    impl Driver for RecordingDriver {
        async fn run(&self, sql: &str, params: Vec<SqlValue>) -> Result<RunResult> {
            self.record(sql, params).await;
            Ok(RunResult {
                last_insert_id: 7,
                rows_affected: 1,
            })
        }

        async fn all(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<StoredRow>> {
            self.record(sql, params).await;
            Ok(self.rows.clone())
        }

        async fn get(&self, sql: &str, params: Vec<SqlValue>) -> Result<Option<StoredRow>> {
            self.record(sql, params).await;
            Ok(self.rows.first().cloned())
        }

        async fn run_all(&self, statements: &[String]) -> Result<()> {
            for sql in statements {
                self.record(sql, Vec::new()).await;
            }
            Ok(())
        }

        async fn close(&self) {}
    }

    fn user() -> ModelSchema {
        ModelSchema::new("User")
            .property("name", PropertyDescriptor::string())
            .property("age", PropertyDescriptor::number().indexed())
            .property("active", PropertyDescriptor::boolean())
    }

    fn adapter(driver: RecordingDriver) -> Adapter<RecordingDriver, GenericDialect> {
        let mut adapter = Adapter::new(driver, GenericDialect::new(), AdapterSettings::default());
        adapter.define(user());
        adapter
    }

    #[tokio::test]
    async fn test_create_binds_marshalled_values() {
        let adapter = adapter(RecordingDriver::default());
        let id = adapter
            .create("User", &Record::new().with("name", "Alice").with("age", 30))
            .await
            .unwrap();
        assert_eq!(id, 7);
        let log = adapter.driver().log.lock().unwrap();
        assert_eq!(
            log[0],
            (
                String::from("INSERT INTO `User` (`name`, `age`) VALUES (?, ?)"),
                vec![SqlValue::Text("Alice".into()), SqlValue::Int(30)]
            )
        );
    }

    #[tokio::test]
    async fn test_update_or_create_sets_generated_id() {
        let adapter = adapter(RecordingDriver::default());
        let saved = adapter
            .update_or_create("User", Record::new().with("name", "Bob"))
            .await
            .unwrap();
        assert_eq!(saved.id(), Some(7));
        assert_eq!(
            adapter.driver().statements(),
            vec!["REPLACE INTO `User` (`name`) VALUES (?)"]
        );
    }

    #[tokio::test]
    async fn test_update_attributes_targets_id() {
        let adapter = adapter(RecordingDriver::default());
        adapter
            .update_attributes("User", 3, Record::new().with("active", true))
            .await
            .unwrap();
        assert_eq!(
            adapter.driver().statements(),
            vec!["UPDATE `User` SET `active` = 1 WHERE `id` = 3"]
        );
    }

    #[tokio::test]
    async fn test_rows_are_unmarshalled() {
        let row = vec![
            (String::from("id"), SqlValue::Int(2)),
            (String::from("name"), SqlValue::Text("Eve".into())),
            (String::from("age"), SqlValue::Int(41)),
            (String::from("active"), SqlValue::Int(0)),
        ];
        let adapter = adapter(RecordingDriver::with_rows(vec![row]));
        let found = adapter.find_by_id("User", 2).await.unwrap().unwrap();
        assert_eq!(found.id(), Some(2));
        assert_eq!(found.get("active"), Some(&sqlbridge_core::Value::Bool(false)));
        assert_eq!(
            adapter.driver().statements(),
            vec!["SELECT * FROM `User` WHERE `id` = 2 LIMIT 1"]
        );
    }

    #[tokio::test]
    async fn test_all_compiles_filter() {
        let adapter = adapter(RecordingDriver::default());
        let filter = Filter::new().where_clause(Where::new().between("age", 20, 40));
        assert!(adapter.all("User", &filter).await.unwrap().is_empty());
        assert_eq!(
            adapter.driver().statements(),
            vec!["SELECT * FROM `User` WHERE `age` BETWEEN 20 AND 40"]
        );
    }

    #[tokio::test]
    async fn test_count_reads_alias() {
        let row = vec![(String::from("cnt"), SqlValue::Int(12))];
        let adapter = adapter(RecordingDriver::with_rows(vec![row]));
        assert_eq!(adapter.count("User", None).await.unwrap(), 12);
    }

    #[tokio::test]
    async fn test_remove_without_where_sends_nothing() {
        let adapter = adapter(RecordingDriver::default());
        let err = adapter.remove("User", None).await.unwrap_err();
        assert!(matches!(err, AdapterError::Query(QueryError::MissingWhere)));
        assert!(adapter.driver().statements().is_empty());

        assert_eq!(adapter.destroy_all("User").await.unwrap(), 1);
        assert!(adapter.destroy("User", 4).await.unwrap());
        assert_eq!(
            adapter.driver().statements(),
            vec!["DELETE FROM `User`", "DELETE FROM `User` WHERE `id` = 4"]
        );
    }

    #[tokio::test]
    async fn test_unknown_model() {
        let mut adapter = adapter(RecordingDriver::default());
        assert!(matches!(
            adapter.exists("Post", 1).await,
            Err(AdapterError::UnknownModel(name)) if name == "Post"
        ));
        assert!(adapter
            .define_property("Post", "title", PropertyDescriptor::string())
            .is_err());
    }

    #[tokio::test]
    async fn test_define_property_extends_model() {
        let mut adapter = adapter(RecordingDriver::default());
        adapter
            .define_property("User", "email", PropertyDescriptor::string())
            .unwrap();
        adapter
            .save("User", &Record::new().with("id", 1).with("email", "a@b.c"))
            .await
            .unwrap();
        assert_eq!(
            adapter.driver().statements(),
            vec!["UPDATE `User` SET `email` = \"a@b.c\" WHERE `id` = 1"]
        );
    }

    #[tokio::test]
    async fn test_statement_timeout() {
        let driver = RecordingDriver {
            delay: Some(Duration::from_millis(200)),
            ..RecordingDriver::default()
        };
        let mut adapter = Adapter::new(
            driver,
            GenericDialect::new(),
            AdapterSettings::default().with_statement_timeout_ms(10),
        );
        adapter.define(user());
        assert!(matches!(
            adapter.exists("User", 1).await,
            Err(AdapterError::Timeout(limit)) if limit == Duration::from_millis(10)
        ));
    }

    #[tokio::test]
    async fn test_migration_timeout() {
        let driver = RecordingDriver {
            delay: Some(Duration::from_millis(200)),
            ..RecordingDriver::default()
        };
        let mut adapter = Adapter::new(
            driver,
            GenericDialect::new(),
            AdapterSettings::default().with_migration_timeout_ms(20),
        );
        adapter.define(user());
        assert!(matches!(
            adapter.automigrate().await,
            Err(AdapterError::Timeout(limit)) if limit == Duration::from_millis(20)
        ));
        assert!(matches!(
            adapter.autoupdate().await,
            Err(AdapterError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_automigrate_runs_one_batch_per_model() {
        let adapter = adapter(RecordingDriver::default());
        adapter.automigrate().await.unwrap();
        assert_eq!(
            adapter.driver().statements(),
            vec![
                "DROP TABLE IF EXISTS `User`",
                "CREATE TABLE `User` (\n  `id` INTEGER PRIMARY KEY,\n  `name` VARCHAR(255) NULL,\n  `age` INT(11) NULL,\n  `active` TINYINT(1) NULL\n)",
                "CREATE INDEX `User_age` ON `User` (`age` ASC)",
            ]
        );
    }
}
