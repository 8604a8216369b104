//! Schema synchronization for every registered model.
//!
//! Each model is reconciled on its own; a batch fans out one future per
//! model, waits for all of them and reports every failure at once. A
//! failing model never stops the others.

use std::future::Future;

use futures::future::join_all;
use sqlbridge_core::migrations::{reconcile, Introspect, TableDiff};
use sqlbridge_core::{ColumnMetadata, IndexMetadata, ModelSchema};
use tracing::{info, warn};

use crate::adapter::Adapter;
use crate::driver::Driver;
use crate::error::{AdapterError, ModelMigrationError, Result};

/// The statements that would bring one model's table in line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    /// Model name.
    pub model: String,
    /// Statements in execution order. Empty when the table is current.
    pub statements: Vec<String>,
}

impl<R: Driver, D: Introspect> Adapter<R, D> {
    /// Reads the live columns and indexes of a model's table. Both are
    /// empty when the table does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails.
    pub async fn introspect(
        &self,
        model: &ModelSchema,
    ) -> Result<(Vec<ColumnMetadata>, Vec<IndexMetadata>)> {
        let table = model.table_name();
        let columns = self.query_all(&self.dialect.table_info_sql(table)).await?;
        let indexes = self.query_all(&self.dialect.index_list_sql(table)).await?;
        Ok((
            self.dialect.columns_from_rows(&columns),
            self.dialect.indexes_from_rows(&indexes),
        ))
    }

    async fn diff(&self, model: &ModelSchema) -> Result<Vec<String>> {
        let (columns, indexes) = self.introspect(model).await?;
        let diff = reconcile(&self.dialect, model, &columns, &indexes);
        if diff.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.dialect.render_diff(model, &diff))
    }

    /// Applies one model's statements atomically, so a cancelled batch
    /// never leaves a table half rebuilt.
    async fn execute_all(&self, statements: &[String]) -> Result<()> {
        if statements.is_empty() {
            return Ok(());
        }
        self.execute_batch(statements).await
    }

    async fn recreate(&self, model: &ModelSchema) -> Result<()> {
        let mut statements = vec![self.dialect.drop_table(model.table_name())];
        statements.extend(self.dialect.render_diff(model, &TableDiff::create(model)));
        self.execute_all(&statements).await
    }

    async fn sync(&self, model: &ModelSchema) -> Result<()> {
        let statements = self.diff(model).await?;
        self.execute_all(&statements).await
    }

    /// Runs `step` for every model concurrently and joins on all of them.
    async fn batch<'a, F, Fut>(&'a self, action: &'static str, step: F) -> Result<()>
    where
        F: Fn(&'a ModelSchema) -> Fut,
        Fut: Future<Output = Result<()>> + 'a,
    {
        let step = &step;
        let tasks = join_all(self.models.values().map(|model| async move {
            (model.name.as_str(), step(model).await)
        }));
        let outcomes = match self.settings.migration_timeout() {
            Some(limit) => tokio::time::timeout(limit, tasks)
                .await
                .map_err(|_| AdapterError::Timeout(limit))?,
            None => tasks.await,
        };

        let mut failures = Vec::new();
        for (model, outcome) in outcomes {
            match outcome {
                Ok(()) => info!(model = %model, action, "Model migrated"),
                Err(err) => {
                    warn!(model = %model, action, error = %err, "Model migration failed");
                    failures.push(ModelMigrationError {
                        model: model.to_string(),
                        source: Box::new(err),
                    });
                }
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(AdapterError::Migration(failures))
        }
    }

    /// Drops and recreates the table of every model. All rows are lost.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Migration`] listing every model that failed,
    /// or [`AdapterError::Timeout`] if the batch ran out of time.
    pub async fn automigrate(&self) -> Result<()> {
        self.batch("automigrate", |model| self.recreate(model)).await
    }

    /// Brings the table of every model in line with its declaration,
    /// keeping the data of the surviving columns.
    ///
    /// # Errors
    ///
    /// Same as [`Adapter::automigrate`].
    pub async fn autoupdate(&self) -> Result<()> {
        self.batch("autoupdate", |model| self.sync(model)).await
    }

    /// Returns what [`Adapter::autoupdate`] would execute, without
    /// executing it.
    ///
    /// # Errors
    ///
    /// Returns an error if a table cannot be introspected.
    pub async fn plan(&self) -> Result<Vec<MigrationPlan>> {
        let plans = join_all(self.models.values().map(|model| async move {
            self.diff(model).await.map(|statements| MigrationPlan {
                model: model.name.clone(),
                statements,
            })
        }))
        .await;
        plans.into_iter().collect()
    }

    /// Returns `true` if every table already matches its model.
    ///
    /// # Errors
    ///
    /// Returns an error if a table cannot be introspected.
    pub async fn is_actual(&self) -> Result<bool> {
        Ok(self.plan().await?.iter().all(|p| p.statements.is_empty()))
    }
}
