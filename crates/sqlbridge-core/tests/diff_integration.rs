//! Integration tests for schema reconciliation.
//!
//! These tests describe a live table as the engine would report it, diff a
//! model against it and check the DDL the generic dialect renders.

use sqlbridge_core::dialect::{GenericDialect, SqlDialect};
use sqlbridge_core::migrations::{reconcile, ColumnChange, TableDiff};
use sqlbridge_core::schema::{ColumnMetadata, IndexMetadata, ModelSchema, PropertyDescriptor};

// =============================================================================
// V1: the table as it exists
// =============================================================================

fn live_v1() -> (Vec<ColumnMetadata>, Vec<IndexMetadata>) {
    (
        vec![
            ColumnMetadata::new("id", "INTEGER", true).primary_key(),
            ColumnMetadata::new("title", "VARCHAR(255)", false),
            ColumnMetadata::new("body", "TEXT", true),
            ColumnMetadata::new("published", "TINYINT(1)", true),
        ],
        vec![IndexMetadata::new("Article_published", false)],
    )
}

fn article_v1() -> ModelSchema {
    ModelSchema::new("Article")
        .property("title", PropertyDescriptor::string().not_null())
        .property("body", PropertyDescriptor::text())
        .property("published", PropertyDescriptor::boolean().indexed())
}

// =============================================================================
// V2: body dropped, summary added, title widened, slug indexed uniquely
// =============================================================================

fn article_v2() -> ModelSchema {
    ModelSchema::new("Article")
        .property("title", PropertyDescriptor::string().limit(500).not_null())
        .property("summary", PropertyDescriptor::text())
        .property("published", PropertyDescriptor::boolean().indexed())
        .property("slug", PropertyDescriptor::string().limit(80).unique())
}

#[test]
fn create_table_lists_id_then_declared_columns_in_order() {
    let dialect = GenericDialect::new();
    let model = article_v1();
    let diff = reconcile(&dialect, &model, &[], &[]);
    let statements = dialect.render_diff(&model, &diff);

    assert_eq!(
        statements,
        vec![
            "CREATE TABLE `Article` (\n  `id` INTEGER PRIMARY KEY,\n  `title` VARCHAR(255) NOT NULL,\n  `body` TEXT NULL,\n  `published` TINYINT(1) NULL\n)",
            "CREATE INDEX `Article_published` ON `Article` (`published` ASC)",
        ]
    );
}

#[test]
fn unchanged_model_renders_nothing() {
    let dialect = GenericDialect::new();
    let (columns, indexes) = live_v1();
    let diff = reconcile(&dialect, &article_v1(), &columns, &indexes);
    assert!(diff.is_empty());
    assert!(dialect.render_diff(&article_v1(), &diff).is_empty());
}

#[test]
fn evolved_model_renders_one_alter_and_separate_indexes() {
    let dialect = GenericDialect::new();
    let (columns, indexes) = live_v1();
    let model = article_v2();
    let diff = reconcile(&dialect, &model, &columns, &indexes);

    assert_eq!(diff.retained, vec!["id", "title", "published"]);
    assert_eq!(
        dialect.render_diff(&model, &diff),
        vec![
            "ALTER TABLE `Article` CHANGE COLUMN `title` `title` VARCHAR(500) NOT NULL, \
             ADD COLUMN `summary` TEXT NULL, \
             ADD COLUMN `slug` VARCHAR(80) NULL, \
             DROP COLUMN `body`",
            "CREATE UNIQUE INDEX `Article_slug` ON `Article` (`slug` ASC)",
        ]
    );
}

#[test]
fn dropping_an_index_comes_before_the_alter() {
    let dialect = GenericDialect::new();
    let (columns, indexes) = live_v1();
    let model = ModelSchema::new("Article")
        .property("title", PropertyDescriptor::string().not_null())
        .property("body", PropertyDescriptor::text());
    let diff = reconcile(&dialect, &model, &columns, &indexes);

    assert_eq!(
        dialect.render_diff(&model, &diff),
        vec![
            "DROP INDEX `Article_published` ON `Article`",
            "ALTER TABLE `Article` DROP COLUMN `published`",
        ]
    );
}

#[test]
fn extra_live_column_yields_exactly_one_drop() {
    let dialect = GenericDialect::new();
    let (mut columns, indexes) = live_v1();
    columns.push(ColumnMetadata::new("legacy_flag", "INT(11)", true));
    let diff = reconcile(&dialect, &article_v1(), &columns, &indexes);

    assert_eq!(
        diff,
        TableDiff {
            create_table: false,
            columns: vec![ColumnChange::Drop {
                name: String::from("legacy_flag")
            }],
            indexes: vec![],
            retained: vec![
                String::from("id"),
                String::from("title"),
                String::from("body"),
                String::from("published"),
            ],
        }
    );
}

#[test]
fn nullability_flip_is_a_change() {
    let dialect = GenericDialect::new();
    let (columns, indexes) = live_v1();
    let model = ModelSchema::new("Article")
        .property("title", PropertyDescriptor::string())
        .property("body", PropertyDescriptor::text())
        .property("published", PropertyDescriptor::boolean().indexed());
    let diff = reconcile(&dialect, &model, &columns, &indexes);
    assert_eq!(
        diff.columns,
        vec![ColumnChange::Change {
            name: String::from("title"),
            descriptor: PropertyDescriptor::string(),
        }]
    );
}
