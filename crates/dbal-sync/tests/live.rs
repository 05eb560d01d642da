//! Live reader and writer against a scripted connection.

mod common;

use std::sync::Arc;

use common::{ScriptedConnection, column_row, mysql, mysql_server, posts, row, users};
use dbal_core::builder::SqlValue;
use dbal_core::dialect::MySqlDialect;
use dbal_core::schema::DatabaseDescriptor;
use dbal_core::{Error, MetadataCache, compare};
use dbal_sync::prelude::*;
use regex::Regex;

fn writer(conn: ScriptedConnection) -> LiveDatabaseWriter<ScriptedConnection> {
    LiveDatabaseWriter::new(conn, Arc::new(MySqlDialect::new()))
}

fn position(statements: &[String], fragment: &str) -> usize {
    statements
        .iter()
        .position(|s| s.contains(fragment))
        .unwrap_or_else(|| panic!("no statement containing {fragment:?} in {statements:#?}"))
}

#[test]
fn reader_normalizes_the_mysql_catalog() {
    let mut reader = LiveDatabaseReader::new(mysql_server(), Arc::new(MySqlDialect::new()));
    let db = reader.read().unwrap();

    assert_eq!(db.meta.driver, "mysql");
    assert_eq!(db.meta.charset.as_deref(), Some("utf8mb4"));
    assert_eq!(db.tables["users"], users(50));
    assert_eq!(
        db.views["active_users"],
        "CREATE VIEW `active_users` AS select `users`.`id` AS `id` from `users`"
    );
    assert!(db.procedures.is_empty());
    assert!(db.data.is_empty());
}

#[test]
fn reader_serves_tables_from_the_cache() {
    let conn = mysql_server();
    let queried = conn.queried();
    let mut reader = LiveDatabaseReader::new(conn, Arc::new(MySqlDialect::new()))
        .cache(MetadataCache::new(std::time::Duration::from_secs(60)));

    reader.read().unwrap();
    reader.read().unwrap();
    let describes = queried
        .borrow()
        .iter()
        .filter(|sql| sql.starts_with("SHOW FULL COLUMNS"))
        .count();
    assert_eq!(describes, 1);
}

#[test]
fn reader_captures_information_tables() {
    let conn = ScriptedConnection::mysql()
        .respond(
            "information_schema.TABLES",
            vec![row(&[("TABLE_NAME", Some("info_country"))])],
        )
        .respond(
            "SHOW FULL COLUMNS FROM `info_country`",
            vec![column_row("code", "char(2)", false, "PRI", "")],
        )
        .respond(
            "SHOW CREATE TABLE `info_country`",
            vec![row(&[
                ("Table", Some("info_country")),
                (
                    "Create Table",
                    Some(
                        "CREATE TABLE `info_country` (\n  `code` char(2) NOT NULL,\n  \
                         PRIMARY KEY (`code`)\n) ENGINE=InnoDB",
                    ),
                ),
            ])],
        )
        .respond(
            "SELECT * FROM `info_country` ORDER BY `code` ASC",
            vec![
                row(&[("code", Some("DE"))]),
                row(&[("code", Some("FR"))]),
            ],
        );

    let db = LiveDatabaseReader::new(conn, Arc::new(MySqlDialect::new()))
        .information_tables(Some(Regex::new("^info_").unwrap()))
        .read()
        .unwrap();
    assert_eq!(db.data["info_country"].len(), 2);
    assert_eq!(
        db.data["info_country"][1]["code"],
        SqlValue::Text("FR".into())
    );
}

fn keyless_server(rows: Vec<dbal_core::Row>) -> ScriptedConnection {
    ScriptedConnection::mysql()
        .respond(
            "information_schema.TABLES",
            vec![row(&[("TABLE_NAME", Some("info_rate"))])],
        )
        .respond(
            "SHOW FULL COLUMNS FROM `info_rate`",
            vec![
                column_row("currency", "char(3)", false, "", ""),
                column_row("rate", "varchar(20)", false, "", ""),
            ],
        )
        .respond(
            "SHOW CREATE TABLE `info_rate`",
            vec![row(&[
                ("Table", Some("info_rate")),
                (
                    "Create Table",
                    Some(
                        "CREATE TABLE `info_rate` (\n  `currency` char(3) NOT NULL,\n  \
                         `rate` varchar(20) NOT NULL\n) ENGINE=InnoDB",
                    ),
                ),
            ])],
        )
        .respond(
            "SELECT * FROM `info_rate` ORDER BY `currency` ASC, `rate` ASC",
            rows,
        )
}

#[test]
fn keyless_information_tables_sort_by_every_column() {
    let eur = row(&[("currency", Some("EUR")), ("rate", Some("1"))]);
    let usd = row(&[("currency", Some("USD")), ("rate", Some("1.08"))]);
    let conn = keyless_server(vec![eur.clone(), usd.clone()]);
    let queried = conn.queried();

    let db = LiveDatabaseReader::new(conn, Arc::new(MySqlDialect::new()))
        .information_tables(Some(Regex::new("^info_").unwrap()))
        .read()
        .unwrap();

    assert_eq!(db.data["info_rate"], vec![eur, usd]);
    assert!(queried
        .borrow()
        .iter()
        .any(|sql| sql == "SELECT * FROM `info_rate` ORDER BY `currency` ASC, `rate` ASC"));
}

#[test]
fn reader_names_the_failing_table() {
    let conn = ScriptedConnection::mysql()
        .respond(
            "information_schema.TABLES",
            vec![row(&[("TABLE_NAME", Some("broken"))])],
        )
        .respond(
            "SHOW FULL COLUMNS FROM `broken`",
            vec![column_row("id", "int", false, "", "")],
        );
    let err = LiveDatabaseReader::new(conn, Arc::new(MySqlDialect::new()))
        .read()
        .unwrap_err();
    assert!(
        matches!(&err, SyncError::Core(Error::IntrospectionFailure { table, .. }) if table == "broken"),
        "{err}"
    );
}

#[test]
fn empty_target_only_creates_tables() {
    let changes = compare(&mysql(vec![users(50)]), &DatabaseDescriptor::new("mysql"), false)
        .unwrap();
    let conn = ScriptedConnection::mysql();
    let executed = conn.executed();

    let report = writer(conn).write(&changes).unwrap();
    assert_eq!(
        report.statements(),
        ["CREATE TABLE `users` (\n    \
          `id` int unsigned NOT NULL AUTO_INCREMENT,\n    \
          `name` varchar(50) NOT NULL,\n    \
          PRIMARY KEY (`id`)\n\
          ) ENGINE=InnoDB"]
    );
    assert_eq!(*executed.borrow(), report.statements());
}

#[test]
fn widened_column_is_one_change() {
    let changes = compare(&mysql(vec![users(100)]), &mysql(vec![users(50)]), false).unwrap();
    let report = writer(ScriptedConnection::mysql()).write(&changes).unwrap();
    assert_eq!(
        report.statements(),
        ["ALTER TABLE `users` CHANGE COLUMN `name` `name` varchar(100) NOT NULL"]
    );
}

#[test]
fn dependents_drop_first_and_create_last() {
    let mut legacy = posts();
    legacy.name = "legacy_posts".into();
    let mut target = mysql(vec![users(50), legacy]);
    target
        .views
        .insert("old_view".into(), "CREATE VIEW `old_view` AS SELECT 1".into());
    let mut source = mysql(vec![users(50), posts()]);
    source
        .views
        .insert("post_view".into(), "CREATE VIEW `post_view` AS SELECT * FROM `posts`".into());

    let changes = compare(&source, &target, false).unwrap();
    let plan: Vec<String> = writer(ScriptedConnection::mysql())
        .plan(&changes)
        .unwrap()
        .into_iter()
        .map(|s| s.sql)
        .collect();

    let drop_view = position(&plan, "DROP VIEW IF EXISTS `old_view`");
    let drop_fk = position(&plan, "ALTER TABLE `legacy_posts` DROP FOREIGN KEY `fk_posts_user`");
    let drop_table = position(&plan, "DROP TABLE `legacy_posts`");
    let create = position(&plan, "CREATE TABLE `posts`");
    let add_fk = position(&plan, "ALTER TABLE `posts` ADD CONSTRAINT `fk_posts_user`");
    let trigger = position(&plan, "CREATE TRIGGER `trg_posts_bi`");
    let view = position(&plan, "CREATE VIEW `post_view`");

    assert!(drop_view < drop_fk);
    assert!(drop_fk < drop_table);
    assert!(drop_table < create);
    assert!(create < add_fk);
    assert!(add_fk < trigger);
    assert!(trigger < view);
}

#[test]
fn merge_only_adds() {
    let mut target = mysql(vec![users(50)]);
    target.views.insert("keep_me".into(), "CREATE VIEW `keep_me` AS SELECT 1".into());
    let source = mysql(vec![users(50), posts()]);

    let changes = compare(&source, &target, true).unwrap();
    let plan = writer(ScriptedConnection::mysql()).plan(&changes).unwrap();
    assert!(plan.iter().all(|s| !s.sql.starts_with("DROP")));
}

#[test]
fn failure_reports_what_was_applied() {
    let changes = compare(
        &mysql(vec![users(50), posts()]),
        &DatabaseDescriptor::new("mysql"),
        false,
    )
    .unwrap();
    let conn = ScriptedConnection::mysql().fail_on("ADD CONSTRAINT");
    let executed = conn.executed();

    let err = writer(conn).write(&changes).unwrap_err();
    let SyncError::Core(Error::ApplyFailure {
        statement, applied, ..
    }) = err
    else {
        panic!("expected an apply failure");
    };
    assert!(statement.contains("ADD CONSTRAINT `fk_posts_user`"));
    assert_eq!(applied.len(), 2);
    assert!(applied.iter().all(|s| s.starts_with("CREATE TABLE")));
    assert_eq!(*executed.borrow(), applied);
}

#[test]
fn dry_run_executes_nothing() {
    let changes = compare(&mysql(vec![users(100)]), &mysql(vec![users(50)]), false).unwrap();
    let conn = ScriptedConnection::mysql();
    let executed = conn.executed();

    let report = writer(conn).dry_run(true).write(&changes).unwrap();
    assert_eq!(report.statements().len(), 1);
    assert!(executed.borrow().is_empty());
}

#[test]
fn information_rows_are_replaced() {
    let mut source = mysql(vec![users(50)]);
    source.data.insert(
        "info_country".into(),
        vec![
            row(&[("code", Some("DE")), ("name", Some("Germany"))]),
            row(&[("code", Some("FR")), ("name", Some("France"))]),
        ],
    );
    let mut target = mysql(vec![users(50)]);
    target.data.insert(
        "info_country".into(),
        vec![row(&[("code", Some("DE")), ("name", Some("Deutschland"))])],
    );

    let changes = compare(&source, &target, false).unwrap();
    let plan = writer(ScriptedConnection::mysql()).plan(&changes).unwrap();
    assert_eq!(plan.len(), 2);
    assert_eq!(plan[0].sql, "DELETE FROM `info_country`");
    assert_eq!(
        plan[1].sql,
        "INSERT INTO `info_country` (`code`, `name`) VALUES (?, ?), (?, ?)"
    );
    assert_eq!(plan[1].binds.len(), 4);
}
