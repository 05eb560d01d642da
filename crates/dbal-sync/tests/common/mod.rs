#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use dbal_core::builder::{BindValues, SqlValue};
use dbal_core::schema::{
    CanonicalType, ColumnDescriptor, ConstraintDescriptor, DatabaseDescriptor, ForeignKeyAction,
    IndexDescriptor, IndexKind, PRIMARY_INDEX, TableDescriptor, TableMeta,
};
use dbal_core::{BoxError, Connection, Row};

/// Statements a [`ScriptedConnection`] saw, shared with the test.
pub type Log = Rc<RefCell<Vec<String>>>;

#[derive(Debug)]
struct Response {
    fragment: String,
    bind: Option<String>,
    rows: Vec<Row>,
}

/// In-memory connection answering queries from canned rows.
#[derive(Debug)]
pub struct ScriptedConnection {
    driver: String,
    version: String,
    responses: Vec<Response>,
    fail_on: Option<String>,
    executed: Log,
    queried: Log,
}

impl ScriptedConnection {
    pub fn mysql() -> Self {
        Self {
            driver: "mysql".into(),
            version: "8.0.36".into(),
            responses: Vec::new(),
            fail_on: None,
            executed: Log::default(),
            queried: Log::default(),
        }
    }

    /// Answers queries containing `fragment` with `rows`.
    pub fn respond(mut self, fragment: &str, rows: Vec<Row>) -> Self {
        self.responses.push(Response {
            fragment: fragment.into(),
            bind: None,
            rows,
        });
        self
    }

    /// Like [`respond`](Self::respond), but only when `bind` is among the
    /// bound values.
    pub fn respond_bound(mut self, fragment: &str, bind: &str, rows: Vec<Row>) -> Self {
        self.responses.push(Response {
            fragment: fragment.into(),
            bind: Some(bind.into()),
            rows,
        });
        self
    }

    /// Fails the first executed statement containing `fragment`.
    pub fn fail_on(mut self, fragment: &str) -> Self {
        self.fail_on = Some(fragment.into());
        self
    }

    pub fn executed(&self) -> Log {
        Rc::clone(&self.executed)
    }

    pub fn queried(&self) -> Log {
        Rc::clone(&self.queried)
    }
}

fn binds_text(binds: &BindValues) -> Vec<String> {
    binds.values().into_iter().filter_map(SqlValue::to_text).collect()
}

impl Connection for ScriptedConnection {
    fn driver(&self) -> &str {
        &self.driver
    }

    fn server_version(&mut self) -> Result<String, BoxError> {
        Ok(self.version.clone())
    }

    fn execute(&mut self, sql: &str, _binds: &BindValues) -> Result<u64, BoxError> {
        if self.fail_on.as_deref().is_some_and(|f| sql.contains(f)) {
            return Err(format!("scripted failure on: {sql}").into());
        }
        self.executed.borrow_mut().push(sql.to_string());
        Ok(0)
    }

    fn fetch_all(&mut self, sql: &str, binds: &BindValues) -> Result<Vec<Row>, BoxError> {
        self.queried.borrow_mut().push(sql.to_string());
        let bound = binds_text(binds);
        Ok(self
            .responses
            .iter()
            .find(|r| {
                sql.contains(&r.fragment) && r.bind.as_ref().is_none_or(|b| bound.contains(b))
            })
            .map(|r| r.rows.clone())
            .unwrap_or_default())
    }

    fn begin(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    fn commit(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// A row of text cells; `None` is NULL.
pub fn row(cells: &[(&str, Option<&str>)]) -> Row {
    cells
        .iter()
        .map(|(k, v)| {
            (
                (*k).to_string(),
                v.map_or(SqlValue::Null, |s| SqlValue::Text(s.to_string())),
            )
        })
        .collect()
}

/// A `SHOW FULL COLUMNS` row.
pub fn column_row(field: &str, ty: &str, null: bool, key: &str, extra: &str) -> Row {
    row(&[
        ("Field", Some(field)),
        ("Type", Some(ty)),
        ("Collation", None),
        ("Null", Some(if null { "YES" } else { "NO" })),
        ("Key", Some(key)),
        ("Default", None),
        ("Extra", Some(extra)),
        ("Privileges", Some("select,insert,update,references")),
        ("Comment", Some("")),
    ])
}

pub const USERS_DDL: &str = "CREATE TABLE `users` (\n  \
    `id` int unsigned NOT NULL AUTO_INCREMENT,\n  \
    `name` varchar(50) NOT NULL,\n  \
    PRIMARY KEY (`id`)\n\
    ) ENGINE=InnoDB";

/// A MySQL 8 server holding the `users` table and one view.
pub fn mysql_server() -> ScriptedConnection {
    ScriptedConnection::mysql()
        .respond(
            "information_schema.SCHEMATA",
            vec![row(&[
                ("DEFAULT_CHARACTER_SET_NAME", Some("utf8mb4")),
                ("DEFAULT_COLLATION_NAME", Some("utf8mb4_0900_ai_ci")),
            ])],
        )
        .respond(
            "information_schema.TABLES",
            vec![row(&[("TABLE_NAME", Some("users"))])],
        )
        .respond(
            "SHOW FULL COLUMNS FROM `users`",
            vec![
                column_row("id", "int unsigned", false, "PRI", "auto_increment"),
                column_row("name", "varchar(50)", false, "", ""),
            ],
        )
        .respond(
            "SHOW CREATE TABLE `users`",
            vec![row(&[
                ("Table", Some("users")),
                ("Create Table", Some(USERS_DDL)),
            ])],
        )
        .respond(
            "information_schema.VIEWS",
            vec![row(&[("TABLE_NAME", Some("active_users"))])],
        )
        .respond(
            "SHOW CREATE VIEW `active_users`",
            vec![row(&[
                ("View", Some("active_users")),
                (
                    "Create View",
                    Some("CREATE VIEW `active_users` AS select `users`.`id` AS `id` from `users`"),
                ),
            ])],
        )
}

pub fn users(name_length: u64) -> TableDescriptor {
    TableDescriptor::new("users")
        .column(
            ColumnDescriptor::new("id", "int", CanonicalType::Int)
                .primary_key()
                .autoincrement()
                .unsigned()
                .not_null(),
        )
        .column(
            ColumnDescriptor::new("name", "varchar", CanonicalType::String)
                .with_max_length(name_length)
                .not_null(),
        )
        .index(
            PRIMARY_INDEX,
            IndexDescriptor::new(IndexKind::Primary, vec!["id".into()]),
        )
        .with_meta(TableMeta {
            engine: Some("InnoDB".into()),
            ..TableMeta::default()
        })
}

pub fn posts() -> TableDescriptor {
    TableDescriptor::new("posts")
        .column(
            ColumnDescriptor::new("id", "int", CanonicalType::Int)
                .primary_key()
                .autoincrement()
                .not_null(),
        )
        .column(ColumnDescriptor::new("user_id", "int", CanonicalType::Int).unsigned())
        .index(
            PRIMARY_INDEX,
            IndexDescriptor::new(IndexKind::Primary, vec!["id".into()]),
        )
        .index(
            "idx_user",
            IndexDescriptor::new(IndexKind::Index, vec!["user_id".into()]),
        )
        .constraint(
            "fk_posts_user",
            ConstraintDescriptor::new("fk_posts_user", vec!["user_id".into()], "users", vec![
                "id".into(),
            ])
            .expect("valid foreign key")
            .on_delete(ForeignKeyAction::Cascade),
        )
        .trigger(
            "trg_posts_bi",
            "CREATE TRIGGER `trg_posts_bi` BEFORE INSERT ON `posts` FOR EACH ROW SET NEW.user_id = 1",
        )
}

pub fn mysql(tables: Vec<TableDescriptor>) -> DatabaseDescriptor {
    tables
        .into_iter()
        .fold(DatabaseDescriptor::new("mysql"), DatabaseDescriptor::table)
}
