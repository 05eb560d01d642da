#![allow(dead_code)]

use dbal_core::schema::{
    CanonicalType, ColumnDescriptor, ConstraintDescriptor, DatabaseDescriptor, DefaultValue,
    ForeignKeyAction, IndexDescriptor, IndexKind, PRIMARY_INDEX, TableDescriptor, TableMeta,
};

pub fn id_column() -> ColumnDescriptor {
    ColumnDescriptor::new("id", "int", CanonicalType::Int)
        .primary_key()
        .autoincrement()
        .unsigned()
}

pub fn users(name_length: u64) -> TableDescriptor {
    TableDescriptor::new("users")
        .column(id_column())
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
        .column(id_column())
        .column(ColumnDescriptor::new("user_id", "int", CanonicalType::Int).unsigned())
        .column(
            ColumnDescriptor::new("status", "enum", CanonicalType::String)
                .with_enumerated_values(vec!["draft".into(), "it's live".into()])
                .with_default(DefaultValue::String("draft".into())),
        )
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
            "CREATE TRIGGER `trg_posts_bi` BEFORE INSERT ON `posts` FOR EACH ROW SET NEW.status = 'draft'",
        )
}

pub fn blog() -> DatabaseDescriptor {
    let mut db = DatabaseDescriptor::new("mysql").table(users(50)).table(posts());
    db.views.insert(
        "recent_posts".into(),
        "CREATE VIEW `recent_posts` AS SELECT * FROM `posts`".into(),
    );
    db
}
