use openlaunch_db::{
    create_pool, fetch_one, run_migrations, run_session, with_session, AuditColumns, AuditFields,
    DbError, DbPool, DbRuntimeSettings, Schema, Table,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct Widget {
    name: String,
    #[serde(default)]
    color: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WidgetSchema {
    #[serde(flatten)]
    audit: AuditFields,
    name: String,
    color: Option<String>,
}

impl Schema for WidgetSchema {
    type Model = Widget;
}

fn widgets() -> Table {
    Table::new("it_widgets")
        .unique_column("name", "TEXT")
        .nullable_column("color", "TEXT")
}

fn live_pool() -> DbPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    create_pool(url.parse().expect("valid DATABASE_URL"), DbRuntimeSettings::default())
}

#[tokio::test]
#[ignore = "requires database"]
async fn db_initialization_works() {
    let pool = live_pool();

    {
        let mut conn = pool.get().expect("failed to get connection");
        run_migrations(&mut conn).expect("failed to run migrations");
    }

    run_session(&pool, |tx| -> Result<(), DbError> {
        tx.batch_execute("DROP TABLE IF EXISTS it_widgets;")?;
        widgets().create(tx)?;
        Ok(())
    })
    .await
    .expect("table creation should succeed");

    let schema = WidgetSchema {
        audit: AuditFields {
            id: Some(999),
            ..AuditFields::default()
        },
        name: "gear".to_string(),
        color: None,
    };
    let widget = schema.to_model().expect("mapping should succeed");

    let audit = run_session(&pool, move |tx| -> Result<AuditColumns, DbError> {
        let row = tx.query_one(
            "INSERT INTO it_widgets (name, color) VALUES ($1, $2) \
             RETURNING id, created_at, updated_at",
            &[&widget.name, &widget.color],
        )?;
        Ok(AuditColumns::from_row(&row)?)
    })
    .await
    .expect("insert should succeed");
    assert_ne!(audit.id, 999, "client-supplied id must not be persisted");

    let updated = run_session(&pool, move |tx| -> Result<AuditColumns, DbError> {
        let row = fetch_one(
            tx,
            "UPDATE it_widgets SET color = 'red' WHERE id = $1 \
             RETURNING id, created_at, updated_at",
            &[&audit.id],
            "widget",
        )?;
        Ok(AuditColumns::from_row(&row)?)
    })
    .await
    .expect("update should succeed");
    assert!(updated.updated_at >= audit.updated_at);

    let duplicate = with_session(&pool, |tx| -> Result<u64, DbError> {
        Ok(tx.execute("INSERT INTO it_widgets (name) VALUES ('gear')", &[])?)
    })
    .expect_err("unique constraint should reject duplicate");
    assert!(duplicate.is_integrity_violation());
    assert_eq!(duplicate.sqlstate(), Some("23505"));
    assert_eq!(duplicate.constraint(), Some("uq_it_widgets_name"));

    let missing = with_session(&pool, |tx| {
        fetch_one(tx, "SELECT id FROM it_widgets WHERE name = 'nope'", &[], "widget")
    })
    .expect_err("no row should match");
    assert!(matches!(missing, DbError::NotFound(_)));

    let bad_sql = with_session(&pool, |tx| -> Result<u64, DbError> {
        Ok(tx.execute("SELECT missing_column FROM it_widgets", &[])?)
    })
    .expect_err("unknown column should fail");
    assert!(bad_sql.is_programming_error());

    with_session(&pool, |tx| -> Result<(), DbError> {
        tx.batch_execute("DROP TABLE it_widgets;")?;
        Ok(())
    })
    .unwrap();
}
