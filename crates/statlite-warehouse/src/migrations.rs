use ::duckdb::Connection;

struct Migration {
    version: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "0001_sales_tables",
        sql: r#"
CREATE TABLE IF NOT EXISTS products (
    product_id BIGINT PRIMARY KEY,
    product_name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sale (
    transaction_id BIGINT PRIMARY KEY,
    card_id TEXT NOT NULL,
    transaction_date DATE NOT NULL,
    transaction_time TIME NOT NULL
);

CREATE TABLE IF NOT EXISTS detailed_sale (
    transaction_id BIGINT NOT NULL,
    product_id BIGINT,
    quantity INTEGER,
    price DOUBLE
);
"#,
    },
    Migration {
        version: "0002_indexes",
        sql: r#"
CREATE INDEX IF NOT EXISTS idx_sale_card_id ON sale(card_id);
CREATE INDEX IF NOT EXISTS idx_sale_transaction_date ON sale(transaction_date);
CREATE INDEX IF NOT EXISTS idx_detailed_sale_transaction_id ON detailed_sale(transaction_id);
CREATE INDEX IF NOT EXISTS idx_detailed_sale_product_id ON detailed_sale(product_id);
"#,
    },
];

pub fn apply_migrations(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    )?;

    for migration in MIGRATIONS {
        let applied_count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM schema_migrations WHERE version = ?",
            [migration.version],
            |row| row.get(0),
        )?;

        if applied_count == 0 {
            tracing::debug!(version = migration.version, "applying migration");
            connection.execute_batch(migration.sql)?;
            connection.execute(
                "INSERT INTO schema_migrations (version) VALUES (?)",
                [migration.version],
            )?;
        }
    }

    Ok(())
}
