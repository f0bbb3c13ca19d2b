use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

/// SQL expression producing the current UTC time as RFC 3339 text with milliseconds.
pub const NOW_SQL: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

/// New `update_time` for a rewritten row. Falls back to one millisecond past the
/// stored value when the clock has not moved since the last write, so the column
/// strictly increases on every update.
pub const NEXT_UPDATE_TIME_SQL: &str = "CASE \
     WHEN strftime('%Y-%m-%dT%H:%M:%fZ', 'now') > update_time \
     THEN strftime('%Y-%m-%dT%H:%M:%fZ', 'now') \
     ELSE strftime('%Y-%m-%dT%H:%M:%fZ', update_time, '+0.001 seconds') \
     END";

/// How long a writer waits for the SQLite write lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Creates the SQLite connection pool and makes sure the schema exists.
///
/// In-memory URLs are pinned to a single connection that never expires,
/// since every SQLite memory connection is its own database.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    info!("Opening SQLite store at {database_url}");

    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid DATABASE_URL '{database_url}'"))?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await?
    };

    init_schema(&pool).await?;
    info!("SQLite store ready");
    Ok(pool)
}

/// Creates tables, constraints and update-time triggers if they are missing.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    let statements = [
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS applications (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                company_name TEXT NOT NULL CHECK (length(trim(company_name)) > 0),
                job_title    TEXT,
                location     TEXT,
                source_url   TEXT,
                status       TEXT NOT NULL DEFAULT 'applied'
                             CHECK (status IN ('applied', 'interview', 'rejected', 'closed')),
                apply_time   TEXT,
                create_time  TEXT NOT NULL DEFAULT ({NOW_SQL}),
                update_time  TEXT NOT NULL DEFAULT ({NOW_SQL})
            )
            "#
        ),
        "CREATE INDEX IF NOT EXISTS idx_applications_status ON applications(status)".to_string(),
        "CREATE INDEX IF NOT EXISTS idx_applications_create_time ON applications(create_time)"
            .to_string(),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS skills (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                name          TEXT NOT NULL,
                is_soft_skill INTEGER NOT NULL DEFAULT 0 CHECK (is_soft_skill IN (0, 1)),
                create_time   TEXT NOT NULL DEFAULT ({NOW_SQL}),
                update_time   TEXT NOT NULL DEFAULT ({NOW_SQL}),
                UNIQUE (name, is_soft_skill)
            )
            "#
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS application_skills (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                application_id INTEGER NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
                skill_id       INTEGER NOT NULL REFERENCES skills(id) ON DELETE CASCADE,
                create_time    TEXT NOT NULL DEFAULT ({NOW_SQL}),
                update_time    TEXT NOT NULL DEFAULT ({NOW_SQL}),
                UNIQUE (application_id, skill_id)
            )
            "#
        ),
        "CREATE INDEX IF NOT EXISTS idx_application_skills_skill ON application_skills(skill_id)"
            .to_string(),
        update_time_trigger("applications"),
        update_time_trigger("skills"),
        update_time_trigger("application_skills"),
    ];

    for statement in &statements {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("Failed to bootstrap schema")?;
    }

    Ok(())
}

/// Refreshes `update_time` on any row write that did not set it explicitly.
fn update_time_trigger(table: &str) -> String {
    format!(
        r#"
        CREATE TRIGGER IF NOT EXISTS trg_{table}_update_time
        AFTER UPDATE ON {table}
        FOR EACH ROW WHEN NEW.update_time = OLD.update_time
        BEGIN
            UPDATE {table} SET update_time = {NEXT_UPDATE_TIME_SQL} WHERE id = NEW.id;
        END
        "#
    )
}
