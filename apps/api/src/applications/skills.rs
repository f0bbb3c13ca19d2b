//! Skill Reconciler: keeps the application/skill relation equal to the most
//! recently supplied name set for a category.
//!
//! Skill names are unique per `(name, category)`. New names are inserted with
//! `ON CONFLICT DO NOTHING`; when a concurrent writer wins the insert, the id
//! is re-fetched instead of failing.

use std::collections::{BTreeSet, HashMap};

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::debug;

use crate::errors::AppError;
use crate::models::skill::{SkillCategory, SkillRow};

/// Splits a comma-separated skill string into trimmed, non-empty, de-duplicated names.
pub fn split_skill_names(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

/// Replaces every link of `application_id` in `category` with links to exactly `names`.
/// Missing dictionary entries are created. An empty set clears the category.
pub async fn reconcile_skills(
    conn: &mut SqliteConnection,
    application_id: i64,
    names: &BTreeSet<String>,
    category: SkillCategory,
) -> Result<Vec<i64>, AppError> {
    // The delete goes first so a caller's transaction takes the write lock
    // before any read.
    let removed = sqlx::query(
        r#"
        DELETE FROM application_skills
        WHERE application_id = ?
          AND skill_id IN (SELECT id FROM skills WHERE is_soft_skill = ?)
        "#,
    )
    .bind(application_id)
    .bind(category.is_soft())
    .execute(&mut *conn)
    .await?
    .rows_affected();

    let skill_ids = resolve_skill_ids(conn, names, category).await?;

    for skill_id in &skill_ids {
        sqlx::query(
            "INSERT INTO application_skills (application_id, skill_id) VALUES (?, ?) \
             ON CONFLICT (application_id, skill_id) DO NOTHING",
        )
        .bind(application_id)
        .bind(skill_id)
        .execute(&mut *conn)
        .await?;
    }

    debug!(
        application_id,
        category = category.as_str(),
        removed,
        linked = skill_ids.len(),
        "Reconciled skill links"
    );

    Ok(skill_ids)
}

/// Returns dictionary ids for `names` in `category`, creating rows that do not exist yet.
/// Ids come back sorted.
pub async fn resolve_skill_ids(
    conn: &mut SqliteConnection,
    names: &BTreeSet<String>,
    category: SkillCategory,
) -> Result<Vec<i64>, AppError> {
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let existing: HashMap<String, i64> = find_skills(conn, names, category)
        .await?
        .into_iter()
        .map(|row| (row.name, row.id))
        .collect();

    let mut ids: Vec<i64> = existing.values().copied().collect();

    for name in names.iter().filter(|name| !existing.contains_key(*name)) {
        ids.push(insert_or_fetch_skill(conn, name, category).await?);
    }

    ids.sort_unstable();
    Ok(ids)
}

/// Inserts `name` into the dictionary, or returns the id of the row another
/// writer already created.
pub async fn insert_or_fetch_skill(
    conn: &mut SqliteConnection,
    name: &str,
    category: SkillCategory,
) -> Result<i64, AppError> {
    let inserted: Option<i64> = sqlx::query_scalar(
        "INSERT INTO skills (name, is_soft_skill) VALUES (?, ?) \
         ON CONFLICT (name, is_soft_skill) DO NOTHING RETURNING id",
    )
    .bind(name)
    .bind(category.is_soft())
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = inserted {
        debug!(skill = %name, category = category.as_str(), "Created skill");
        return Ok(id);
    }

    Ok(
        sqlx::query_scalar("SELECT id FROM skills WHERE name = ? AND is_soft_skill = ?")
            .bind(name)
            .bind(category.is_soft())
            .fetch_one(&mut *conn)
            .await?,
    )
}

async fn find_skills(
    conn: &mut SqliteConnection,
    names: &BTreeSet<String>,
    category: SkillCategory,
) -> Result<Vec<SkillRow>, AppError> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT id, name, is_soft_skill, create_time, update_time FROM skills WHERE is_soft_skill = ",
    );
    query.push_bind(category.is_soft());
    query.push(" AND name IN (");
    let mut separated = query.separated(", ");
    for name in names {
        separated.push_bind(name.as_str());
    }
    separated.push_unseparated(")");

    Ok(query.build_query_as::<SkillRow>().fetch_all(&mut *conn).await?)
}

/// Names linked to `application_id` in `category`, alphabetically.
pub async fn linked_skill_names(
    conn: &mut SqliteConnection,
    application_id: i64,
    category: SkillCategory,
) -> Result<Vec<String>, AppError> {
    Ok(sqlx::query_scalar(
        r#"
        SELECT s.name
        FROM application_skills l
        JOIN skills s ON s.id = l.skill_id
        WHERE l.application_id = ? AND s.is_soft_skill = ?
        ORDER BY s.name
        "#,
    )
    .bind(application_id)
    .bind(category.is_soft())
    .fetch_all(&mut *conn)
    .await?)
}
