//! CRUD over application rows. Every write that carries a
//! skill field goes through the reconciler in the same transaction.

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::info;

use crate::applications::skills::{linked_skill_names, reconcile_skills, split_skill_names};
use crate::db::NEXT_UPDATE_TIME_SQL;
use crate::errors::AppError;
use crate::models::application::{
    parse_apply_time, Application, ApplicationDetail, ApplicationFilter, ApplicationStatus,
    CreateApplicationInput, UpdateApplicationInput,
};
use crate::models::skill::SkillCategory;

const APPLICATION_COLUMNS: &str = "id, company_name, job_title, location, source_url, status, \
     apply_time, create_time, update_time";

/// Store handle passed explicitly to whoever needs it. Cheap to clone.
#[derive(Clone)]
pub struct ApplicationStore {
    pool: SqlitePool,
}

impl ApplicationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: CreateApplicationInput) -> Result<Application, AppError> {
        let company_name = require_company_name(&input.company_name)?;
        let status = parse_status(input.status.as_deref())?.unwrap_or_default();
        let apply_time = input
            .apply_time
            .as_deref()
            .map(validate_apply_time)
            .transpose()?;

        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO applications (company_name, job_title, location, source_url, status, apply_time)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(company_name)
        .bind(normalize_optional(input.job_title))
        .bind(normalize_optional(input.location))
        .bind(normalize_optional(input.source_url))
        .bind(status)
        .bind(apply_time)
        .fetch_one(&mut *tx)
        .await?;

        apply_skill_fields(&mut tx, id, input.soft_skills.as_deref(), input.skills.as_deref())
            .await?;

        let application = fetch_application(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("application {id} vanished")))?;
        tx.commit().await?;

        info!(application_id = id, status = %status, "Created application");
        Ok(application)
    }

    pub async fn get(&self, id: i64) -> Result<Option<Application>, AppError> {
        let mut conn = self.pool.acquire().await?;
        fetch_application(&mut conn, id).await
    }

    /// Application plus linked skill names for both categories.
    pub async fn get_detail(&self, id: i64) -> Result<Option<ApplicationDetail>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let Some(application) = fetch_application(&mut conn, id).await? else {
            return Ok(None);
        };
        let soft_skills = linked_skill_names(&mut conn, id, SkillCategory::Soft).await?;
        let skills = linked_skill_names(&mut conn, id, SkillCategory::Required).await?;

        Ok(Some(ApplicationDetail {
            application,
            soft_skills,
            skills,
        }))
    }

    /// Newest first. `limit`/`offset` apply after ordering and filtering.
    pub async fn list(&self, filter: &ApplicationFilter) -> Result<Vec<Application>, AppError> {
        let status = parse_status(filter.status.as_deref())?;
        let limit = non_negative("limit", filter.limit)?;
        let offset = non_negative("offset", filter.offset)?;

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {APPLICATION_COLUMNS} FROM applications"));
        if let Some(status) = status {
            query.push(" WHERE status = ").push_bind(status);
        }
        query.push(" ORDER BY create_time DESC, id DESC LIMIT ");
        // SQLite treats a negative LIMIT as "no limit".
        query.push_bind(limit.unwrap_or(-1));
        query.push(" OFFSET ").push_bind(offset.unwrap_or(0));

        Ok(query
            .build_query_as::<Application>()
            .fetch_all(&self.pool)
            .await?)
    }

    /// Writes only the fields present in `input`. Returns `None` for an unknown id.
    /// An input with no fields is a plain read and leaves `update_time` alone.
    pub async fn update(
        &self,
        id: i64,
        input: UpdateApplicationInput,
    ) -> Result<Option<Application>, AppError> {
        let company_name = input
            .company_name
            .as_deref()
            .map(require_company_name)
            .transpose()?;
        let status = parse_status(input.status.as_deref())?;
        let apply_time = match input.apply_time.as_ref() {
            Some(Some(raw)) => Some(Some(validate_apply_time(raw)?)),
            Some(None) => Some(None),
            None => None,
        };

        if !input.touches_columns() && !input.touches_skills() {
            return self.get(id).await;
        }

        let mut tx = self.pool.begin().await?;

        // Opens with the write so the transaction takes the write lock up front;
        // a read-first transaction under WAL fails with SQLITE_BUSY instead of waiting.
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "UPDATE applications SET update_time = {NEXT_UPDATE_TIME_SQL}"
        ));
        if let Some(company_name) = company_name {
            query.push(", company_name = ").push_bind(company_name);
        }
        if let Some(job_title) = input.job_title {
            query.push(", job_title = ").push_bind(normalize_optional(job_title));
        }
        if let Some(location) = input.location {
            query.push(", location = ").push_bind(normalize_optional(location));
        }
        if let Some(source_url) = input.source_url {
            query.push(", source_url = ").push_bind(normalize_optional(source_url));
        }
        if let Some(status) = status {
            query.push(", status = ").push_bind(status);
        }
        if let Some(apply_time) = apply_time {
            query.push(", apply_time = ").push_bind(apply_time);
        }
        query.push(" WHERE id = ").push_bind(id);
        let touched = query.build().execute(&mut *tx).await?.rows_affected();
        if touched == 0 {
            return Ok(None);
        }

        apply_skill_fields(&mut tx, id, input.soft_skills.as_deref(), input.skills.as_deref())
            .await?;

        let application = fetch_application(&mut tx, id).await?;
        tx.commit().await?;

        info!(application_id = id, "Updated application");
        Ok(application)
    }

    /// Removes the row; skill links go with it through the foreign-key cascade.
    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let removed = sqlx::query("DELETE FROM applications WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if removed > 0 {
            info!(application_id = id, "Deleted application");
        }
        Ok(removed > 0)
    }
}

async fn fetch_application(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<Application>, AppError> {
    Ok(sqlx::query_as::<_, Application>(&format!(
        "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?)
}

/// Reconciles each category whose raw field was supplied; absent fields are skipped.
async fn apply_skill_fields(
    conn: &mut SqliteConnection,
    application_id: i64,
    soft_skills: Option<&str>,
    skills: Option<&str>,
) -> Result<(), AppError> {
    if let Some(raw) = soft_skills {
        reconcile_skills(
            conn,
            application_id,
            &split_skill_names(raw),
            SkillCategory::Soft,
        )
        .await?;
    }
    if let Some(raw) = skills {
        reconcile_skills(
            conn,
            application_id,
            &split_skill_names(raw),
            SkillCategory::Required,
        )
        .await?;
    }
    Ok(())
}

fn require_company_name(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("companyName is required".to_string()));
    }
    Ok(trimmed.to_string())
}

fn parse_status(raw: Option<&str>) -> Result<Option<ApplicationStatus>, AppError> {
    Ok(raw.map(str::parse::<ApplicationStatus>).transpose()?)
}

fn validate_apply_time(raw: &str) -> Result<chrono::DateTime<chrono::Utc>, AppError> {
    parse_apply_time(raw).ok_or_else(|| {
        AppError::Validation(format!(
            "applyTime '{raw}' must be an RFC 3339 timestamp or YYYY-MM-DD date"
        ))
    })
}

fn non_negative(field: &str, value: Option<i64>) -> Result<Option<i64>, AppError> {
    match value {
        Some(v) if v < 0 => Err(AppError::Validation(format!(
            "{field} must be a non-negative integer"
        ))),
        other => Ok(other),
    }
}

/// Blank optional text is stored as NULL.
fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
