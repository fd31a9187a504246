//! # Staff Repository
//!
//! Read-only staff lookups for the sale engine, plus insert for seeding.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use vitrina_core::Staff;

#[derive(Debug, Clone)]
pub struct StaffRepository {
    pool: SqlitePool,
}

impl StaffRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StaffRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Staff>> {
        let staff: Option<Staff> =
            sqlx::query_as("SELECT id, name, role, salary_type, is_active FROM staff WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(staff)
    }

    pub async fn insert(&self, staff: &Staff) -> DbResult<Staff> {
        debug!(id = %staff.id, role = ?staff.role, "Inserting staff member");

        sqlx::query(
            "INSERT INTO staff (id, name, role, salary_type, is_active, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&staff.id)
        .bind(&staff.name)
        .bind(staff.role)
        .bind(staff.salary_type)
        .bind(staff.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(staff.clone())
    }
}
