//! Persistence adapter for finished lookups.
//!
//! Translates a [`SweepMatch`](crate::lookup::SweepMatch) into the `lookups`
//! table and serves the reminder queries. The lookup core never sees this
//! schema; only fully resolved lookups are recorded.

use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::dataset::Point;
use crate::lookup::SweepMatch;

pub async fn record_lookup(
    pool: &SqlitePool,
    phone_number: &str,
    point: Point,
    m: &SweepMatch,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO lookups (
            phone_number, latitude, longitude,
            street, from_cross, to_cross, block_side, segment_id,
            next_sweep_date, from_hour, to_hour, days_until_sweep,
            created_at, notified
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, datetime('now'), 0)
        "#,
    )
    .bind(phone_number)
    .bind(point.lat)
    .bind(point.lon)
    .bind(&m.street)
    .bind(&m.from_cross)
    .bind(&m.to_cross)
    .bind(m.side.as_str())
    .bind(&m.segment_id)
    .bind(m.next_sweep.date.to_string())
    .bind(m.from_hour as i64)
    .bind(m.to_hour as i64)
    .bind(m.next_sweep.days_until as i64)
    .execute(pool)
    .await?;
    Ok(())
}

/// A lookup record due for a reminder.
#[derive(Debug, sqlx::FromRow)]
pub struct DueReminder {
    pub id: i64,
    pub phone_number: String,
    pub street: String,
    pub next_sweep_date: String,
    pub from_hour: i64,
    pub to_hour: i64,
}

/// The most recent un-notified lookup per caller whose next sweep falls on
/// `date`. Older lookups for the same caller are superseded, not reminded.
pub async fn due_reminders(
    pool: &SqlitePool,
    date: NaiveDate,
) -> Result<Vec<DueReminder>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT id, phone_number, street, next_sweep_date, from_hour, to_hour
        FROM lookups
        WHERE notified = 0
          AND next_sweep_date = ?
          AND id IN (SELECT MAX(id) FROM lookups GROUP BY phone_number)
        ORDER BY id
        "#,
    )
    .bind(date.to_string())
    .fetch_all(pool)
    .await
}

pub async fn mark_notified(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE lookups SET notified = 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
