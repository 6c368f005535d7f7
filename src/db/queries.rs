use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{Appointment, AppointmentStatus, SubscriptionStatus, User, UserRole};

// Instants are stored as Unix epoch milliseconds so that SQL comparisons are
// numeric.
fn to_millis(ts: &DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

fn from_millis(millis: i64) -> anyhow::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| anyhow::anyhow!("stored timestamp out of range: {millis}"))
}

// ── Appointments ──

pub fn create_appointment(conn: &Connection, appt: &Appointment) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO appointments (id, organization_id, user_id, contact_phone, contact_name, scheduled_at, duration_minutes, service, notes, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            appt.id,
            appt.organization_id,
            appt.user_id,
            appt.contact_phone,
            appt.contact_name,
            to_millis(&appt.scheduled_at),
            appt.duration_minutes,
            appt.service,
            appt.notes,
            appt.status.as_str(),
            to_millis(&appt.created_at),
        ],
    )?;
    Ok(())
}

/// Appointments for one contact of one user in one organization that start
/// at or after `now`, skipping cancelled ones.
pub fn get_future_appointments(
    conn: &Connection,
    organization_id: &str,
    user_id: &str,
    contact_phone: &str,
    now: &DateTime<Utc>,
) -> anyhow::Result<Vec<Appointment>> {
    let mut stmt = conn.prepare(
        "SELECT id, organization_id, user_id, contact_phone, contact_name, scheduled_at, duration_minutes, service, notes, status, created_at
         FROM appointments
         WHERE organization_id = ?1 AND user_id = ?2 AND contact_phone = ?3
           AND scheduled_at >= ?4 AND status != 'cancelled'
         ORDER BY scheduled_at ASC",
    )?;

    let rows = stmt.query_map(
        params![organization_id, user_id, contact_phone, to_millis(now)],
        |row| Ok(parse_appointment_row(row)),
    )?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

pub fn count_appointments(conn: &Connection, organization_id: &str) -> anyhow::Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM appointments WHERE organization_id = ?1",
        params![organization_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn parse_appointment_row(row: &rusqlite::Row) -> anyhow::Result<Appointment> {
    let scheduled_at: i64 = row.get(5)?;
    let status: String = row.get(9)?;
    let created_at: i64 = row.get(10)?;

    Ok(Appointment {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        user_id: row.get(2)?,
        contact_phone: row.get(3)?,
        contact_name: row.get(4)?,
        scheduled_at: from_millis(scheduled_at)?,
        duration_minutes: row.get(6)?,
        service: row.get(7)?,
        notes: row.get(8)?,
        status: AppointmentStatus::parse(&status),
        created_at: from_millis(created_at)?,
    })
}

// ── Users ──

pub fn get_user(conn: &Connection, id: &str) -> anyhow::Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, organization_id, role, subscription_status, display_name, email, created_at
             FROM users WHERE id = ?1",
            params![id],
            |row| Ok(parse_user_row(row)),
        )
        .optional()?;

    user.transpose()
}

pub fn save_user(conn: &Connection, user: &User) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO users (id, organization_id, role, subscription_status, display_name, email, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
           organization_id = excluded.organization_id,
           role = excluded.role,
           subscription_status = excluded.subscription_status,
           display_name = excluded.display_name,
           email = excluded.email",
        params![
            user.id,
            user.organization_id,
            user.role.as_str(),
            user.subscription_status.as_str(),
            user.display_name,
            user.email,
            to_millis(&user.created_at),
        ],
    )?;
    Ok(())
}

/// Returns whether a document was removed.
pub fn delete_user(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn list_users_in_organization(
    conn: &Connection,
    organization_id: &str,
) -> anyhow::Result<Vec<User>> {
    let mut stmt = conn.prepare(
        "SELECT id, organization_id, role, subscription_status, display_name, email, created_at
         FROM users WHERE organization_id = ?1 ORDER BY display_name ASC, id ASC",
    )?;

    let rows = stmt.query_map(params![organization_id], |row| Ok(parse_user_row(row)))?;

    let mut users = vec![];
    for row in rows {
        users.push(row??);
    }
    Ok(users)
}

fn parse_user_row(row: &rusqlite::Row) -> anyhow::Result<User> {
    let role: String = row.get(2)?;
    let subscription_status: String = row.get(3)?;
    let created_at: i64 = row.get(6)?;

    Ok(User {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        role: UserRole::parse(&role),
        subscription_status: SubscriptionStatus::from(subscription_status),
        display_name: row.get(4)?,
        email: row.get(5)?,
        created_at: from_millis(created_at)?,
    })
}
