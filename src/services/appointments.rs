use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Appointment, AppointmentStatus};
use crate::validation::{self, lenient_i64, lenient_string, FieldErrors, FieldKind, LenientFields};

pub const DEFAULT_DURATION_MINUTES: i64 = 30;

const INVALID_APPOINTMENT: &str = "Invalid appointment payload";
const INVALID_QUERY: &str = "Invalid appointment query";

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    #[validate(
        required(message = "Required"),
        length(min = 1, message = "Organization ID is required")
    )]
    pub organization_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    #[validate(
        required(message = "Required"),
        length(min = 1, message = "User ID is required")
    )]
    pub user_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    #[validate(
        required(message = "Required"),
        length(min = 7, max = 20, message = "Phone number must be 7 to 20 characters")
    )]
    pub contact_phone: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    #[validate(length(max = 120, message = "Name is too long"))]
    pub contact_name: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    #[validate(required(message = "Required"))]
    pub scheduled_at: Option<String>,

    #[serde(default, deserialize_with = "lenient_i64")]
    #[validate(range(min = 5, max = 480, message = "Duration must be between 5 and 480 minutes"))]
    pub duration_minutes: Option<i64>,

    #[serde(default, deserialize_with = "lenient_string")]
    #[validate(length(max = 200, message = "Service is too long"))]
    pub service: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    #[validate(length(max = 1000, message = "Notes are too long"))]
    pub notes: Option<String>,
}

impl LenientFields for CreateAppointmentRequest {
    const FIELDS: &'static [(&'static str, FieldKind)] = &[
        ("organizationId", FieldKind::Text),
        ("userId", FieldKind::Text),
        ("contactPhone", FieldKind::Text),
        ("contactName", FieldKind::Text),
        ("scheduledAt", FieldKind::Text),
        ("durationMinutes", FieldKind::Integer),
        ("service", FieldKind::Text),
        ("notes", FieldKind::Text),
    ];
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FutureAppointmentsRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    #[validate(
        required(message = "Required"),
        length(min = 1, message = "Contact phone is required")
    )]
    pub contact_phone: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    #[validate(
        required(message = "Required"),
        length(min = 1, message = "Organization ID is required")
    )]
    pub organization_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    #[validate(
        required(message = "Required"),
        length(min = 1, message = "User ID is required")
    )]
    pub user_id: Option<String>,
}

impl LenientFields for FutureAppointmentsRequest {
    const FIELDS: &'static [(&'static str, FieldKind)] = &[
        ("contactPhone", FieldKind::Text),
        ("organizationId", FieldKind::Text),
        ("userId", FieldKind::Text),
    ];
}

/// A create request that passed every rule.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub organization_id: String,
    pub user_id: String,
    pub contact_phone: String,
    pub contact_name: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i64,
    pub service: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentLookup {
    pub organization_id: String,
    pub user_id: String,
    pub contact_phone: String,
}

/// Accepts RFC 3339, or `YYYY-MM-DD HH:MM[:SS]` / `YYYY-MM-DDTHH:MM[:SS]`
/// taken as UTC.
pub fn parse_scheduled_at(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    .map(|naive| naive.and_utc())
}

fn is_phone_like(phone: &str) -> bool {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    digits.chars().any(|c| c.is_ascii_digit())
        && digits
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '.' | '(' | ')'))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Validates a create-appointment payload, reporting all failing fields
/// together.
pub fn validate_create(payload: Value) -> Result<NewAppointment, AppError> {
    let (req, mut errors): (CreateAppointmentRequest, _) =
        validation::deserialize_payload(payload, INVALID_APPOINTMENT)?;
    validation::collect_rule_errors(&req, &mut errors);

    if let Some(phone) = req.contact_phone.as_deref() {
        if !phone.is_empty() && !is_phone_like(phone) {
            errors.add("contact_phone", "Phone number contains invalid characters");
        }
    }

    let scheduled_at = match req.scheduled_at.as_deref() {
        Some(raw) => {
            let parsed = parse_scheduled_at(raw);
            if parsed.is_none() {
                errors.add("scheduled_at", "Must be an ISO 8601 date-time");
            }
            parsed
        }
        None => None,
    };

    if !errors.is_empty() {
        return Err(AppError::validation(INVALID_APPOINTMENT, errors));
    }

    match (req.organization_id, req.user_id, req.contact_phone, scheduled_at) {
        (Some(organization_id), Some(user_id), Some(contact_phone), Some(scheduled_at)) => {
            Ok(NewAppointment {
                organization_id,
                user_id,
                contact_phone,
                contact_name: non_empty(req.contact_name),
                scheduled_at,
                duration_minutes: req.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
                service: non_empty(req.service),
                notes: non_empty(req.notes),
            })
        }
        // Required fields were checked above.
        _ => Err(AppError::validation(INVALID_APPOINTMENT, FieldErrors::new())),
    }
}

pub fn validate_lookup(payload: Value) -> Result<AppointmentLookup, AppError> {
    let req: FutureAppointmentsRequest = validation::parse_and_validate(payload, INVALID_QUERY)?;

    match (req.organization_id, req.user_id, req.contact_phone) {
        (Some(organization_id), Some(user_id), Some(contact_phone)) => Ok(AppointmentLookup {
            organization_id,
            user_id,
            contact_phone,
        }),
        _ => Err(AppError::validation(INVALID_QUERY, FieldErrors::new())),
    }
}

/// Writes a new appointment document. Every call creates a fresh record;
/// there is no duplicate detection. Instants are kept to the millisecond,
/// the precision they are stored with.
pub fn create_appointment(
    conn: &Connection,
    new: NewAppointment,
    now: DateTime<Utc>,
) -> anyhow::Result<Appointment> {
    let appointment = Appointment {
        id: uuid::Uuid::new_v4().to_string(),
        organization_id: new.organization_id,
        user_id: new.user_id,
        contact_phone: new.contact_phone,
        contact_name: new.contact_name,
        scheduled_at: new.scheduled_at.trunc_subsecs(3),
        duration_minutes: new.duration_minutes,
        service: new.service,
        notes: new.notes,
        status: AppointmentStatus::Scheduled,
        created_at: now.trunc_subsecs(3),
    };

    queries::create_appointment(conn, &appointment)?;

    tracing::info!(
        appointment_id = %appointment.id,
        organization_id = %appointment.organization_id,
        user_id = %appointment.user_id,
        scheduled_at = %appointment.scheduled_at,
        "appointment created"
    );

    Ok(appointment)
}

pub fn future_appointments(
    conn: &Connection,
    lookup: &AppointmentLookup,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<Appointment>> {
    queries::get_future_appointments(
        conn,
        &lookup.organization_id,
        &lookup.user_id,
        &lookup.contact_phone,
        &now,
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::db;

    fn valid_payload() -> Value {
        json!({
            "organizationId": "org-1",
            "userId": "user-1",
            "contactPhone": "+52 55 1234 5678",
            "contactName": "Ana",
            "scheduledAt": "2030-03-10T15:00:00Z",
            "service": "Consultation"
        })
    }

    fn details(err: AppError) -> FieldErrors {
        match err {
            AppError::Validation { details, .. } => details,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_payload_fills_defaults() {
        let new = validate_create(valid_payload()).unwrap();
        assert_eq!(new.organization_id, "org-1");
        assert_eq!(new.duration_minutes, DEFAULT_DURATION_MINUTES);
        assert_eq!(
            new.scheduled_at,
            Utc.with_ymd_and_hms(2030, 3, 10, 15, 0, 0).unwrap()
        );
        assert_eq!(new.notes, None);
    }

    #[test]
    fn test_every_missing_field_is_reported() {
        let errors = details(validate_create(json!({})).unwrap_err());
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(
            fields,
            vec!["contactPhone", "organizationId", "scheduledAt", "userId"]
        );
    }

    #[test]
    fn test_missing_organization_is_named() {
        let mut payload = valid_payload();
        payload.as_object_mut().unwrap().remove("organizationId");
        let errors = details(validate_create(payload).unwrap_err());
        assert!(errors.get("organizationId").is_some());
        assert_eq!(errors.fields().count(), 1);
    }

    #[test]
    fn test_shape_errors_are_collected_together() {
        let mut payload = valid_payload();
        payload["contactPhone"] = json!("call-me-maybe");
        payload["scheduledAt"] = json!("next tuesday");
        payload["durationMinutes"] = json!(1000);
        payload["userId"] = json!("");

        let errors = details(validate_create(payload).unwrap_err());
        assert!(errors.get("contactPhone").is_some());
        assert!(errors.get("scheduledAt").is_some());
        assert!(errors.get("durationMinutes").is_some());
        assert!(errors.get("userId").is_some());
        assert!(errors.get("organizationId").is_none());
    }

    #[test]
    fn test_numeric_phone_is_accepted() {
        let mut payload = valid_payload();
        payload["contactPhone"] = json!(5215512345678_i64);
        let new = validate_create(payload).unwrap();
        assert_eq!(new.contact_phone, "5215512345678");
    }

    #[test]
    fn test_wrong_typed_field_is_named_with_missing_ones() {
        let errors = details(
            validate_create(json!({
                "organizationId": true,
                "contactPhone": "+15550001111",
                "scheduledAt": "2030-01-01T10:00:00Z"
            }))
            .unwrap_err(),
        );
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(fields, vec!["organizationId", "userId"]);
        assert_eq!(
            errors.get("organizationId"),
            Some(&["Must be a string or number".to_string()][..])
        );
    }

    #[test]
    fn test_object_phone_and_fractional_duration_are_named() {
        let mut payload = valid_payload();
        payload["contactPhone"] = json!({"number": "+15550001111"});
        payload["durationMinutes"] = json!(2.5);
        payload.as_object_mut().unwrap().remove("userId");

        let errors = details(validate_create(payload).unwrap_err());
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(fields, vec!["contactPhone", "durationMinutes", "userId"]);
    }

    #[test]
    fn test_phone_allows_one_leading_plus() {
        assert!(is_phone_like("+5551234"));
        assert!(is_phone_like("5551234"));
        assert!(!is_phone_like("+++5551234"));
        assert!(!is_phone_like("++5551234"));

        let mut payload = valid_payload();
        payload["contactPhone"] = json!("+++5551234");
        let errors = details(validate_create(payload).unwrap_err());
        assert!(errors.get("contactPhone").is_some());
    }

    #[test]
    fn test_parse_scheduled_at_formats() {
        let expected = Utc.with_ymd_and_hms(2030, 3, 10, 15, 0, 0).unwrap();
        assert_eq!(parse_scheduled_at("2030-03-10T15:00:00Z"), Some(expected));
        assert_eq!(parse_scheduled_at("2030-03-10T09:00:00-06:00"), Some(expected));
        assert_eq!(parse_scheduled_at("2030-03-10 15:00"), Some(expected));
        assert_eq!(parse_scheduled_at("2030-03-10T15:00"), Some(expected));
        assert_eq!(parse_scheduled_at("10/03/2030"), None);
    }

    #[test]
    fn test_lookup_requires_all_identifiers() {
        let errors = details(validate_lookup(json!({"contactPhone": "+15550001111"})).unwrap_err());
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(fields, vec!["organizationId", "userId"]);
    }

    #[test]
    fn test_resubmission_creates_two_records() {
        let conn = db::init_db(":memory:").unwrap();
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

        let first = create_appointment(&conn, validate_create(valid_payload()).unwrap(), now).unwrap();
        let second = create_appointment(&conn, validate_create(valid_payload()).unwrap(), now).unwrap();
        assert_ne!(first.id, second.id);

        let lookup = validate_lookup(json!({
            "contactPhone": "+52 55 1234 5678",
            "organizationId": "org-1",
            "userId": "user-1"
        }))
        .unwrap();
        let found = future_appointments(&conn, &lookup, now).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|a| a.status == AppointmentStatus::Scheduled));
    }

    #[test]
    fn test_created_and_queried_instants_match() {
        let conn = db::init_db(":memory:").unwrap();
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut payload = valid_payload();
        payload["scheduledAt"] = json!("2030-01-01T10:00:00.750123Z");

        let created = create_appointment(&conn, validate_create(payload).unwrap(), now).unwrap();
        assert_eq!(created.scheduled_at.timestamp_subsec_millis(), 750);

        let lookup = AppointmentLookup {
            organization_id: "org-1".to_string(),
            user_id: "user-1".to_string(),
            contact_phone: "+52 55 1234 5678".to_string(),
        };
        let found = future_appointments(&conn, &lookup, now).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].scheduled_at, created.scheduled_at);
        assert_eq!(found[0].created_at, created.created_at);
    }
}
