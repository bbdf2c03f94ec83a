use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Lifecycle state of an event. Any state may overwrite any other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Draft,
    Published,
    Cancelled,
    Completed,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::Published => "published",
            EventStatus::Cancelled => "cancelled",
            EventStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown event status '{}' (expected draft, published, cancelled or completed)",
            self.0
        )
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for EventStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(EventStatus::Draft),
            "published" => Ok(EventStatus::Published),
            "cancelled" => Ok(EventStatus::Cancelled),
            "completed" => Ok(EventStatus::Completed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category_id: Uuid,
    pub location: String,
    pub date: DateTime<Utc>,
    pub capacity: i64,
    pub price: f64,
    pub status: EventStatus,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /events`. Fields absent from the JSON deserialize to their
/// zero value and are then rejected by validation.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_event_date"))]
pub struct CreateEventRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    #[validate(custom(function = "validate_identifier"))]
    pub category_id: Uuid,
    #[validate(length(min = 1, message = "location is required"))]
    pub location: String,
    pub date: Option<DateTime<Utc>>,
    #[validate(range(min = 1, message = "capacity must be greater than zero"))]
    pub capacity: i64,
    #[validate(custom(function = "validate_price"))]
    pub price: f64,
    pub image_url: String,
}

impl CreateEventRequest {
    /// Builds a fresh `draft` event. Id and both timestamps are assigned here.
    pub fn into_event(self, now: DateTime<Utc>) -> Result<Event, validator::ValidationErrors> {
        self.validate()?;
        let date = self.date.unwrap_or(now);
        Ok(Event {
            id: Uuid::new_v4(),
            name: self.name,
            description: self.description,
            category_id: self.category_id,
            location: self.location,
            date,
            capacity: self.capacity,
            price: round_price(self.price),
            status: EventStatus::Draft,
            image_url: self.image_url,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Sparse body of `PUT /events/{id}`.
///
/// Presence follows the zero-sentinel rule: an empty string, the nil uuid,
/// the zero timestamp and a non-positive number all mean "not supplied",
/// exactly like an omitted field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EventPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub location: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub capacity: Option<i64>,
    pub price: Option<f64>,
    #[serde(deserialize_with = "deserialize_status")]
    pub status: Option<EventStatus>,
    pub image_url: Option<String>,
}

/// `""` and `null` both mean "keep the stored status".
fn deserialize_status<'de, D>(deserializer: D) -> Result<Option<EventStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// The zero instant of the clients this API grew up with
/// (`0001-01-01T00:00:00Z`), treated as "no date".
pub fn zero_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub fn is_zero_timestamp(ts: &DateTime<Utc>) -> bool {
    *ts == zero_timestamp()
}

/// Prices are kept to cents so the two-decimal stored text decodes back to
/// the same value.
pub fn round_price(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}

fn validate_identifier(id: &Uuid) -> Result<(), ValidationError> {
    if id.is_nil() {
        let mut err = ValidationError::new("required");
        err.message = Some("category_id is required".into());
        return Err(err);
    }
    Ok(())
}

/// Checked after rounding to cents, so a positive sub-cent price that would
/// be stored as zero is rejected.
fn validate_price(price: f64) -> Result<(), ValidationError> {
    if round_price(price) > 0.0 {
        return Ok(());
    }
    let mut err = ValidationError::new("range");
    err.message = Some("price must be at least 0.01".into());
    Err(err)
}

fn validate_event_date(req: &CreateEventRequest) -> Result<(), ValidationError> {
    match req.date {
        Some(ref date) if !is_zero_timestamp(date) => Ok(()),
        _ => {
            let mut err = ValidationError::new("date");
            err.message = Some("date is required".into());
            Err(err)
        }
    }
}
