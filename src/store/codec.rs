//! codec.rs
//!
//! Translation between typed records and stored attribute maps. This is the
//! only place that knows the textual encoding shared with existing data:
//!
//! - ids: hyphenated lowercase uuid
//! - timestamps: RFC3339 in UTC with a `Z` suffix
//! - capacity: integer text, price: decimal text with two fraction digits
//! - status: lowercase name

use chrono::{DateTime, SecondsFormat, Utc};
use std::str::FromStr;
use uuid::Uuid;

use super::{Item, StoreError};
use crate::models::{Category, Event, EventStatus};

pub trait Record: Sized + Send + Sync + 'static {
    fn id(&self) -> Uuid;
    fn encode(&self) -> Item;
    fn decode(item: &Item) -> Result<Self, StoreError>;
}

impl Record for Event {
    fn id(&self) -> Uuid {
        self.id
    }

    fn encode(&self) -> Item {
        Item::from([
            ("id".to_string(), self.id.to_string()),
            ("name".to_string(), self.name.clone()),
            ("description".to_string(), self.description.clone()),
            ("category_id".to_string(), self.category_id.to_string()),
            ("location".to_string(), self.location.clone()),
            ("date".to_string(), encode_timestamp(&self.date)),
            ("capacity".to_string(), self.capacity.to_string()),
            ("price".to_string(), format!("{:.2}", self.price)),
            ("status".to_string(), self.status.as_str().to_string()),
            ("image_url".to_string(), self.image_url.clone()),
            ("created_at".to_string(), encode_timestamp(&self.created_at)),
            ("updated_at".to_string(), encode_timestamp(&self.updated_at)),
        ])
    }

    fn decode(item: &Item) -> Result<Self, StoreError> {
        let status = match item.get("status").map(String::as_str) {
            None | Some("") => EventStatus::Draft,
            Some(raw) => raw.parse::<EventStatus>().map_err(|e| StoreError::Corrupt {
                field: "status",
                reason: e.to_string(),
            })?,
        };

        Ok(Event {
            id: parse(item, "id")?,
            name: text(item, "name"),
            description: text(item, "description"),
            category_id: parse(item, "category_id")?,
            location: text(item, "location"),
            date: timestamp(item, "date")?,
            capacity: parse(item, "capacity")?,
            price: parse(item, "price")?,
            status,
            image_url: text(item, "image_url"),
            created_at: timestamp(item, "created_at")?,
            updated_at: timestamp(item, "updated_at")?,
        })
    }
}

impl Record for Category {
    fn id(&self) -> Uuid {
        self.id
    }

    fn encode(&self) -> Item {
        Item::from([
            ("id".to_string(), self.id.to_string()),
            ("name".to_string(), self.name.clone()),
            ("description".to_string(), self.description.clone()),
            ("created_at".to_string(), encode_timestamp(&self.created_at)),
            ("updated_at".to_string(), encode_timestamp(&self.updated_at)),
        ])
    }

    fn decode(item: &Item) -> Result<Self, StoreError> {
        Ok(Category {
            id: parse(item, "id")?,
            name: text(item, "name"),
            description: text(item, "description"),
            created_at: timestamp(item, "created_at")?,
            updated_at: timestamp(item, "updated_at")?,
        })
    }
}

pub fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn text(item: &Item, field: &str) -> String {
    item.get(field).cloned().unwrap_or_default()
}

fn raw<'a>(item: &'a Item, field: &'static str) -> Result<&'a str, StoreError> {
    item.get(field).map(String::as_str).ok_or(StoreError::Corrupt {
        field,
        reason: "attribute is missing".to_string(),
    })
}

fn parse<T>(item: &Item, field: &'static str) -> Result<T, StoreError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw(item, field)?.parse().map_err(|e: T::Err| StoreError::Corrupt {
        field,
        reason: e.to_string(),
    })
}

fn timestamp(item: &Item, field: &'static str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw(item, field)?)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt {
            field,
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sample_event() -> Event {
        let created = Utc.with_ymd_and_hms(2024, 7, 1, 12, 30, 0).unwrap();
        Event {
            id: Uuid::parse_str("550e8400-e29b-41d4-a716-446655440101").unwrap(),
            name: "Hamlet - Obra de Teatro Clásica".into(),
            description: "La famosa obra de Shakespeare".into(),
            category_id: Uuid::parse_str("550e8400-e29b-41d4-a716-446655440002").unwrap(),
            location: "Teatro Nacional".into(),
            date: created + Duration::days(10),
            capacity: 800,
            price: 45.0,
            status: EventStatus::Published,
            image_url: "https://example.com/images/hamlet.jpg".into(),
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn event_attributes_use_textual_encoding() {
        let item = sample_event().encode();
        assert_eq!(item["id"], "550e8400-e29b-41d4-a716-446655440101");
        assert_eq!(item["date"], "2024-07-11T12:30:00Z");
        assert_eq!(item["capacity"], "800");
        assert_eq!(item["price"], "45.00");
        assert_eq!(item["status"], "published");
        assert_eq!(item["created_at"], "2024-07-01T12:30:00Z");
    }

    #[test]
    fn sub_second_timestamps_survive_storage() {
        let mut event = sample_event();
        event.updated_at = event.created_at + Duration::milliseconds(1234);
        let decoded = Event::decode(&event.encode()).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn decodes_items_written_by_other_clients() {
        let item = Item::from([
            ("id".to_string(), "550e8400-e29b-41d4-a716-446655440103".to_string()),
            ("name".to_string(), "Final de Liga".to_string()),
            ("category_id".to_string(), "550e8400-e29b-41d4-a716-446655440003".to_string()),
            ("date".to_string(), "2024-08-15T19:00:00-05:00".to_string()),
            ("capacity".to_string(), "25000".to_string()),
            ("price".to_string(), "30.00".to_string()),
            ("created_at".to_string(), "2024-07-01T00:00:00Z".to_string()),
            ("updated_at".to_string(), "2024-07-01T00:00:00Z".to_string()),
        ]);
        let event = Event::decode(&item).unwrap();
        assert_eq!(event.date, Utc.with_ymd_and_hms(2024, 8, 16, 0, 0, 0).unwrap());
        assert_eq!(event.status, EventStatus::Draft);
        assert_eq!(event.description, "");
        assert_eq!(event.price, 30.0);
    }

    #[test]
    fn malformed_attribute_names_the_field() {
        let mut item = sample_event().encode();
        item.insert("capacity".into(), "lots".into());
        match Event::decode(&item) {
            Err(StoreError::Corrupt { field, .. }) => assert_eq!(field, "capacity"),
            other => panic!("expected corrupt capacity, got {:?}", other),
        }

        let mut item = sample_event().encode();
        item.remove("created_at");
        assert!(matches!(
            Event::decode(&item),
            Err(StoreError::Corrupt { field: "created_at", .. })
        ));
    }

    #[test]
    fn category_round_trips() {
        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4(),
            name: "Cine".into(),
            description: "Estrenos de películas".into(),
            created_at: now,
            updated_at: now,
        };
        assert_eq!(Category::decode(&category.encode()).unwrap(), category);
    }
}
