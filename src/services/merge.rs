//! merge.rs
//!
//! Partial updates for events. A patch is applied field by field against the
//! stored record; each field is replaced only when the patch carries a
//! "present" value under the zero-sentinel rule:
//!
//! - text and status: non-empty
//! - category reference: not the nil uuid
//! - event date: not the zero timestamp
//! - capacity and price: strictly greater than zero
//!
//! Setting capacity or price to exactly `0` through a patch is therefore
//! impossible; such a value is read as "omitted" and the stored number stays.
//! A positive price below one cent is present and is stored rounded to cents.
//!
//! `id` and `created_at` are never touched. `updated_at` is always moved to
//! the merge time, even when nothing else changed.

use chrono::{DateTime, Utc};

use crate::models::event::{is_zero_timestamp, round_price};
use crate::models::{Event, EventPatch};

pub fn merge_event(mut existing: Event, patch: &EventPatch, now: DateTime<Utc>) -> Event {
    replace_text(&mut existing.name, &patch.name);
    replace_text(&mut existing.description, &patch.description);
    replace_text(&mut existing.location, &patch.location);
    replace_text(&mut existing.image_url, &patch.image_url);

    if let Some(category_id) = patch.category_id.filter(|id| !id.is_nil()) {
        existing.category_id = category_id;
    }
    if let Some(date) = patch.date.filter(|d| !is_zero_timestamp(d)) {
        existing.date = date;
    }
    if let Some(capacity) = patch.capacity.filter(|c| *c > 0) {
        existing.capacity = capacity;
    }
    // presence is decided on the value sent, rounding happens after
    if let Some(price) = patch.price.filter(|p| *p > 0.0) {
        existing.price = round_price(price);
    }
    if let Some(status) = patch.status {
        existing.status = status;
    }

    // updated_at >= created_at even if the clock stepped backwards
    existing.updated_at = now.max(existing.created_at);
    existing
}

fn replace_text(target: &mut String, incoming: &Option<String>) {
    if let Some(value) = incoming.as_deref().filter(|v| !v.is_empty()) {
        *target = value.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::zero_timestamp;
    use crate::models::EventStatus;
    use chrono::Duration;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn stored_event() -> Event {
        let created = Utc::now() - Duration::days(3);
        Event {
            id: Uuid::new_v4(),
            name: "Concierto de Rock en el Parque".into(),
            description: "Rock al aire libre".into(),
            category_id: Uuid::new_v4(),
            location: "Parque Central".into(),
            date: created + Duration::days(45),
            capacity: 5000,
            price: 75.0,
            status: EventStatus::Draft,
            image_url: "https://example.com/images/rock-concert.jpg".into(),
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn empty_patch_only_moves_updated_at() {
        let existing = stored_event();
        let now = Utc::now();
        let merged = merge_event(existing.clone(), &EventPatch::default(), now);

        assert_eq!(merged.updated_at, now);
        assert_eq!(
            Event { updated_at: existing.updated_at, ..merged },
            existing
        );
    }

    #[test]
    fn zero_sentinels_are_ignored() {
        let existing = stored_event();
        let patch = EventPatch {
            name: Some(String::new()),
            description: Some(String::new()),
            category_id: Some(Uuid::nil()),
            location: Some(String::new()),
            date: Some(zero_timestamp()),
            capacity: Some(0),
            price: Some(0.0),
            status: None,
            image_url: Some(String::new()),
        };
        let merged = merge_event(existing.clone(), &patch, Utc::now());
        assert_eq!(
            Event { updated_at: existing.updated_at, ..merged },
            existing
        );
    }

    #[test]
    fn positive_sub_cent_price_still_replaces() {
        let existing = stored_event();
        let patch = EventPatch {
            price: Some(0.004),
            ..EventPatch::default()
        };
        let merged = merge_event(existing, &patch, Utc::now());
        assert_eq!(merged.price, 0.0);

        let patch = EventPatch {
            price: Some(19.999),
            ..EventPatch::default()
        };
        assert_eq!(merge_event(stored_event(), &patch, Utc::now()).price, 20.0);
    }

    // Known limitation: a patch cannot set capacity or price to zero.
    #[test]
    fn capacity_or_price_of_zero_keeps_the_stored_value() {
        let existing = stored_event();
        let patch = EventPatch {
            capacity: Some(0),
            price: Some(0.0),
            ..EventPatch::default()
        };
        let merged = merge_event(existing.clone(), &patch, Utc::now());
        assert_eq!(merged.capacity, 5000);
        assert_eq!(merged.price, 75.0);
    }

    #[test]
    fn negative_numbers_are_treated_as_absent() {
        let existing = stored_event();
        let patch = EventPatch {
            capacity: Some(-10),
            price: Some(-1.5),
            ..EventPatch::default()
        };
        let merged = merge_event(existing.clone(), &patch, Utc::now());
        assert_eq!(merged.capacity, existing.capacity);
        assert_eq!(merged.price, existing.price);
    }

    #[test]
    fn status_only_patch_publishes() {
        let existing = stored_event();
        let patch = EventPatch {
            status: Some(EventStatus::Published),
            ..EventPatch::default()
        };
        let merged = merge_event(existing.clone(), &patch, Utc::now());
        assert_eq!(merged.status, EventStatus::Published);
        assert_eq!(merged.capacity, existing.capacity);
        assert_eq!(merged.price, existing.price);
        assert!(merged.updated_at > existing.updated_at);
    }

    #[test]
    fn any_status_can_overwrite_any_other() {
        let mut existing = stored_event();
        existing.status = EventStatus::Cancelled;
        let patch = EventPatch {
            status: Some(EventStatus::Draft),
            ..EventPatch::default()
        };
        assert_eq!(merge_event(existing, &patch, Utc::now()).status, EventStatus::Draft);
    }

    #[test]
    fn clock_behind_created_at_still_satisfies_ordering() {
        let existing = stored_event();
        let merged = merge_event(
            existing.clone(),
            &EventPatch::default(),
            existing.created_at - Duration::hours(1),
        );
        assert_eq!(merged.updated_at, existing.created_at);
    }

    fn arb_text() -> impl Strategy<Value = Option<String>> {
        prop_oneof![Just(None), Just(Some(String::new())), "[a-zA-Z ]{1,24}".prop_map(Some)]
    }

    proptest! {
        #[test]
        fn merge_never_touches_identity(
            name in arb_text(),
            location in arb_text(),
            capacity in proptest::option::of(-100i64..10_000),
            price in proptest::option::of(-50.0f64..500.0),
            use_category in any::<bool>(),
        ) {
            let existing = stored_event();
            let patch = EventPatch {
                name: name.clone(),
                location,
                capacity,
                price,
                category_id: use_category.then(Uuid::new_v4),
                ..EventPatch::default()
            };
            let merged = merge_event(existing.clone(), &patch, Utc::now());

            prop_assert_eq!(merged.id, existing.id);
            prop_assert_eq!(merged.created_at, existing.created_at);
            prop_assert!(merged.updated_at >= merged.created_at);

            match name.as_deref() {
                Some(n) if !n.is_empty() => prop_assert_eq!(&merged.name, n),
                _ => prop_assert_eq!(&merged.name, &existing.name),
            }
            match capacity {
                Some(c) if c > 0 => prop_assert_eq!(merged.capacity, c),
                _ => prop_assert_eq!(merged.capacity, existing.capacity),
            }
            match price {
                Some(p) if p > 0.0 => prop_assert_eq!(merged.price, round_price(p)),
                _ => prop_assert_eq!(merged.price, existing.price),
            }
        }
    }
}
