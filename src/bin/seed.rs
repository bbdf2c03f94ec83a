//! Loads a fixed set of categories and events into the configured store.
//!
//! Ids are fixed, so running it again overwrites the same records.

use anyhow::Context;
use chrono::{Duration, Utc};
use tracing::{error, info};
use uuid::Uuid;

use event_catalog::{
    config::Config,
    models::{Category, Event, EventStatus},
    Backends,
};

struct CategoryFixture {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    age_days: i64,
}

struct EventFixture {
    id: &'static str,
    category: &'static str,
    name: &'static str,
    description: &'static str,
    location: &'static str,
    days_ahead: i64,
    capacity: i64,
    price: f64,
    image: &'static str,
    age_days: i64,
}

const CATEGORIES: &[CategoryFixture] = &[
    CategoryFixture {
        id: "550e8400-e29b-41d4-a716-446655440001",
        name: "Música",
        description: "Eventos musicales, conciertos y festivales",
        age_days: 7,
    },
    CategoryFixture {
        id: "550e8400-e29b-41d4-a716-446655440002",
        name: "Teatro",
        description: "Obras de teatro, musicales y presentaciones escénicas",
        age_days: 6,
    },
    CategoryFixture {
        id: "550e8400-e29b-41d4-a716-446655440003",
        name: "Deportes",
        description: "Eventos deportivos, partidos y competiciones",
        age_days: 5,
    },
    CategoryFixture {
        id: "550e8400-e29b-41d4-a716-446655440004",
        name: "Cine",
        description: "Estrenos de películas, festivales de cine y proyecciones especiales",
        age_days: 4,
    },
    CategoryFixture {
        id: "550e8400-e29b-41d4-a716-446655440005",
        name: "Tecnología",
        description: "Conferencias tecnológicas, hackathons y eventos de innovación",
        age_days: 3,
    },
];

const EVENTS: &[EventFixture] = &[
    EventFixture {
        id: "550e8400-e29b-41d4-a716-446655440101",
        category: "550e8400-e29b-41d4-a716-446655440001",
        name: "Concierto de Rock en el Parque",
        description: "Un increíble concierto de rock al aire libre con las mejores bandas del momento",
        location: "Parque Central",
        days_ahead: 45,
        capacity: 5000,
        price: 75.00,
        image: "https://example.com/images/rock-concert.jpg",
        age_days: 30,
    },
    EventFixture {
        id: "550e8400-e29b-41d4-a716-446655440102",
        category: "550e8400-e29b-41d4-a716-446655440002",
        name: "Hamlet - Obra de Teatro Clásica",
        description: "La famosa obra de Shakespeare presentada por la compañía nacional de teatro",
        location: "Teatro Nacional",
        days_ahead: 10,
        capacity: 800,
        price: 45.00,
        image: "https://example.com/images/hamlet.jpg",
        age_days: 20,
    },
    EventFixture {
        id: "550e8400-e29b-41d4-a716-446655440103",
        category: "550e8400-e29b-41d4-a716-446655440003",
        name: "Final de Liga - Fútbol",
        description: "La gran final de la liga local entre los dos mejores equipos",
        location: "Estadio Municipal",
        days_ahead: 5,
        capacity: 25000,
        price: 30.00,
        image: "https://example.com/images/football-final.jpg",
        age_days: 15,
    },
    EventFixture {
        id: "550e8400-e29b-41d4-a716-446655440104",
        category: "550e8400-e29b-41d4-a716-446655440004",
        name: "Estreno Mundial - Nueva Película",
        description: "El estreno mundial de la nueva película de acción y aventura",
        location: "Cine Multiplex",
        days_ahead: 3,
        capacity: 300,
        price: 12.00,
        image: "https://example.com/images/movie-premiere.jpg",
        age_days: 10,
    },
    EventFixture {
        id: "550e8400-e29b-41d4-a716-446655440105",
        category: "550e8400-e29b-41d4-a716-446655440005",
        name: "Conferencia de Tecnología",
        description: "La conferencia más importante del año sobre las últimas tendencias en tecnología",
        location: "Centro de Convenciones",
        days_ahead: 60,
        capacity: 1000,
        price: 150.00,
        image: "https://example.com/images/tech-conference.jpg",
        age_days: 5,
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.app.rust_log))
        .init();

    let backends = Backends::connect(&config)
        .await
        .context("Failed to connect to the backing store")?;
    backends.provision(&config).await?;

    let now = Utc::now();
    info!("Loading {} categories", CATEGORIES.len());
    for fixture in CATEGORIES {
        let created = now - Duration::days(fixture.age_days);
        let category = Category {
            id: Uuid::parse_str(fixture.id)?,
            name: fixture.name.to_string(),
            description: fixture.description.to_string(),
            created_at: created,
            updated_at: created,
        };
        match backends.categories.put(&category).await {
            Ok(()) => info!("Category '{}' stored", category.name),
            Err(e) => error!("Failed to store category '{}': {}", category.name, e),
        }
    }

    info!("Loading {} events", EVENTS.len());
    for fixture in EVENTS {
        let created = now - Duration::days(fixture.age_days);
        let event = Event {
            id: Uuid::parse_str(fixture.id)?,
            name: fixture.name.to_string(),
            description: fixture.description.to_string(),
            category_id: Uuid::parse_str(fixture.category)?,
            location: fixture.location.to_string(),
            date: now + Duration::days(fixture.days_ahead),
            capacity: fixture.capacity,
            price: fixture.price,
            status: EventStatus::Published,
            image_url: fixture.image.to_string(),
            created_at: created,
            updated_at: created,
        };
        match backends.events.put(&event).await {
            Ok(()) => info!("Event '{}' stored (${:.2})", event.name, event.price),
            Err(e) => error!("Failed to store event '{}': {}", event.name, e),
        }
    }

    info!("Fixtures loaded");
    Ok(())
}
