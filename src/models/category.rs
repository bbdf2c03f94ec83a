use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
}

impl CreateCategoryRequest {
    pub fn into_category(self, now: DateTime<Utc>) -> Result<Category, validator::ValidationErrors> {
        self.validate()?;
        Ok(Category {
            id: Uuid::new_v4(),
            name: self.name,
            description: self.description,
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_gets_id_and_matching_timestamps() {
        let now = Utc::now();
        let category = CreateCategoryRequest {
            name: "Música".into(),
            description: "Conciertos y festivales".into(),
        }
        .into_category(now)
        .unwrap();

        assert!(!category.id.is_nil());
        assert_eq!(category.created_at, category.updated_at);
        assert_eq!(category.name, "Música");
    }

    #[test]
    fn blank_description_is_rejected() {
        let err = CreateCategoryRequest {
            name: "Teatro".into(),
            description: String::new(),
        }
        .into_category(Utc::now())
        .unwrap_err();
        assert!(err.field_errors().contains_key("description"));
    }
}
