//! Seed the database with sample users, stores and reviews.
//!
//! The YAML file has three lists. Stores and reviews refer to users by
//! email and reviews refer to stores by name:
//!
//! ```yaml
//! users:
//!   - name: Wes Bos
//!     email: wes@example.com
//! stores:
//!   - author_email: wes@example.com
//!     name: Cafe Milano
//!     description: Espresso and pastries.
//!     tags: [Wifi]
//!     address: 1 Bank St, London
//!     lng: -0.09
//!     lat: 51.5
//! reviews:
//!   - store: Cafe Milano
//!     author_email: wes@example.com
//!     rating: 5
//!     text: Great coffee.
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use delicious_core::{StoreId, StoreInput, StoreValidationError, UserId, ValidStore};
use delicious_web::db::{ReviewRepository, StoreRepository, UserRepository};

use super::connect;

/// Contents of a seed file.
#[derive(Debug, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub stores: Vec<SeedStore>,
    #[serde(default)]
    pub reviews: Vec<SeedReview>,
}

#[derive(Debug, Deserialize)]
pub struct SeedUser {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct SeedStore {
    pub author_email: String,
    #[serde(flatten)]
    pub input: StoreInput,
}

impl SeedStore {
    /// Validate the store as written by `author`.
    fn validate_as(&self, author: UserId) -> Result<ValidStore, StoreValidationError> {
        StoreInput {
            author: Some(author),
            ..self.input.clone()
        }
        .validate()
    }
}

#[derive(Debug, Deserialize)]
pub struct SeedReview {
    pub store: String,
    pub author_email: String,
    pub rating: i16,
    #[serde(default)]
    pub text: String,
}

impl SeedFile {
    /// Check cross references and store fields without touching the database.
    ///
    /// Returns one message per problem; an empty list means the file is good.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let emails: Vec<&str> = self.users.iter().map(|u| u.email.as_str()).collect();
        let stores: Vec<&str> = self.stores.iter().map(|s| s.input.name.as_str()).collect();

        for (i, store) in self.stores.iter().enumerate() {
            if stores.iter().take(i).any(|&name| name == store.input.name) {
                errors.push(format!("store {:?}: duplicate name", store.input.name));
            }
            if !emails.contains(&store.author_email.as_str()) {
                errors.push(format!(
                    "store {:?}: unknown author {}",
                    store.input.name, store.author_email
                ));
            }
            // Any id will do; the author is checked by email above.
            if let Err(e) = store.validate_as(UserId::new(1)) {
                for message in e.messages() {
                    errors.push(format!("store {:?}: {message}", store.input.name));
                }
            }
        }

        for review in &self.reviews {
            if !stores.contains(&review.store.as_str()) {
                errors.push(format!("review: unknown store {:?}", review.store));
            }
            if !emails.contains(&review.author_email.as_str()) {
                errors.push(format!("review: unknown author {}", review.author_email));
            }
            if !(1..=5).contains(&review.rating) {
                errors.push(format!(
                    "review of {:?}: rating must be 1 to 5 (got {})",
                    review.store, review.rating
                ));
            }
        }

        errors
    }
}

/// Parse, validate and insert a seed file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or an insert fails.
pub async fn run(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading seed data from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;

    let errors = seed.validate();
    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = connect().await?;
    let users = UserRepository::new(&pool);
    let stores = StoreRepository::new(&pool);
    let reviews = ReviewRepository::new(&pool);

    let mut user_ids: HashMap<&str, UserId> = HashMap::new();
    for user in &seed.users {
        let created = users.create(&user.name, &user.email).await?;
        user_ids.insert(user.email.as_str(), created.id);
    }

    let mut store_ids: HashMap<&str, StoreId> = HashMap::new();
    for store in &seed.stores {
        let author = user_ids
            .get(store.author_email.as_str())
            .copied()
            .ok_or_else(|| format!("unknown author {}", store.author_email))?;
        let valid = store.validate_as(author)?;
        let created = stores.create(&valid).await?;
        info!(slug = %created.slug, "Seeded store");
        store_ids.insert(store.input.name.as_str(), created.id);
    }

    for review in &seed.reviews {
        let (Some(&store), Some(&author)) = (
            store_ids.get(review.store.as_str()),
            user_ids.get(review.author_email.as_str()),
        ) else {
            return Err(format!("dangling review of {:?}", review.store).into());
        };
        reviews
            .create(store, author, review.rating, &review.text)
            .await?;
    }

    info!("Seeding complete!");
    info!("  Users: {}", seed.users.len());
    info!("  Stores: {}", seed.stores.len());
    info!("  Reviews: {}", seed.reviews.len());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = include_str!("../../data/sample.yaml");

    #[test]
    fn test_sample_file_is_valid() {
        let seed: SeedFile = serde_yaml::from_str(SAMPLE).unwrap();
        assert!(!seed.stores.is_empty());
        assert_eq!(seed.validate(), Vec::<String>::new());
    }

    #[test]
    fn test_flattened_store_fields() {
        let seed: SeedFile = serde_yaml::from_str(
            r"
users:
  - { name: Ann, email: ann@example.com }
stores:
  - author_email: ann@example.com
    name: Bean There
    description: Coffee.
    tags: [Wifi, Open Late]
    address: 2 High St
    lng: -0.1
    lat: 51.49
",
        )
        .unwrap();
        let store = seed.stores.first().unwrap();
        assert_eq!(store.input.tags, vec!["Wifi", "Open Late"]);
        assert_eq!(store.input.lat, Some(51.49));
        assert!(seed.validate().is_empty());
    }

    #[test]
    fn test_reports_dangling_references() {
        let seed: SeedFile = serde_yaml::from_str(
            r"
stores:
  - author_email: ghost@example.com
    name: Nowhere
    address: 1 Road
    lng: 0.0
    lat: 0.0
reviews:
  - { store: Somewhere, author_email: ghost@example.com, rating: 7 }
",
        )
        .unwrap();
        let errors = seed.validate();
        assert!(errors.iter().any(|e| e.contains("unknown author ghost@example.com")));
        assert!(errors.iter().any(|e| e.contains("unknown store \"Somewhere\"")));
        assert!(errors.iter().any(|e| e.contains("rating must be 1 to 5")));
    }
}
