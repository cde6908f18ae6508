//! Repository queries against a migrated `PostgreSQL` database.
//!
//! Each test creates its own users and uniquely named stores, so the tests
//! can share a database with the sample data and with each other.
//!
//! Run with: `DELICIOUS_DATABASE_URL=... cargo test -p delicious-integration-tests -- --ignored`

use delicious_core::{
    GeoPoint, HeartAction, Pagination, RatingSummary, Slug, StoreInput, TagCount, UserId,
    ValidStore,
};
use delicious_integration_tests::{test_pool, unique_name};
use delicious_web::db::stores::{NEAR_RADIUS_METERS, TOP_LIMIT};
use delicious_web::db::{HeartRepository, ReviewRepository, StoreRepository, UserRepository};
use sqlx::PgPool;

async fn create_user(pool: &PgPool) -> UserId {
    let name = unique_name("user");
    let email = format!("{}@example.com", name.replace(' ', "-"));
    UserRepository::new(pool)
        .create(&name, &email)
        .await
        .expect("Failed to create user")
        .id
}

fn store_input(name: &str, author: UserId) -> StoreInput {
    StoreInput {
        name: name.to_string(),
        description: "Test store".to_string(),
        tags: vec!["Wifi".to_string()],
        address: "1 Test St".to_string(),
        lng: Some(-0.09),
        lat: Some(51.5),
        photo: None,
        author: Some(author),
    }
}

fn valid_store(name: &str, author: UserId) -> ValidStore {
    store_input(name, author).validate().expect("valid store input")
}

async fn tag_occurrences(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COALESCE(SUM(cardinality(tags)), 0)::bigint FROM stores")
        .fetch_one(pool)
        .await
        .expect("tag total")
}

/// Histogram plus the tag total it was read against. Other tests insert
/// stores concurrently, so retry until the total holds still across the read.
async fn settled_tag_list(pool: &PgPool) -> (Vec<TagCount>, i64) {
    for _ in 0..5 {
        let before = tag_occurrences(pool).await;
        let tags = StoreRepository::new(pool).tag_list().await.expect("tags");
        if tag_occurrences(pool).await == before {
            return (tags, before);
        }
    }
    panic!("stores kept changing while the tag histogram was read");
}

/// Summary computed from the raw review rows of one store.
async fn review_summary(pool: &PgPool, slug: &Slug) -> RatingSummary {
    let ratings: Vec<i16> = sqlx::query_scalar(
        "SELECT r.rating FROM reviews r JOIN stores s ON s.id = r.store_id WHERE s.slug = $1",
    )
    .bind(slug.as_str())
    .fetch_all(pool)
    .await
    .expect("ratings");
    RatingSummary::from_ratings(&ratings).expect("store has reviews")
}

#[tokio::test]
#[ignore = "Requires migrated database"]
async fn test_same_name_gets_numbered_slug() {
    let pool = test_pool().await;
    let (a, b) = (create_user(&pool).await, create_user(&pool).await);
    let stores = StoreRepository::new(&pool);
    let name = unique_name("Cafe Milano");

    let first = stores.create(&valid_store(&name, a)).await.expect("first");
    let second = stores.create(&valid_store(&name, b)).await.expect("second");

    let base = Slug::from_name(&name);
    assert_eq!(first.slug, base);
    assert_eq!(second.slug.as_str(), format!("{base}-2"));
}

#[tokio::test]
#[ignore = "Requires migrated database"]
async fn test_update_keeps_slug_unless_renamed() {
    let pool = test_pool().await;
    let author = create_user(&pool).await;
    let stores = StoreRepository::new(&pool);
    let name = unique_name("Bean There");

    let created = stores.create(&valid_store(&name, author)).await.expect("create");

    let mut edit = valid_store(&name, author);
    edit.description = "New description".to_string();
    let updated = stores.update(created.id, &edit).await.expect("update");
    assert_eq!(updated.slug, created.slug);
    assert_eq!(updated.description, "New description");

    let renamed_to = unique_name("Bean Here");
    let renamed = stores
        .update(created.id, &valid_store(&renamed_to, author))
        .await
        .expect("rename");
    assert_eq!(renamed.slug, Slug::from_name(&renamed_to));
}

#[tokio::test]
#[ignore = "Requires migrated database"]
async fn test_rename_into_taken_name_is_numbered() {
    let pool = test_pool().await;
    let author = create_user(&pool).await;
    let stores = StoreRepository::new(&pool);
    let taken = unique_name("Noodle Bar");

    let first = stores.create(&valid_store(&taken, author)).await.expect("first");
    let other = stores
        .create(&valid_store(&unique_name("Soup Place"), author))
        .await
        .expect("other");

    let base = Slug::from_name(&taken);
    assert_eq!(first.slug, base);

    let renamed = stores
        .update(other.id, &valid_store(&taken, author))
        .await
        .expect("rename");
    assert_eq!(renamed.slug.as_str(), format!("{base}-2"));

    // Same base, new spelling: the store's own slug must not count.
    let recased = stores
        .update(other.id, &valid_store(&taken.to_uppercase(), author))
        .await
        .expect("recase");
    assert_eq!(recased.slug, renamed.slug);
}

#[tokio::test]
#[ignore = "Requires migrated database"]
async fn test_pages_hold_at_most_four() {
    let pool = test_pool().await;
    let author = create_user(&pool).await;
    let stores = StoreRepository::new(&pool);
    for _ in 0..5 {
        stores
            .create(&valid_store(&unique_name("Page Filler"), author))
            .await
            .expect("create");
    }

    let page = stores.list_page(Pagination::stores(1)).await.expect("page");
    assert!(page.stores.len() <= 4);
    assert_eq!(i64::from(page.pages), (page.count + 3) / 4);
    assert!(page.count >= 5);
}

#[tokio::test]
#[ignore = "Requires migrated database"]
async fn test_tag_histogram_counts_every_tag() {
    let pool = test_pool().await;
    let author = create_user(&pool).await;
    let stores = StoreRepository::new(&pool);
    let tag = unique_name("Tag");
    for tags in [vec![tag.clone(), "Wifi".to_string()], vec![tag.clone()]] {
        let store = StoreInput {
            tags,
            ..store_input(&unique_name("Tagged"), author)
        };
        stores
            .create(&store.validate().expect("valid"))
            .await
            .expect("create");
    }

    let (histogram, total) = settled_tag_list(&pool).await;
    assert!(histogram.windows(2).all(|w| w[0].count >= w[1].count));
    assert_eq!(histogram.iter().map(|t| t.count).sum::<i64>(), total);
    assert_eq!(
        histogram.iter().find(|t| t.tag == tag).map(|t| t.count),
        Some(2)
    );
}

#[tokio::test]
#[ignore = "Requires migrated database"]
async fn test_all_tags_listing_skips_untagged_stores() {
    let pool = test_pool().await;
    let author = create_user(&pool).await;
    let stores = StoreRepository::new(&pool);

    let untagged = StoreInput {
        tags: Vec::new(),
        ..store_input(&unique_name("Plain"), author)
    };
    let untagged = stores
        .create(&untagged.validate().expect("valid"))
        .await
        .expect("create untagged");
    let tagged = stores
        .create(&valid_store(&unique_name("Wired"), author))
        .await
        .expect("create tagged");

    let all = stores.list_by_tag(None).await.expect("all tags");
    assert!(all.stores.iter().all(|s| !s.tags.is_empty()));
    assert!(all.stores.iter().any(|s| s.id == tagged.id));
    assert!(all.stores.iter().all(|s| s.id != untagged.id));

    let wifi = stores.list_by_tag(Some("Wifi")).await.expect("wifi");
    assert!(wifi.stores.iter().all(|s| s.tags.iter().any(|t| t == "Wifi")));
    assert!(wifi.stores.iter().any(|s| s.id == tagged.id));
}

#[tokio::test]
#[ignore = "Requires migrated database"]
async fn test_near_stays_within_radius() {
    let pool = test_pool().await;
    let author = create_user(&pool).await;
    let stores = StoreRepository::new(&pool);

    // A fresh spot in the southern ocean so earlier runs rarely crowd it.
    let slot = uuid::Uuid::new_v4().as_u128() % 600;
    #[allow(clippy::cast_precision_loss)]
    let origin = GeoPoint::new(-170.0 + slot as f64 * 0.5, -60.0).expect("origin");
    let place = |name: &str, north: f64| StoreInput {
        lng: Some(origin.lng()),
        lat: Some(origin.lat() + north),
        ..store_input(&unique_name(name), author)
    };

    let close = stores
        .create(&place("Close", 0.02).validate().expect("valid"))
        .await
        .expect("create close");
    let far = stores
        .create(&place("Far", 0.15).validate().expect("valid"))
        .await
        .expect("create far");
    assert!(origin.distance_meters(&far.location.coordinates) > NEAR_RADIUS_METERS);

    let hits = stores.near(origin).await.expect("near");
    assert!(hits.iter().any(|h| h.slug == close.slug));
    assert!(hits.iter().all(|h| h.slug != far.slug));

    let distances: Vec<f64> = hits
        .iter()
        .map(|h| origin.distance_meters(&h.location.coordinates))
        .collect();
    assert!(distances.iter().all(|&d| d <= NEAR_RADIUS_METERS + 1.0));
    assert!(distances.windows(2).all(|w| w[0] <= w[1] + 1e-6));
}

#[tokio::test]
#[ignore = "Requires migrated database"]
async fn test_heart_toggle_twice_restores() {
    let pool = test_pool().await;
    let user = create_user(&pool).await;
    let store = StoreRepository::new(&pool)
        .create(&valid_store(&unique_name("Heartable"), user))
        .await
        .expect("create");
    let hearts = HeartRepository::new(&pool);

    let before = hearts.hearts_for(user).await.expect("hearts");
    let mut expected = before.clone();

    let (action, after_add) = hearts.toggle(user, store.id).await.expect("add");
    assert_eq!(action, HeartAction::Added);
    assert_eq!(expected.toggle(store.id), action);
    assert_eq!(after_add, expected);

    let (action, after_remove) = hearts.toggle(user, store.id).await.expect("remove");
    assert_eq!(action, HeartAction::Removed);
    assert_eq!(expected.toggle(store.id), action);
    assert_eq!(after_remove, expected);
    assert_eq!(after_remove, before);
}

#[tokio::test]
#[ignore = "Requires migrated database"]
async fn test_top_stores_need_two_reviews() {
    let pool = test_pool().await;
    let (a, b) = (create_user(&pool).await, create_user(&pool).await);
    let stores = StoreRepository::new(&pool);
    let reviews = ReviewRepository::new(&pool);

    let rated = stores
        .create(&valid_store(&unique_name("Rated Twice"), a))
        .await
        .expect("create");
    let once = stores
        .create(&valid_store(&unique_name("Rated Once"), a))
        .await
        .expect("create");
    for (author, rating) in [(a, 5), (b, 4)] {
        reviews.create(rated.id, author, rating, "ok").await.expect("review");
    }
    reviews.create(once.id, b, 5, "ok").await.expect("review");

    let top = stores.top_stores().await.expect("top");
    assert!(top.len() <= usize::try_from(TOP_LIMIT).expect("small limit"));
    assert!(top.iter().all(|t| t.rating.qualifies_for_top()));
    assert!(top.iter().all(|t| t.slug != once.slug));
    assert!(!review_summary(&pool, &once.slug).await.qualifies_for_top());
    assert!(
        top.windows(2)
            .all(|w| w[0].rating.average_rating >= w[1].rating.average_rating)
    );
    for entry in &top {
        let expected = review_summary(&pool, &entry.slug).await;
        assert_eq!(entry.rating.review_count, expected.review_count);
        assert!((entry.rating.average_rating - expected.average_rating).abs() < 1e-9);
    }

    let summary = review_summary(&pool, &rated.slug).await;
    assert_eq!(summary.review_count, 2);
    assert!((summary.average_rating - 4.5).abs() < 1e-9);
    match top.iter().find(|t| t.slug == rated.slug) {
        Some(entry) => assert!((entry.rating.average_rating - 4.5).abs() < 1e-9),
        // Only a full list of stores rated at least as well can push it out.
        None => {
            assert_eq!(top.len(), usize::try_from(TOP_LIMIT).expect("small limit"));
            assert!(top.iter().all(|t| t.rating.average_rating >= 4.5));
        }
    }
}
