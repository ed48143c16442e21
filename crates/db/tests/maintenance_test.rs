//! Maintenance tasks against a real Postgres. Set `TEST_DATABASE_URL` to run
//! them; without it each test returns early.

use std::env;

use chrono::{DateTime, TimeZone, Utc};
use db::maintenance::{
    fix_appointment_dates, migrate_legacy_bookings, seed_sample_data, DEMO_EMAILS, ORPHAN_VET_NAME,
};
use db::{insert_owner, insert_pet, insert_provider_document, Db, NewOwner, NewPet, NewProviderDocument};
use serde_json::json;
use uuid::Uuid;

async fn test_db() -> Option<Db> {
    dotenvy::dotenv().ok();
    let Ok(url) = env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return None;
    };
    let db = db::connect(&url, 5).await.expect("test database");
    db::migrate(&db).await.expect("migrations");
    Some(db)
}

/// An owner with one pet; returns `(owner id, pet id)`.
async fn owner_with_pet(db: &Db, pet_name: &str) -> (Uuid, Uuid) {
    let email = format!("maint-{}@example.com", Uuid::new_v4());
    let owner = insert_owner(
        db,
        &NewOwner {
            name: "Asha Rao",
            email: &email,
            password_hash: "x",
            phone: "555-0100",
            alternate_phone: None,
            address: "12 Lake Road",
        },
    )
    .await
    .unwrap();
    let pet = insert_pet(
        db,
        &NewPet {
            owner_id: owner.id,
            name: pet_name,
            age: 4,
            pet_type: "Dog",
            breed: "Indie",
            behavior: "",
            allergies: "None",
        },
    )
    .await
    .unwrap();
    (owner.id, pet.id)
}

async fn legacy_booking(
    db: &Db,
    provider_id: Option<Uuid>,
    owner_id: Uuid,
    pet_id: Uuid,
    service: &str,
    date: &str,
    time: &str,
) -> Uuid {
    let (id,): (Uuid,) = sqlx::query_as(
        "INSERT INTO legacy_vet_bookings
             (provider_id, pet_id, owner_id, pet_name, pet_parent, service_name, date, time, status)
         VALUES ($1, $2, $3, 'Kutta', 'Asha Rao', $4, $5, $6, 'confirmed')
         RETURNING id",
    )
    .bind(provider_id)
    .bind(pet_id)
    .bind(owner_id)
    .bind(service)
    .bind(date)
    .bind(time)
    .fetch_one(&db.0)
    .await
    .unwrap();
    id
}

/// The vet a migrated booking landed on: `(vet name, provider_id, attributes, orphaned)`.
async fn migrated_vet(
    db: &Db,
    booking_id: Uuid,
) -> Option<(String, Option<Uuid>, serde_json::Value, bool)> {
    sqlx::query_as(
        "SELECT sp.name, sp.provider_id, sp.attributes, a.orphaned
         FROM appointments a JOIN service_providers sp ON sp.id = a.vet_id
         WHERE a.original_booking_id = $1",
    )
    .bind(booking_id)
    .fetch_optional(&db.0)
    .await
    .unwrap()
}

async fn migrated_at(db: &Db, booking_id: Uuid) -> Option<DateTime<Utc>> {
    let (at,): (Option<DateTime<Utc>>,) =
        sqlx::query_as("SELECT migrated_at FROM legacy_vet_bookings WHERE id = $1")
            .bind(booking_id)
            .fetch_one(&db.0)
            .await
            .unwrap();
    at
}

#[tokio::test]
async fn seeding_twice_replaces_the_demo_accounts() {
    let Some(db) = test_db().await else { return };

    let first = seed_sample_data(&db).await.unwrap();
    let second = seed_sample_data(&db).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.business_users, DEMO_EMAILS.len());

    let demo: Vec<String> = DEMO_EMAILS.iter().map(|e| e.to_string()).collect();
    let (accounts,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM business_users WHERE email = ANY($1)")
            .bind(&demo)
            .fetch_one(&db.0)
            .await
            .unwrap();
    assert_eq!(accounts, DEMO_EMAILS.len() as i64);

    let (vets,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM service_providers
         WHERE category = 'vets'
           AND provider_id IN (SELECT id FROM business_users WHERE email = ANY($1))",
    )
    .bind(&demo)
    .fetch_one(&db.0)
    .await
    .unwrap();
    assert_eq!(vets, 2);
}

#[tokio::test]
async fn legacy_bookings_land_on_vet_documents() {
    let Some(db) = test_db().await else { return };
    let (owner_id, pet_id) = owner_with_pet(&db, "Kutta").await;

    let unknown_provider = Uuid::new_v4();
    let unknown = legacy_booking(&db, Some(unknown_provider), owner_id, pet_id, "Checkup", "2031-07-01", "10:00 AM").await;
    let orphan = legacy_booking(&db, None, owner_id, pet_id, "Vaccination", "2031-07-02", "11:00 AM").await;
    let first = legacy_booking(&db, Some(unknown_provider), owner_id, pet_id, "Dental", "2031-07-04", "9:00 AM").await;
    let clash = legacy_booking(&db, Some(unknown_provider), owner_id, pet_id, "Dental", "2031-07-04", "4:00 PM").await;

    let summary = migrate_legacy_bookings(&db).await.unwrap();
    assert!(summary.bookings >= 4);
    assert!(summary.skipped_duplicates >= 1);

    // a provider without a business account still gets a vet, unlinked
    let (name, provider_id, attributes, orphaned) = migrated_vet(&db, unknown).await.unwrap();
    assert_eq!(name, "Veterinary Services");
    assert_eq!(provider_id, None);
    assert_eq!(attributes["legacyProviderId"], json!(unknown_provider));
    assert!(!orphaned);

    let (name, _, _, orphaned) = migrated_vet(&db, orphan).await.unwrap();
    assert_eq!(name, ORPHAN_VET_NAME);
    assert!(orphaned);

    // same pet, service and day: only the first one is kept
    assert!(migrated_vet(&db, first).await.is_some());
    assert!(migrated_vet(&db, clash).await.is_none());

    for id in [unknown, orphan, first, clash] {
        assert!(migrated_at(&db, id).await.is_some(), "booking {id} not stamped");
    }

    // a second run reuses the document kept for the unknown provider
    let later = legacy_booking(&db, Some(unknown_provider), owner_id, pet_id, "Checkup", "2031-07-09", "10:00 AM").await;
    migrate_legacy_bookings(&db).await.unwrap();
    let (docs,): (i64,) = sqlx::query_as(
        "SELECT COUNT(DISTINCT a.vet_id) FROM appointments a WHERE a.original_booking_id = ANY($1)",
    )
    .bind(vec![unknown, later])
    .fetch_one(&db.0)
    .await
    .unwrap();
    assert_eq!(docs, 1);
}

async fn insert_appointment(
    db: &Db,
    (vet_id, pet_id, owner_id): (Uuid, Uuid, Uuid),
    service: &str,
    at: Option<DateTime<Utc>>,
    date: &str,
    time: &str,
) -> Uuid {
    let (id,): (Uuid,) = sqlx::query_as(
        "INSERT INTO appointments
             (vet_id, patient_id, owner_id, patient_name, pet_parent, service_name,
              appointment_time, appointment_date, legacy_date, legacy_time, status)
         VALUES ($1, $2, $3, 'Moti', 'Asha Rao', $4, $5, $6, $7, $8, 'confirmed')
         RETURNING id",
    )
    .bind(vet_id)
    .bind(pet_id)
    .bind(owner_id)
    .bind(service)
    .bind(at)
    .bind(at.map(|at| at.date_naive()))
    .bind(date)
    .bind(time)
    .fetch_one(&db.0)
    .await
    .unwrap();
    id
}

async fn time_of(db: &Db, id: Uuid) -> Option<DateTime<Utc>> {
    let (at,): (Option<DateTime<Utc>>,) =
        sqlx::query_as("SELECT appointment_time FROM appointments WHERE id = $1")
            .bind(id)
            .fetch_one(&db.0)
            .await
            .unwrap();
    at
}

#[tokio::test]
async fn broken_times_are_rebuilt_unless_the_slot_is_taken() {
    let Some(db) = test_db().await else { return };
    let (owner_id, pet_id) = owner_with_pet(&db, "Moti").await;

    let mut conn = db.0.acquire().await.unwrap();
    let vet = insert_provider_document(
        &mut conn,
        &NewProviderDocument {
            category: "vets",
            provider_id: None,
            name: "Date Repair Clinic",
            description: None,
            business_address: None,
            contact_email: None,
            contact_phone: None,
            rating: None,
            image: None,
            featured: false,
            pet_types: &[],
            attributes: json!({}),
        },
    )
    .await
    .unwrap();
    drop(conn);
    let ids = (vet.id, pet_id, owner_id);

    let fixable = insert_appointment(&db, ids, "Checkup", None, "2031-08-01", "9:30 AM").await;
    let taken = Utc.with_ymd_and_hms(2031, 8, 2, 11, 0, 0).unwrap();
    insert_appointment(&db, ids, "Dental", Some(taken), "2031-08-02", "11:00").await;
    let blocked = insert_appointment(&db, ids, "Dental", None, "2031-08-02", "3 PM").await;

    let summary = fix_appointment_dates(&db).await.unwrap();
    assert!(summary.rebuilt >= 1);
    assert!(summary.skipped >= 1);

    assert_eq!(
        time_of(&db, fixable).await,
        Some(Utc.with_ymd_and_hms(2031, 8, 1, 9, 30, 0).unwrap())
    );
    // the repair would collide with the existing Dental booking
    assert_eq!(time_of(&db, blocked).await, None);
}
