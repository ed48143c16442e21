//! Data maintenance tasks run from the `whiskerbond-maint` binary.

use std::collections::BTreeMap;

use chrono::{NaiveTime, Utc};
use common::booking::DEFAULT_DURATION;
use common::time::appointment_time;
use common::{Appointment, AppointmentStatus, LegacyBooking, ProviderDocument};
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::PgConnection;
use tracing::{info, warn};
use uuid::Uuid;

use crate::appointments::{mirror_to_pet, slot_day, APPOINTMENT_COLUMNS};
use crate::owners::{insert_business_user, NewBusinessUser};
use crate::providers::{
    insert_provider_document, insert_provider_service, NewProviderDocument, NewProviderService,
    VET_CATEGORY,
};
use crate::{Db, DbError};

pub const DEMO_EMAILS: [&str; 3] = ["demo1@example.com", "demo2@example.com", "demo3@example.com"];
pub const ORPHAN_VET_NAME: &str = "General Veterinary Services";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub business_users: usize,
    pub provider_documents: usize,
    pub services: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationSummary {
    pub bookings: usize,
    pub providers: usize,
    pub vets_created: usize,
    pub appointments_migrated: usize,
    pub orphaned: usize,
    pub skipped_duplicates: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateFixSummary {
    pub invalid: usize,
    pub rebuilt: usize,
    pub defaulted: usize,
    pub skipped: usize,
}

struct SeedService {
    name: &'static str,
    description: &'static str,
    category: Option<&'static str>,
    price: &'static str,
    duration: &'static str,
    rating: Option<f64>,
    featured: bool,
    pet_types: &'static [&'static str],
    attributes: Value,
}

struct SeedDocument {
    category: &'static str,
    owner: usize,
    name: &'static str,
    description: &'static str,
    address: Option<&'static str>,
    email: Option<&'static str>,
    phone: Option<&'static str>,
    attributes: Value,
    services: Vec<SeedService>,
}

fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn vet_attributes(emergency: bool, surgical: bool, dental: bool, lab: bool, specialties: &[&str]) -> Value {
    json!({
        "emergencyServices": emergency,
        "surgicalServices": surgical,
        "diagnosticServices": true,
        "vaccinationServices": true,
        "dentalServices": dental,
        "specialties": specialties,
        "labServices": lab,
        "xrayServices": lab,
    })
}

fn vet_service(name: &'static str, description: &'static str, price: &'static str, duration: &'static str, category: &'static str) -> SeedService {
    SeedService {
        name,
        description,
        category: Some(category),
        price,
        duration,
        rating: None,
        featured: false,
        pet_types: &[],
        attributes: json!({ "appointmentRequired": true }),
    }
}

fn seed_documents() -> Vec<SeedDocument> {
    vec![
        SeedDocument {
            category: "trainers",
            owner: 0,
            name: "Sample Elite Training Programs",
            description: "Obedience training, behavior modification and puppy socialization",
            address: None,
            email: None,
            phone: None,
            attributes: json!({}),
            services: vec![
                SeedService {
                    name: "Basic Obedience Training",
                    description: "Comprehensive 8-week basic obedience program covering sit, stay, come, heel, and down commands. Perfect for puppies and adult dogs.",
                    category: None,
                    price: "$299",
                    duration: "8 weeks (1 hour per week)",
                    rating: Some(5.0),
                    featured: true,
                    pet_types: &["Dog"],
                    attributes: json!({
                        "availability": "Monday-Friday 9AM-6PM, Saturday 9AM-3PM",
                        "requirements": "Dogs must be at least 12 weeks old and up to date on vaccinations",
                        "includes": "Training materials, progress tracking, lifetime support",
                    }),
                },
                SeedService {
                    name: "Puppy Socialization Classes",
                    description: "Early socialization program for puppies 8-16 weeks old. Focus on positive interactions with people, dogs, and new environments.",
                    category: None,
                    price: "$199",
                    duration: "6 weeks (45 minutes per week)",
                    rating: Some(5.0),
                    featured: true,
                    pet_types: &["Dog"],
                    attributes: json!({
                        "availability": "Tuesday and Thursday evenings",
                        "requirements": "Puppies 8-16 weeks old, first vaccination required",
                        "includes": "Puppy starter kit, socialization checklist, play time",
                    }),
                },
            ],
        },
        SeedDocument {
            category: "trainers",
            owner: 2,
            name: "Sample Happy Tails Classes",
            description: "Positive reinforcement training for dogs of all ages",
            address: None,
            email: None,
            phone: None,
            attributes: json!({}),
            services: vec![SeedService {
                name: "Advanced Agility Training",
                description: "Advanced agility course for dogs who have completed basic training. Focus on jumps, tunnels, weave poles, and competitive preparation.",
                category: None,
                price: "$450",
                duration: "12 weeks (1.5 hours per week)",
                rating: Some(5.0),
                featured: false,
                pet_types: &["Dog"],
                attributes: json!({
                    "availability": "Weekends only",
                    "requirements": "Must have completed basic obedience training",
                    "includes": "Agility equipment usage, competition preparation, certificate",
                }),
            }],
        },
        SeedDocument {
            category: "grooming",
            owner: 1,
            name: "Sample Pampered Paws Grooming",
            description: "Full-service pet grooming and spa treatments",
            address: Some("456 Beauty Blvd, Grooming Town, GT 67890"),
            email: None,
            phone: None,
            attributes: json!({ "availability": "Tuesday-Saturday 8AM-5PM" }),
            services: vec![
                SeedService {
                    name: "Full Service Grooming Package",
                    description: "Complete grooming service including bath, haircut, nail trim, ear cleaning, and teeth brushing. Professional styling for all breeds.",
                    category: None,
                    price: "$75-$150",
                    duration: "2-4 hours depending on size and coat",
                    rating: Some(5.0),
                    featured: true,
                    pet_types: &["Dog", "Cat"],
                    attributes: json!({
                        "requirements": "Dogs must be current on rabies vaccination",
                        "includes": "Bath, cut, nail trim, ear cleaning, teeth brushing, cologne spritz",
                    }),
                },
                SeedService {
                    name: "Express Bath & Brush",
                    description: "Quick refresh service perfect for maintenance between full grooming sessions. Includes bath, brush out, and nail trim.",
                    category: None,
                    price: "$35-$55",
                    duration: "1-1.5 hours",
                    rating: Some(4.0),
                    featured: false,
                    pet_types: &["Dog", "Cat"],
                    attributes: json!({
                        "requirements": "Well-behaved pets only",
                        "includes": "Bath, brush out, nail trim, ear cleaning",
                    }),
                },
            ],
        },
        SeedDocument {
            category: VET_CATEGORY,
            owner: 0,
            name: "Srivatsa's Veterinary Hospital",
            description: "Professional veterinary care with modern facilities and experienced staff",
            address: Some("123 Pet Care Lane, Animal City, AC 12345"),
            email: Some("contact@srivatsavet.com"),
            phone: Some("+1-555-VET-CARE"),
            attributes: vet_attributes(true, true, true, true, &["General Practice", "Emergency Care"]),
            services: vec![
                vet_service("General Health Checkup", "Comprehensive health examination for your pet", "$75", "30 minutes", "Consultation"),
                vet_service("Vaccination Drive", "Essential vaccinations to keep your pet healthy", "$45", "15 minutes", "Preventive Care"),
                vet_service("Emergency Care", "24/7 emergency veterinary services", "$150", "45 minutes", "Emergency"),
            ],
        },
        SeedDocument {
            category: VET_CATEGORY,
            owner: 1,
            name: "City Pet Clinic",
            description: "Neighborhood veterinary clinic offering quality pet healthcare",
            address: Some("456 Animal Avenue, Pet Town, PT 67890"),
            email: Some("info@citypetclinic.com"),
            phone: Some("+1-555-PET-CITY"),
            attributes: vet_attributes(false, false, true, false, &["General Practice", "Dental Care"]),
            services: vec![
                vet_service("Routine Checkup", "Regular health monitoring for your pet", "$60", "25 minutes", "Consultation"),
                vet_service("Dental Cleaning", "Professional dental care and cleaning", "$120", "60 minutes", "Dental Care"),
                vet_service("Grooming Service", "Complete grooming and hygiene care", "$50", "45 minutes", "Grooming"),
            ],
        },
    ]
}

async fn insert_seed_document(
    conn: &mut PgConnection,
    seed: &SeedDocument,
    provider_id: Option<Uuid>,
) -> Result<usize, DbError> {
    let doc = insert_provider_document(
        conn,
        &NewProviderDocument {
            category: seed.category,
            provider_id,
            name: seed.name,
            description: Some(seed.description),
            business_address: seed.address,
            contact_email: seed.email,
            contact_phone: seed.phone,
            rating: None,
            image: None,
            featured: false,
            pet_types: &[],
            attributes: seed.attributes.clone(),
        },
    )
    .await?;

    for svc in &seed.services {
        insert_provider_service(
            conn,
            doc.id,
            &NewProviderService {
                service_name: svc.name,
                description: Some(svc.description),
                category: svc.category,
                price: Some(svc.price),
                duration: Some(svc.duration),
                image: None,
                featured: svc.featured,
                rating: svc.rating,
                pet_types: &strings(svc.pet_types),
                attributes: svc.attributes.clone(),
            },
        )
        .await?;
    }
    Ok(seed.services.len())
}

/// Replaces the demo business accounts and their provider documents.
pub async fn seed_sample_data(db: &Db) -> Result<SeedSummary, DbError> {
    let mut tx = db.0.begin().await?;

    let demo_emails = strings(&DEMO_EMAILS);
    sqlx::query(
        "DELETE FROM service_providers
         WHERE provider_id IN (SELECT id FROM business_users WHERE email = ANY($1))",
    )
    .bind(&demo_emails)
    .execute(&mut *tx)
    .await?;
    sqlx::query("DELETE FROM business_users WHERE email = ANY($1)")
        .bind(&demo_emails)
        .execute(&mut *tx)
        .await?;

    let accounts = [
        NewBusinessUser {
            business_name: "Elite Pet Training Academy",
            name: "John Smith",
            email: DEMO_EMAILS[0],
            contact_no: Some("+1-555-PET-TRAIN"),
            address: Some("123 Training Ave, Pet City, PC 12345"),
            business_type: "trainer",
            description: Some("Professional pet training services with over 10 years of experience"),
            rating: Some(5.0),
            total_reviews: 127,
            price: None,
            featured: true,
            password_hash: None,
        },
        NewBusinessUser {
            business_name: "Pampered Paws Grooming Salon",
            name: "Sarah Johnson",
            email: DEMO_EMAILS[1],
            contact_no: Some("+1-555-GROOMING"),
            address: Some("456 Beauty Blvd, Grooming Town, GT 67890"),
            business_type: "groomer",
            description: Some("Full-service pet grooming and spa treatments"),
            rating: Some(5.0),
            total_reviews: 89,
            price: None,
            featured: false,
            password_hash: None,
        },
        NewBusinessUser {
            business_name: "Happy Tails Training Center",
            name: "Mike Wilson",
            email: DEMO_EMAILS[2],
            contact_no: Some("+1-555-HAPPY-DOG"),
            address: Some("789 Tail Wag Way, Dogtown, DT 11111"),
            business_type: "trainer",
            description: Some("Positive reinforcement training for dogs of all ages"),
            rating: Some(4.0),
            total_reviews: 65,
            price: None,
            featured: false,
            password_hash: None,
        },
    ];

    let mut owner_ids = Vec::with_capacity(accounts.len());
    for account in &accounts {
        owner_ids.push(insert_business_user(&mut *tx, account).await?.id);
    }

    let documents = seed_documents();
    let mut services = 0;
    for seed in &documents {
        services += insert_seed_document(&mut tx, seed, owner_ids.get(seed.owner).copied()).await?;
    }
    tx.commit().await?;

    let summary = SeedSummary {
        business_users: owner_ids.len(),
        provider_documents: documents.len(),
        services,
    };
    info!(?summary, "sample data seeded");
    Ok(summary)
}

// ==== Legacy booking migration ====

async fn find_vet_for_provider(
    conn: &mut PgConnection,
    provider_id: Uuid,
) -> Result<Option<ProviderDocument>, DbError> {
    let doc = sqlx::query_as::<_, ProviderDocument>(
        "SELECT id, category, provider_id, name, description, business_address, contact_email,
                contact_phone, rating, image, featured, pet_types, attributes
         FROM service_providers
         WHERE category = $1
           AND (provider_id = $2 OR attributes->>'legacyProviderId' = $2::text)
         ORDER BY created_at LIMIT 1",
    )
    .bind(VET_CATEGORY)
    .bind(provider_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(doc)
}

async fn service_ids(conn: &mut PgConnection, doc_id: Uuid) -> Result<Vec<(Uuid, String)>, DbError> {
    let rows = sqlx::query_as::<_, (Uuid, String)>(
        "SELECT id, service_name FROM provider_services
         WHERE provider_document_id = $1 ORDER BY position, id",
    )
    .bind(doc_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

/// Creates the vet document a provider's migrated bookings land in, using
/// the business account's details where it has them. A provider id with no
/// business account is kept in `attributes.legacyProviderId` instead of the
/// foreign key.
async fn create_vet_for_provider(
    conn: &mut PgConnection,
    provider_id: Uuid,
) -> Result<ProviderDocument, DbError> {
    let business = sqlx::query_as::<_, (Option<String>, Option<String>, Option<String>, Option<String>, Option<String>)>(
        "SELECT business_name, description, address, email, contact_no
         FROM business_users WHERE id = $1",
    )
    .bind(provider_id)
    .fetch_optional(&mut *conn)
    .await?;

    let linked = business.is_some();
    if !linked {
        warn!(%provider_id, "legacy provider has no business account");
    }
    let (name, description, address, email, phone) = business.unwrap_or_default();

    let mut attributes = vet_attributes(false, false, false, false, &["General Practice"]);
    if !linked {
        attributes["legacyProviderId"] = json!(provider_id);
    }

    let doc = insert_provider_document(
        conn,
        &NewProviderDocument {
            category: VET_CATEGORY,
            provider_id: linked.then_some(provider_id),
            name: name.as_deref().unwrap_or("Veterinary Services"),
            description: Some(
                description
                    .as_deref()
                    .unwrap_or("Professional veterinary care services"),
            ),
            business_address: Some(address.as_deref().unwrap_or("Service location varies")),
            contact_email: Some(email.as_deref().unwrap_or("contact@veterinary.com")),
            contact_phone: Some(phone.as_deref().unwrap_or("Contact for details")),
            rating: None,
            image: None,
            featured: false,
            pet_types: &[],
            attributes,
        },
    )
    .await?;

    for (name, description, duration, category) in [
        ("General Consultation", "Professional veterinary consultation", "30 minutes", "Consultation"),
        ("Vaccination", "Pet vaccination services", "15 minutes", "Preventive Care"),
    ] {
        insert_provider_service(
            conn,
            doc.id,
            &NewProviderService {
                service_name: name,
                description: Some(description),
                category: Some(category),
                price: Some("Contact for pricing"),
                duration: Some(duration),
                image: None,
                featured: false,
                rating: None,
                pet_types: &[],
                attributes: json!({}),
            },
        )
        .await?;
    }
    info!(%provider_id, vet_id = %doc.id, "vet document created for migrated bookings");
    Ok(doc)
}

async fn create_orphan_vet(conn: &mut PgConnection) -> Result<ProviderDocument, DbError> {
    let doc = insert_provider_document(
        conn,
        &NewProviderDocument {
            category: VET_CATEGORY,
            provider_id: None,
            name: ORPHAN_VET_NAME,
            description: Some("Migrated bookings without specific provider"),
            business_address: Some("Various locations"),
            contact_email: Some("contact@veterinary.com"),
            contact_phone: Some("Contact for details"),
            rating: None,
            image: None,
            featured: false,
            pet_types: &[],
            attributes: vet_attributes(false, false, false, false, &["General Practice"]),
        },
    )
    .await?;
    insert_provider_service(
        conn,
        doc.id,
        &NewProviderService {
            service_name: "General Service",
            description: Some("General veterinary service"),
            category: Some("General"),
            price: Some("Contact for pricing"),
            duration: Some(DEFAULT_DURATION),
            image: None,
            featured: false,
            rating: None,
            pet_types: &[],
            attributes: json!({}),
        },
    )
    .await?;
    Ok(doc)
}

/// Inserts one migrated booking. `None` when an active appointment already
/// holds the same slot.
async fn insert_migrated(
    conn: &mut PgConnection,
    booking: &LegacyBooking,
    vet_id: Uuid,
    service_id: Option<Uuid>,
    orphaned: bool,
) -> Result<Option<Appointment>, DbError> {
    let date = booking.date.as_deref().unwrap_or_default();
    let time = booking.time.as_deref().unwrap_or_default();
    let at = appointment_time(date, time);
    let status = AppointmentStatus::from_legacy(booking.status.as_deref().unwrap_or_default());

    let apt = sqlx::query_as::<_, Appointment>(&format!(
        r#"INSERT INTO appointments
               (id, vet_id, patient_id, owner_id, patient_name, pet_parent, service_id,
                service_name, appointment_time, appointment_date, legacy_date, legacy_time,
                status, notes, symptoms, is_emergency, price, duration, original_booking_id,
                orphaned, created_at, updated_at)
           VALUES ($1, $2, (SELECT id FROM pets WHERE id = $3), $4, $5, $6, $7, $8, $9, $10,
                   $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22)
           ON CONFLICT DO NOTHING
           RETURNING {APPOINTMENT_COLUMNS}"#
    ))
    .bind(Uuid::new_v4())
    .bind(vet_id)
    .bind(booking.pet_id)
    .bind(booking.owner_id)
    .bind(&booking.pet_name)
    .bind(&booking.pet_parent)
    .bind(service_id)
    .bind(&booking.service_name)
    .bind(at)
    .bind(slot_day(at, booking.date.as_deref()))
    .bind(booking.date.as_deref())
    .bind(booking.time.as_deref())
    .bind(status.as_str())
    .bind(booking.notes.as_deref().unwrap_or_default())
    .bind(booking.symptoms.as_deref().unwrap_or_default())
    .bind(booking.is_emergency)
    .bind(booking.price.unwrap_or(0.0))
    .bind(booking.duration.as_deref().unwrap_or(DEFAULT_DURATION))
    .bind(booking.id)
    .bind(orphaned)
    .bind(booking.created_at)
    .bind(booking.updated_at.unwrap_or(booking.created_at))
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(apt) = &apt {
        mirror_to_pet(conn, apt).await?;
    }
    Ok(apt)
}

/// Moves every unmigrated legacy booking into `appointments`, grouped under
/// the provider's vet document. Runs as one transaction.
pub async fn migrate_legacy_bookings(db: &Db) -> Result<MigrationSummary, DbError> {
    let mut tx = db.0.begin().await?;

    let bookings = sqlx::query_as::<_, LegacyBooking>(
        "SELECT id, provider_id, pet_id, owner_id, pet_name, pet_parent, service_name, date, time,
                status, notes, symptoms, is_emergency, price, duration, created_at, updated_at
         FROM legacy_vet_bookings
         WHERE migrated_at IS NULL
         ORDER BY created_at
         FOR UPDATE",
    )
    .fetch_all(&mut *tx)
    .await?;

    let mut summary = MigrationSummary {
        bookings: bookings.len(),
        ..Default::default()
    };
    if bookings.is_empty() {
        info!("no legacy bookings to migrate");
        return Ok(summary);
    }

    let mut by_provider: BTreeMap<Uuid, Vec<&LegacyBooking>> = BTreeMap::new();
    let mut orphans = Vec::new();
    for booking in &bookings {
        match booking.provider_id {
            Some(provider_id) => by_provider.entry(provider_id).or_default().push(booking),
            None => orphans.push(booking),
        }
    }
    info!(providers = by_provider.len(), orphans = orphans.len(), "legacy bookings grouped");

    for (provider_id, group) in &by_provider {
        let vet = match find_vet_for_provider(&mut tx, *provider_id).await? {
            Some(vet) => vet,
            None => {
                summary.vets_created += 1;
                create_vet_for_provider(&mut tx, *provider_id).await?
            }
        };
        let services = service_ids(&mut tx, vet.id).await?;

        for booking in group {
            let service_id = services
                .iter()
                .find(|(_, name)| *name == booking.service_name)
                .or_else(|| services.first())
                .map(|(id, _)| *id);
            match insert_migrated(&mut tx, booking, vet.id, service_id, false).await? {
                Some(_) => summary.appointments_migrated += 1,
                None => {
                    warn!(booking_id = %booking.id, "legacy booking duplicates an active slot, skipped");
                    summary.skipped_duplicates += 1;
                }
            }
        }
        info!(vet = %vet.name, bookings = group.len(), "provider bookings migrated");
        summary.providers += 1;
    }

    if !orphans.is_empty() {
        let vet = create_orphan_vet(&mut tx).await?;
        summary.vets_created += 1;
        for booking in &orphans {
            match insert_migrated(&mut tx, booking, vet.id, None, true).await? {
                Some(_) => {
                    summary.appointments_migrated += 1;
                    summary.orphaned += 1;
                }
                None => summary.skipped_duplicates += 1,
            }
        }
    }

    let ids: Vec<Uuid> = bookings.iter().map(|b| b.id).collect();
    sqlx::query("UPDATE legacy_vet_bookings SET migrated_at = NOW() WHERE id = ANY($1)")
        .bind(&ids)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(?summary, "legacy booking migration finished");
    Ok(summary)
}

// ==== Date repair ====

/// Gives every appointment without a usable time one: rebuilt from its
/// legacy date and time strings when they parse, else today at 09:00 UTC.
pub async fn fix_appointment_dates(db: &Db) -> Result<DateFixSummary, DbError> {
    let broken = sqlx::query_as::<_, Appointment>(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE appointment_time IS NULL ORDER BY created_at"
    ))
    .fetch_all(&db.0)
    .await?;

    let mut summary = DateFixSummary {
        invalid: broken.len(),
        ..Default::default()
    };
    let today_nine = Utc::now()
        .date_naive()
        .and_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default())
        .and_utc();

    for apt in broken {
        let rebuilt = match (apt.legacy_date.as_deref(), apt.legacy_time.as_deref()) {
            (Some(date), Some(time)) => appointment_time(date, time),
            _ => None,
        };
        let at = rebuilt.unwrap_or(today_nine);

        let mut tx = db.0.begin().await?;
        let fixed = sqlx::query_as::<_, Appointment>(&format!(
            "UPDATE appointments
             SET appointment_time = $2, appointment_date = $3, updated_at = NOW()
             WHERE id = $1
             RETURNING {APPOINTMENT_COLUMNS}"
        ))
        .bind(apt.id)
        .bind(at)
        .bind(at.date_naive())
        .fetch_one(&mut *tx)
        .await;

        let fixed = match fixed.map_err(DbError::from) {
            Ok(fixed) => fixed,
            Err(DbError::Conflict(_)) => {
                warn!(appointment_id = %apt.id, %at, "repaired time collides with an active booking, left as is");
                summary.skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };
        mirror_to_pet(&mut tx, &fixed).await?;
        tx.commit().await?;

        if rebuilt.is_some() {
            summary.rebuilt += 1;
        } else {
            summary.defaulted += 1;
        }
        info!(appointment_id = %apt.id, %at, "appointment time repaired");
    }

    info!(?summary, "appointment date repair finished");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_documents_reference_existing_accounts() {
        let docs = seed_documents();
        assert!(docs.iter().all(|d| d.owner < DEMO_EMAILS.len()));
        assert_eq!(docs.iter().filter(|d| d.category == VET_CATEGORY).count(), 2);
        assert!(docs.iter().all(|d| !d.services.is_empty()));
    }

    #[test]
    fn vet_attributes_carry_the_capability_flags() {
        let attrs = vet_attributes(true, false, true, false, &["General Practice"]);
        assert_eq!(attrs["emergencyServices"], json!(true));
        assert_eq!(attrs["surgicalServices"], json!(false));
        assert_eq!(attrs["diagnosticServices"], json!(true));
        assert_eq!(attrs["specialties"], json!(["General Practice"]));
    }
}
