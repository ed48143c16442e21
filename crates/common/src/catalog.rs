//! Shapes provider documents and business accounts into the service
//! catalog the marketplace pages render.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::model::{BusinessUser, ProviderDocument, ProviderService};

/// Categories that never show up as a service listing.
pub const RESERVED_CATEGORIES: [&str; 4] = ["busers", "services", "petowners", "allpets"];
/// Categories with a dedicated aggregation path.
const SPECIAL_CATEGORIES: [&str; 4] = ["trainers", "ngos", "walkers", "boardings"];

pub const DEFAULT_RATING: f64 = 4.0;
const FALLBACK_IMAGE: &str = "https://images.unsplash.com/photo-1516734212186-a967f81ad0d7?ixlib=rb-4.0.3&auto=format&fit=crop&w=500&q=80";

#[derive(Debug, Clone, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub business_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub business_address: String,
    pub business_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_reviews: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceListing {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub location: String,
    pub rating: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    pub image: String,
    pub featured: bool,
    pub pet_types: Vec<String>,
    pub collection_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderInfo>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub service_details: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryGroup {
    pub category_name: String,
    pub services: Vec<ServiceListing>,
    pub count: usize,
}

impl CategoryGroup {
    fn new(category_name: impl Into<String>, services: Vec<ServiceListing>) -> Self {
        Self {
            category_name: category_name.into(),
            count: services.len(),
            services,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCatalog {
    pub all_services: Vec<ServiceListing>,
    pub categories: BTreeMap<String, CategoryGroup>,
    pub total_services: usize,
    pub total_categories: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryListing {
    pub category: String,
    pub services: Vec<ServiceListing>,
    pub count: usize,
}

/// `groomingSalons` / `pet_sitters` / `day-care` to `Grooming Salons` /
/// `Pet Sitters` / `Day Care`.
pub fn format_category_name(raw: &str) -> String {
    let mut spaced = String::with_capacity(raw.len() + 4);
    for ch in raw.chars() {
        match ch {
            'A'..='Z' => {
                spaced.push(' ');
                spaced.push(ch);
            }
            '_' | '-' => spaced.push(' '),
            _ => spaced.push(ch),
        }
    }
    spaced
        .split(' ')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn default_service_image(category: &str) -> &'static str {
    match category.to_lowercase().as_str() {
        "trainers" => "https://images.unsplash.com/photo-1551730459-92db2a308d6a?ixlib=rb-4.0.3&auto=format&fit=crop&w=500&q=80",
        "grooming" => FALLBACK_IMAGE,
        "veterinary" => "https://images.unsplash.com/photo-1628009368231-7bb7cfcb0def?ixlib=rb-4.0.3&auto=format&fit=crop&w=500&q=80",
        "walking" => "https://images.unsplash.com/photo-1494947665470-20322015e3a8?ixlib=rb-4.0.3&auto=format&fit=crop&w=500&q=80",
        "boarding" => "https://images.unsplash.com/photo-1548199973-03cce0bbc87b?ixlib=rb-4.0.3&auto=format&fit=crop&w=500&q=80",
        "spa" => "https://images.unsplash.com/photo-1596492784531-6c9bb4dde4eb?ixlib=rb-4.0.3&auto=format&fit=crop&w=500&q=80",
        _ => FALLBACK_IMAGE,
    }
}

pub fn is_reserved_category(category: &str) -> bool {
    let lower = category.to_lowercase();
    RESERVED_CATEGORIES.contains(&lower.as_str())
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn attr<'a>(attrs: &'a Value, key: &str) -> Option<&'a Value> {
    attrs.get(key).filter(|v| truthy(v))
}

/// Service attribute, then document attribute, then the default.
fn pick(service: &Value, doc: &Value, key: &str, default: Value) -> Value {
    attr(service, key)
        .or_else(|| attr(doc, key))
        .cloned()
        .unwrap_or(default)
}

fn not_false(attrs: &Value, key: &str) -> bool {
    attrs.get(key) != Some(&Value::Bool(false))
}

fn pet_types(own: &[String], fallback: &[String]) -> Vec<String> {
    if !own.is_empty() {
        own.to_vec()
    } else if !fallback.is_empty() {
        fallback.to_vec()
    } else {
        vec!["Dog".to_string(), "Cat".to_string()]
    }
}

/// Animals an NGO document lists as available for adoption.
pub fn adoption_data(doc_attrs: &Value) -> Vec<Value> {
    let filter = |key: &str, keep: &dyn Fn(&Value) -> bool| -> Option<Vec<Value>> {
        doc_attrs
            .get(key)
            .and_then(Value::as_array)
            .map(|list| list.iter().filter(|a| keep(a)).cloned().collect())
    };

    filter("adoptions", &|a: &Value| match a.get("status") {
        None | Some(Value::Null) => true,
        Some(s) => s.as_str() == Some("available"),
    })
    .or_else(|| {
        filter("animals", &|a: &Value| match a.get("adoptionStatus") {
            None | Some(Value::Null) => true,
            Some(s) => s.as_str() == Some("available"),
        })
    })
    .or_else(|| filter("pets", &|a: &Value| a.get("available") != Some(&Value::Bool(false))))
    .unwrap_or_default()
}

fn adoption_details(service: &Value, doc: &Value) -> Map<String, Value> {
    let mut m = Map::new();
    m.insert("adoptionServices".into(), json!(true));
    m.insert("availableForAdoption".into(), Value::Array(adoption_data(doc)));
    m.insert(
        "adoptionProcess".into(),
        pick(
            service,
            doc,
            "adoptionProcess",
            json!(["Application Review", "Meet & Greet", "Home Visit", "Adoption Finalization"]),
        ),
    );
    m.insert("adoptionFee".into(), pick(service, doc, "adoptionFee", json!("Varies by animal")));
    m.insert(
        "volunteerOpportunities".into(),
        pick(service, doc, "volunteerOpportunities", json!(["Animal Care", "Events"])),
    );
    m.insert("donationInfo".into(), pick(service, doc, "donationInfo", json!("Donations welcome")));
    m.insert("rescueTypes".into(), pick(service, doc, "rescueTypes", json!(["Cats", "Dogs"])));
    m.insert("spayNeuterRequired".into(), json!(not_false(service, "spayNeuterRequired")));
    m.insert("followUpSupport".into(), json!(not_false(service, "followUpSupport")));
    m
}

/// Category-specific detail block for one service offering.
pub fn specialized_details(category: &str, service: &ProviderService, doc: &ProviderDocument) -> Value {
    let s = &service.attributes;
    let d = &doc.attributes;

    let mut details = Map::new();
    details.insert("duration".into(), json!(service.duration));
    details.insert("availability".into(), attr(d, "availability").cloned().unwrap_or(Value::Null));
    details.insert("requirements".into(), attr(s, "requirements").cloned().unwrap_or(Value::Null));
    details.insert("appointmentRequired".into(), json!(attr(s, "appointmentRequired").is_some()));
    details.insert("isEmergency".into(), json!(attr(s, "isEmergency").is_some()));
    details.insert("emergency24Hrs".into(), json!(attr(d, "emergency24Hrs").is_some()));

    let extra: Vec<(&str, Value)> = match category.to_lowercase().as_str() {
        "trainers" => vec![
            ("specialization", json!("General Training")),
            ("trainingMethods", json!(["Positive Reinforcement"])),
            ("experienceYears", json!("Not specified")),
            ("certifications", json!([])),
            ("groupSessions", json!(false)),
            ("privateSessions", json!(true)),
            ("homeVisits", json!(false)),
            ("trainingPrograms", json!(["Basic Obedience"])),
            ("ageGroups", json!(["Puppy", "Adult", "Senior"])),
        ],
        "walkers" => vec![
            ("walkingAreas", json!(["Local Parks"])),
            ("walkDuration", json!("30 minutes")),
            ("groupWalks", json!(false)),
            ("soloWalks", json!(true)),
            ("pickupDropoff", json!(true)),
            ("weekendAvailability", json!(false)),
            ("emergencyWalks", json!(false)),
            ("maxPetsPerWalk", json!(1)),
            ("weatherPolicy", json!("All weather conditions")),
        ],
        "vets" | "veterinary" => vec![
            ("emergencyServices", json!(false)),
            ("surgicalServices", json!(false)),
            ("diagnosticServices", json!(true)),
            ("vaccinationServices", json!(true)),
            ("dentalServices", json!(false)),
            ("specialties", json!(["General Practice"])),
            ("labServices", json!(false)),
            ("xrayServices", json!(false)),
        ],
        "boardings" | "boarding" => vec![
            ("accommodationType", json!("Standard")),
            ("playTime", json!("Daily")),
            ("mealPlans", json!("Provided")),
            ("medicationSupport", json!(false)),
            ("groomingServices", json!(false)),
            ("pickupDropoff", json!(true)),
            ("outdoorAccess", json!(true)),
            ("cameraAccess", json!(false)),
        ],
        "ngos" => {
            details.extend(adoption_details(s, d));
            Vec::new()
        }
        _ => Vec::new(),
    };
    for (key, default) in extra {
        details.insert(key.into(), pick(s, d, key, default));
    }

    Value::Object(details)
}

struct Fallback {
    business_name: &'static str,
    address: &'static str,
    description: &'static str,
    business_type: Option<&'static str>,
    name: Option<&'static str>,
}

fn provider_info(owner: Option<&BusinessUser>, fallback: &Fallback) -> ProviderInfo {
    match owner {
        Some(b) => ProviderInfo {
            id: Some(b.id.to_string()),
            business_name: b.display_name().unwrap_or("Unknown Business").to_string(),
            contact_email: b.email.clone().unwrap_or_else(|| "contact@business.com".into()),
            contact_phone: b.contact_no.clone().unwrap_or_else(|| "Not provided".into()),
            business_address: b.address.clone().unwrap_or_else(|| "Address not provided".into()),
            business_description: b
                .business_type
                .clone()
                .unwrap_or_else(|| fallback.description.to_string()),
            business_type: b
                .business_type
                .clone()
                .or_else(|| fallback.business_type.map(str::to_string)),
            name: b.name.clone().or_else(|| fallback.name.map(str::to_string)),
            rating: b.rating,
            total_reviews: Some(b.total_reviews),
        },
        None => ProviderInfo {
            business_name: fallback.business_name.to_string(),
            contact_email: "info@whiskerbond.com".into(),
            contact_phone: "+1-555-WHISKER".into(),
            business_address: fallback.address.to_string(),
            business_description: fallback.description.to_string(),
            ..Default::default()
        },
    }
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|v| !v.is_empty())
}

/// Builds the full marketplace catalog from every provider document and
/// business account. Categories that end up empty are left out.
pub fn build_catalog(documents: &[ProviderDocument], business_users: &[BusinessUser]) -> ServiceCatalog {
    let owners: HashMap<Uuid, &BusinessUser> = business_users.iter().map(|b| (b.id, b)).collect();
    let owner_of = |doc: &ProviderDocument| doc.provider_id.and_then(|id| owners.get(&id).copied());
    let mut categories = BTreeMap::new();

    // Trainers
    let trainer_fallback = Fallback {
        business_name: "WhiskerBond Training Services",
        address: "Training Center",
        description: "Professional training provider",
        business_type: Some("trainer"),
        name: Some("Trainer"),
    };
    let mut trainers = Vec::new();
    for doc in documents.iter().filter(|d| d.category.eq_ignore_ascii_case("trainers")) {
        let provider = provider_info(owner_of(doc), &trainer_fallback);
        for plan in &doc.services {
            let name = if plan.service_name.is_empty() {
                "Training Service".to_string()
            } else {
                plan.service_name.clone()
            };
            trainers.push(ServiceListing {
                id: plan.id.to_string(),
                category: "Training".into(),
                description: non_empty(&plan.description)
                    .unwrap_or("Professional pet training service")
                    .to_string(),
                location: provider.business_address.clone(),
                rating: plan.rating.unwrap_or(DEFAULT_RATING),
                price: plan.price.clone(),
                image: plan
                    .image
                    .clone()
                    .unwrap_or_else(|| default_service_image("trainers").to_string()),
                featured: plan.featured,
                pet_types: pet_types(&plan.pet_types, &[]),
                collection_name: "trainers".into(),
                provider: Some(provider.clone()),
                service_details: json!({
                    "duration": plan.duration,
                    "description": plan.description,
                    "serviceName": name,
                    "specialization": "Pet Training",
                    "trainingType": name,
                    "experienceYears": "Not specified",
                    "certifications": [],
                    "homeVisits": true,
                    "privateSessions": true,
                }),
                name,
            });
        }
    }
    if !trainers.is_empty() {
        categories.insert("trainers".to_string(), CategoryGroup::new("Trainers", trainers));
    }

    // Walkers and boardings are business accounts without a category document.
    for (business_type, key, label, category, image_key, noun, area_key) in [
        ("walker", "walkers", "Walkers", "Pet Walking", "walkers", "walking", "serviceArea"),
        ("boarding", "boardings", "Boardings", "Pet Boarding", "boarding", "boarding", "facilityAddress"),
    ] {
        let services: Vec<ServiceListing> = business_users
            .iter()
            .filter(|b| b.business_type.as_deref() == Some(business_type))
            .map(|b| {
                let display = b.display_name().unwrap_or_default();
                ServiceListing {
                    id: b.id.to_string(),
                    name: format!("{} Service by {display}", format_category_name(noun)),
                    category: category.to_string(),
                    description: format!("Professional pet {noun} services by {display}"),
                    location: b.address.clone().unwrap_or_else(|| {
                        if business_type == "walker" {
                            "Service area varies".into()
                        } else {
                            "Facility location varies".into()
                        }
                    }),
                    rating: b.rating.unwrap_or(DEFAULT_RATING),
                    price: b.price.clone(),
                    image: default_service_image(image_key).to_string(),
                    featured: b.featured,
                    pet_types: pet_types(&[], &[]),
                    collection_name: key.to_string(),
                    provider: Some(ProviderInfo {
                        id: Some(b.id.to_string()),
                        business_name: if display.is_empty() {
                            format!("{} Service", format_category_name(business_type))
                        } else {
                            display.to_string()
                        },
                        contact_email: b
                            .email
                            .clone()
                            .unwrap_or_else(|| format!("contact@{business_type}.com")),
                        contact_phone: b.contact_no.clone().unwrap_or_else(|| "Not provided".into()),
                        business_address: b.address.clone().unwrap_or_else(|| "Address not provided".into()),
                        business_description: format!("Professional pet {noun} service"),
                        business_type: Some(business_type.to_string()),
                        name: b.name.clone(),
                        rating: b.rating,
                        total_reviews: Some(b.total_reviews),
                    }),
                    service_details: {
                        let mut details = Map::new();
                        details.insert(format!("{noun}Service"), json!(true));
                        details.insert("providerName".into(), json!(b.name));
                        details.insert("contactNumber".into(), json!(b.contact_no));
                        details.insert(area_key.into(), json!(b.address));
                        Value::Object(details)
                    },
                }
            })
            .collect();
        if !services.is_empty() {
            categories.insert(key.to_string(), CategoryGroup::new(label, services));
        }
    }

    // NGOs
    let ngo_fallback = Fallback {
        business_name: "WhiskerBond NGO Services",
        address: "NGO Center",
        description: "Professional rescue organization",
        business_type: Some("ngo"),
        name: Some("NGO"),
    };
    let mut ngos = Vec::new();
    for doc in documents.iter().filter(|d| d.category.eq_ignore_ascii_case("ngos")) {
        let provider = provider_info(owner_of(doc), &ngo_fallback);
        let doc_rating = doc.rating.unwrap_or(DEFAULT_RATING);
        let doc_image = doc
            .image
            .clone()
            .unwrap_or_else(|| default_service_image("ngos").to_string());

        if doc.services.is_empty() {
            let mut details = adoption_details(&Value::Null, &doc.attributes);
            details.insert("spayNeuterRequired".into(), json!(not_false(&doc.attributes, "spayNeuterRequired")));
            details.insert("followUpSupport".into(), json!(not_false(&doc.attributes, "followUpSupport")));
            ngos.push(ServiceListing {
                id: doc.id.to_string(),
                name: format!("{} - Adoption Services", provider.business_name),
                category: "NGO Services".into(),
                description: format!("Pet rescue and adoption services by {}", provider.business_name),
                location: provider.business_address.clone(),
                rating: doc_rating,
                price: Some("Free/Donation".into()),
                image: doc_image,
                featured: doc.featured,
                pet_types: pet_types(&doc.pet_types, &[]),
                collection_name: "ngos".into(),
                provider: Some(provider),
                service_details: Value::Object(details),
            });
            continue;
        }

        for svc in &doc.services {
            let mut details = Map::new();
            details.insert("duration".into(), json!(svc.duration));
            details.insert("description".into(), json!(svc.description));
            details.insert("serviceName".into(), json!(svc.service_name));
            details.extend(adoption_details(&svc.attributes, &doc.attributes));
            ngos.push(ServiceListing {
                id: svc.id.to_string(),
                name: if svc.service_name.is_empty() {
                    format!("{} Service", provider.business_name)
                } else {
                    svc.service_name.clone()
                },
                category: "NGO Services".into(),
                description: non_empty(&svc.description)
                    .unwrap_or("Professional pet rescue and adoption services")
                    .to_string(),
                location: provider.business_address.clone(),
                rating: svc.rating.unwrap_or(doc_rating),
                price: Some(svc.price.clone().unwrap_or_else(|| "Free/Donation".into())),
                image: svc.image.clone().unwrap_or_else(|| doc_image.clone()),
                featured: svc.featured || doc.featured,
                pet_types: pet_types(&svc.pet_types, &doc.pet_types),
                collection_name: "ngos".into(),
                provider: Some(provider.clone()),
                service_details: Value::Object(details),
            });
        }
    }
    if !ngos.is_empty() {
        categories.insert("ngos".to_string(), CategoryGroup::new("NGOs", ngos));
    }

    // Every other discovered category.
    let generic_fallback = Fallback {
        business_name: "WhiskerBond Services",
        address: "Digital Services Platform",
        description: "Professional service provider",
        business_type: None,
        name: None,
    };
    let mut others: BTreeMap<&str, Vec<ServiceListing>> = BTreeMap::new();
    for doc in documents.iter().filter(|d| {
        !d.category.starts_with("system.")
            && !is_reserved_category(&d.category)
            && !SPECIAL_CATEGORIES.contains(&d.category.to_lowercase().as_str())
    }) {
        let provider = provider_info(owner_of(doc), &generic_fallback);
        let bucket = others.entry(doc.category.as_str()).or_default();
        for svc in &doc.services {
            bucket.push(ServiceListing {
                id: svc.id.to_string(),
                name: if svc.service_name.is_empty() {
                    format!("{} Service", provider.business_name)
                } else {
                    svc.service_name.clone()
                },
                category: non_empty(&svc.category)
                    .map(str::to_string)
                    .unwrap_or_else(|| format_category_name(&doc.category)),
                description: non_empty(&svc.description).map(str::to_string).unwrap_or_else(|| {
                    format!("{} service provided by {}", doc.category, provider.business_name)
                }),
                location: provider.business_address.clone(),
                rating: svc.rating.or(doc.rating).unwrap_or(DEFAULT_RATING),
                price: svc.price.clone(),
                image: svc
                    .image
                    .clone()
                    .or_else(|| doc.image.clone())
                    .unwrap_or_else(|| default_service_image(&doc.category).to_string()),
                featured: svc.featured || doc.featured,
                pet_types: pet_types(&svc.pet_types, &doc.pet_types),
                collection_name: doc.category.clone(),
                provider: Some(provider.clone()),
                service_details: specialized_details(&doc.category, svc, doc),
            });
        }
    }
    for (category, services) in others {
        if !services.is_empty() {
            categories.insert(
                category.to_string(),
                CategoryGroup::new(format_category_name(category), services),
            );
        }
    }

    let all_services: Vec<ServiceListing> = ["trainers", "walkers", "boardings", "ngos"]
        .iter()
        .filter_map(|k| categories.get(*k))
        .chain(
            categories
                .iter()
                .filter(|(k, _)| !SPECIAL_CATEGORIES.contains(&k.as_str()))
                .map(|(_, g)| g),
        )
        .flat_map(|g| g.services.iter().cloned())
        .collect();

    ServiceCatalog {
        total_services: all_services.len(),
        total_categories: categories.len(),
        all_services,
        categories,
    }
}

/// Flat listing of the provider documents of one category.
pub fn category_listing(category: &str, documents: &[ProviderDocument]) -> CategoryListing {
    let label = format_category_name(category);
    let services: Vec<ServiceListing> = documents
        .iter()
        .map(|doc| ServiceListing {
            id: doc.id.to_string(),
            name: if doc.name.is_empty() {
                format!("Service {}", doc.id)
            } else {
                doc.name.clone()
            },
            category: label.clone(),
            description: non_empty(&doc.description)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Service from {category} category")),
            location: doc
                .business_address
                .clone()
                .unwrap_or_else(|| "WhiskerBond Services".into()),
            rating: doc.rating.unwrap_or(DEFAULT_RATING),
            price: attr(&doc.attributes, "price")
                .or_else(|| attr(&doc.attributes, "cost"))
                .map(|p| match p {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                }),
            image: doc
                .image
                .clone()
                .unwrap_or_else(|| default_service_image(category).to_string()),
            featured: doc.featured,
            pet_types: pet_types(&doc.pet_types, &[]),
            collection_name: category.to_string(),
            provider: None,
            service_details: Value::Null,
        })
        .collect();

    CategoryListing {
        category: label,
        count: services.len(),
        services,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn business(kind: &str, name: &str) -> BusinessUser {
        BusinessUser {
            id: Uuid::new_v4(),
            business_name: Some(name.into()),
            name: Some("Owner".into()),
            email: Some(format!("{kind}@example.com")),
            business_type: Some(kind.into()),
            rating: Some(4.5),
            ..Default::default()
        }
    }

    fn doc(category: &str, provider: Option<&BusinessUser>, services: &[&str]) -> ProviderDocument {
        let id = Uuid::new_v4();
        ProviderDocument {
            id,
            category: category.into(),
            provider_id: provider.map(|p| p.id),
            name: format!("{category} doc"),
            attributes: json!({}),
            services: services
                .iter()
                .map(|s| ProviderService {
                    id: Uuid::new_v4(),
                    provider_document_id: id,
                    service_name: s.to_string(),
                    attributes: json!({}),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn category_names_become_title_case() {
        assert_eq!(format_category_name("grooming"), "Grooming");
        assert_eq!(format_category_name("groomingSalons"), "Grooming Salons");
        assert_eq!(format_category_name("pet_sitters"), "Pet Sitters");
        assert_eq!(format_category_name("day-care"), "Day Care");
        assert_eq!(format_category_name("VetClinics"), "Vet Clinics");
    }

    #[test]
    fn unknown_categories_get_the_fallback_image() {
        assert_eq!(default_service_image("Boarding"), default_service_image("boarding"));
        assert_eq!(default_service_image("aquariums"), FALLBACK_IMAGE);
    }

    #[test]
    fn reserved_categories_are_case_insensitive() {
        assert!(is_reserved_category("PetOwners"));
        assert!(is_reserved_category("busers"));
        assert!(!is_reserved_category("vets"));
    }

    #[test]
    fn adoption_data_prefers_the_adoptions_list() {
        let attrs = json!({
            "adoptions": [{"name": "Rex", "status": "available"}, {"name": "Tom", "status": "adopted"}, {"name": "Bo"}],
            "animals": [{"name": "ignored"}]
        });
        let names: Vec<_> = adoption_data(&attrs).iter().map(|a| a["name"].clone()).collect();
        assert_eq!(names, vec![json!("Rex"), json!("Bo")]);

        let pets = json!({"pets": [{"name": "A", "available": false}, {"name": "B"}]});
        assert_eq!(adoption_data(&pets).len(), 1);
        assert!(adoption_data(&json!({})).is_empty());
    }

    #[test]
    fn vet_details_fall_back_through_service_then_document() {
        let mut vet = doc("vets", None, &["Dental Cleaning"]);
        vet.attributes = json!({"dentalServices": true, "specialties": ["Surgery"], "emergency24Hrs": true});
        vet.services[0].attributes = json!({"specialties": ["Dentistry"], "appointmentRequired": true});
        vet.services[0].duration = Some("45 minutes".into());

        let details = specialized_details("vets", &vet.services[0], &vet);
        assert_eq!(details["dentalServices"], json!(true));
        assert_eq!(details["specialties"], json!(["Dentistry"]));
        assert_eq!(details["surgicalServices"], json!(false));
        assert_eq!(details["appointmentRequired"], json!(true));
        assert_eq!(details["emergency24Hrs"], json!(true));
        assert_eq!(details["duration"], json!("45 minutes"));
    }

    #[test]
    fn catalog_groups_every_provider_kind() {
        let trainer = business("trainer", "Elite Pet Training");
        let walker = business("walker", "Happy Paws Walks");
        let boarding = business("boarding", "Cozy Kennels");
        let vet_owner = business("vet", "City Pet Clinic");
        let docs = vec![
            doc("trainers", Some(&trainer), &["Puppy Basics", "Agility"]),
            doc("vets", Some(&vet_owner), &["Vaccination"]),
            doc("grooming", None, &["Full Groom"]),
            doc("ngos", None, &[]),
            doc("emptyCategory", None, &[]),
        ];
        let users = vec![trainer, walker, boarding, vet_owner];

        let catalog = build_catalog(&docs, &users);
        let keys: Vec<_> = catalog.categories.keys().cloned().collect();
        assert_eq!(
            keys,
            vec!["boardings", "grooming", "ngos", "trainers", "vets", "walkers"]
        );
        assert_eq!(catalog.total_categories, 6);
        assert_eq!(catalog.total_services, 7);
        assert_eq!(catalog.all_services.len(), 7);
        assert_eq!(catalog.all_services[0].collection_name, "trainers");

        let trainers = &catalog.categories["trainers"];
        assert_eq!(trainers.count, 2);
        assert_eq!(trainers.services[0].category, "Training");
        let provider = trainers.services[0].provider.as_ref().unwrap();
        assert_eq!(provider.business_name, "Elite Pet Training");

        let walkers = &catalog.categories["walkers"];
        assert_eq!(walkers.services[0].name, "Walking Service by Happy Paws Walks");
        assert_eq!(walkers.services[0].service_details["walkingService"], json!(true));

        let boardings = &catalog.categories["boardings"];
        assert_eq!(boardings.services[0].name, "Boarding Service by Cozy Kennels");

        let ngo = &catalog.categories["ngos"].services[0];
        assert_eq!(ngo.name, "WhiskerBond NGO Services - Adoption Services");
        assert_eq!(ngo.price.as_deref(), Some("Free/Donation"));

        let grooming = &catalog.categories["grooming"];
        assert_eq!(grooming.category_name, "Grooming");
        assert_eq!(grooming.services[0].category, "Grooming");
        assert_eq!(grooming.services[0].rating, DEFAULT_RATING);
        assert_eq!(
            grooming.services[0].provider.as_ref().unwrap().business_address,
            "Digital Services Platform"
        );

        let vets = &catalog.categories["vets"].services[0];
        assert_eq!(vets.provider.as_ref().unwrap().id, Some(users[3].id.to_string()));
    }

    #[test]
    fn capitalised_special_categories_are_still_grouped() {
        let docs = vec![
            doc("Trainers", None, &["Recall Training"]),
            doc("NGOs", None, &[]),
        ];
        let catalog = build_catalog(&docs, &[]);

        assert_eq!(catalog.categories["trainers"].count, 1);
        assert_eq!(catalog.categories["trainers"].services[0].collection_name, "trainers");
        assert_eq!(catalog.categories["ngos"].count, 1);
        assert!(!catalog.categories.contains_key("Trainers"));
        assert!(!catalog.categories.contains_key("NGOs"));
    }

    #[test]
    fn category_listing_describes_documents() {
        let mut grooming = doc("grooming", None, &[]);
        grooming.attributes = json!({"price": 40});
        let listing = category_listing("grooming", &[grooming]);
        assert_eq!(listing.category, "Grooming");
        assert_eq!(listing.count, 1);
        assert_eq!(listing.services[0].id.len(), 36);
        assert_eq!(listing.services[0].price.as_deref(), Some("40"));
        assert_eq!(listing.services[0].description, "Service from grooming category");
    }
}
