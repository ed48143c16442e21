use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Treats an empty or whitespace-only field as absent.
pub fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub alternate_phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderRegisterInput {
    pub business_name: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub contact_no: Option<String>,
    pub address: Option<String>,
    pub business_type: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RefreshInput {
    pub refresh_token: Option<String>,
}

/// Age arrives either as a JSON number or as a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AgeInput {
    Number(f64),
    Text(String),
}

impl AgeInput {
    /// Leading integer of the value, the way form inputs usually send it.
    pub fn years(&self) -> Option<i32> {
        match self {
            AgeInput::Number(n) if n.is_finite() => Some(n.trunc() as i32),
            AgeInput::Number(_) => None,
            AgeInput::Text(s) => {
                let s = s.trim();
                let end = s
                    .char_indices()
                    .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
                    .map(|(i, _)| i)
                    .unwrap_or(s.len());
                s[..end].parse().ok()
            }
        }
    }

    /// Zero and unparseable ages count as missing.
    pub fn is_blank(&self) -> bool {
        self.years().map_or(true, |y| y == 0)
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PetInput {
    pub name: Option<String>,
    pub age: Option<AgeInput>,
    #[serde(rename = "type")]
    pub pet_type: Option<String>,
    pub breed: Option<String>,
    pub behavior: Option<String>,
    pub allergies: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingInput {
    pub pet_id: Option<String>,
    pub pet_name: Option<String>,
    pub pet_parent: Option<String>,
    pub service_name: Option<String>,
    pub service_category: Option<String>,
    pub provider: Option<String>,
    pub provider_id: Option<String>,
    pub service_id: Option<String>,
    pub price: Option<Value>,
    pub duration: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub notes: Option<String>,
    pub symptoms: Option<String>,
    pub is_emergency: Option<bool>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AppointmentUpdateInput {
    pub status: Option<String>,
    pub notes: Option<String>,
    pub symptoms: Option<String>,
    pub appointment_time: Option<DateTime<Utc>>,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub prescription: Option<Value>,
    pub follow_up_required: Option<bool>,
    pub documents: Option<Value>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingCheckQuery {
    pub pet_id: Option<String>,
    pub service_name: Option<String>,
}

/// Public view of a pet owner.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOut {
    pub id: uuid::Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub alternate_phone: Option<String>,
    pub address: String,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<common::PetOwner> for UserOut {
    fn from(o: common::PetOwner) -> Self {
        Self {
            id: o.id,
            name: o.name,
            email: o.email,
            phone: o.phone,
            alternate_phone: o.alternate_phone,
            address: o.address,
            avatar: o.avatar,
            created_at: o.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn age_accepts_numbers_and_numeric_strings() {
        let n: AgeInput = serde_json::from_value(json!(3)).unwrap();
        assert_eq!(n.years(), Some(3));
        let s: AgeInput = serde_json::from_value(json!("4")).unwrap();
        assert_eq!(s.years(), Some(4));
        let loose: AgeInput = serde_json::from_value(json!("5 years")).unwrap();
        assert_eq!(loose.years(), Some(5));
        let junk: AgeInput = serde_json::from_value(json!("old")).unwrap();
        assert_eq!(junk.years(), None);
        assert!(junk.is_blank());
    }

    #[test]
    fn pet_input_reads_the_type_field() {
        let pet: PetInput = serde_json::from_value(json!({
            "name": "Kutta", "age": "2", "type": "Dog", "breed": "Indie", "allergies": "None"
        }))
        .unwrap();
        assert_eq!(pet.pet_type.as_deref(), Some("Dog"));
        assert!(pet.behavior.is_none());
    }

    #[test]
    fn blank_fields_are_not_present() {
        assert_eq!(present(&Some("  ".into())), None);
        assert_eq!(present(&Some(" a ".into())), Some("a"));
        assert_eq!(present(&None), None);
    }
}
