use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::{FromSqliteRow, Subscription};

pub const DEFAULT_IMAGE_URL: &str = "https://images.unsplash.com/photo-1500648767791-00dcc994a43e";

/// Body metrics stored in the identity record's metadata blob.
///
/// Unknown keys are preserved so a merge never drops data written by another
/// client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProfileMetadata {
    /// Shallow merge: fields present in `update` win, absent fields keep
    /// their current value.
    pub fn merge(&mut self, update: ProfileMetadata) {
        if update.height.is_some() {
            self.height = update.height;
        }
        if update.weight.is_some() {
            self.weight = update.weight;
        }
        if update.age.is_some() {
            self.age = update.age;
        }
        self.extra.extend(update.extra);
    }

    /// Body mass index from height in centimetres and weight in kilograms,
    /// rounded to one decimal.
    pub fn bmi(&self) -> Option<f64> {
        let height = self.height.filter(|h| *h > 0.0)?;
        let weight = self.weight.filter(|w| *w > 0.0)?;
        let metres = height / 100.0;
        Some((weight / (metres * metres) * 10.0).round() / 10.0)
    }
}

pub fn bmi_category(bmi: f64) -> &'static str {
    if bmi < 18.5 {
        "Underweight"
    } else if bmi < 25.0 {
        "Normal weight"
    } else if bmi < 30.0 {
        "Overweight"
    } else {
        "Obese"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailAddress {
    pub email_address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoneNumber {
    pub phone_number: String,
}

/// Identity providers send `null` for unset names and metadata.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A user as the identity provider describes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberProfile {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email_addresses: Vec<EmailAddress>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phone_numbers: Vec<PhoneNumber>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_url: String,
    #[serde(default, alias = "public_metadata", deserialize_with = "null_as_default")]
    pub metadata: ProfileMetadata,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl MemberProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn primary_email(&self) -> &str {
        self.email_addresses
            .first()
            .map(|e| e.email_address.as_str())
            .unwrap_or("")
    }

    pub fn initials(&self) -> String {
        self.first_name
            .chars()
            .take(1)
            .chain(self.last_name.chars().take(1))
            .collect::<String>()
            .to_uppercase()
    }
}

/// Row in the local `members` table.
#[derive(Debug, Clone)]
pub struct Member {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub image_url: Option<String>,
    pub metadata: ProfileMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromSqliteRow for Member {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let metadata: String = row.get("metadata")?;
        Ok(Self {
            id: row.get("id")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            email: row.get("email")?,
            phone: row.get("phone")?,
            password_hash: row.get("password_hash")?,
            image_url: row.get("image_url")?,
            metadata: serde_json::from_str(&metadata).unwrap_or_default(),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

impl From<Member> for MemberProfile {
    fn from(member: Member) -> Self {
        Self {
            id: member.id,
            first_name: member.first_name,
            last_name: member.last_name,
            email_addresses: vec![EmailAddress {
                email_address: member.email,
            }],
            phone_numbers: member
                .phone
                .map(|phone_number| vec![PhoneNumber { phone_number }])
                .unwrap_or_default(),
            image_url: member
                .image_url
                .unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string()),
            metadata: member.metadata,
            created_at: Some(member.created_at),
            updated_at: Some(member.updated_at),
        }
    }
}

/// Admin user listing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberWithStatus {
    #[serde(flatten)]
    pub profile: MemberProfile,
    pub subscription_status: String,
}

/// Profile plus the member's active subscription, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberDetail {
    #[serde(flatten)]
    pub profile: MemberProfile,
    pub subscription: Option<Subscription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMember {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl CreateMember {
    pub fn validate(&self) -> Result<(), String> {
        if self.first_name.trim().is_empty()
            || self.last_name.trim().is_empty()
            || self.email.trim().is_empty()
            || self.password.is_empty()
        {
            return Err("Missing required fields".to_string());
        }
        if !self.email.contains('@') {
            return Err("Invalid email address".to_string());
        }
        if self.password.len() < 8 {
            return Err("Password must be at least 8 characters".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ProfileMetadata>,
}

impl UpdateProfile {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.image_url.is_none()
            && self.metadata.is_none()
    }
}
