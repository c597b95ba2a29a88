use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GymSettings {
    pub gym_name: String,
    pub contact_email: String,
    pub phone_number: String,
    pub address: String,
    pub username: String,
}

impl Default for GymSettings {
    fn default() -> Self {
        Self {
            gym_name: "FD GYM".to_string(),
            contact_email: "contact@fdgym.com".to_string(),
            phone_number: "+91 9876543210".to_string(),
            address: "123 Fitness Street, Workout City".to_string(),
            username: "admin".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SettingsForm {
    pub gym_name: String,
    pub contact_email: String,
    pub phone_number: String,
    pub address: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl SettingsForm {
    pub fn settings(&self) -> GymSettings {
        GymSettings {
            gym_name: self.gym_name.trim().to_string(),
            contact_email: self.contact_email.trim().to_string(),
            phone_number: self.phone_number.trim().to_string(),
            address: self.address.trim().to_string(),
            username: self.username.trim().to_string(),
        }
    }

    pub fn new_password(&self) -> Option<&str> {
        Some(self.password.as_str()).filter(|p| !p.is_empty())
    }
}
