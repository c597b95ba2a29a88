use serde::{Deserialize, Deserializer, Serialize};

/// Workout managed from the admin demo screen, persisted in the local store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminWorkout {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub difficulty: String,
    /// Minutes.
    pub duration: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Minutes {
    Number(u32),
    Text(String),
}

/// Accepts a JSON number or a form string; an empty string means the default.
fn deserialize_minutes<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match Minutes::deserialize(deserializer)? {
        Minutes::Number(n) => Ok(n),
        Minutes::Text(s) if s.trim().is_empty() => Ok(default_duration()),
        Minutes::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn default_duration() -> u32 {
    30
}

fn default_category() -> String {
    "strength".to_string()
}

fn default_difficulty() -> String {
    "beginner".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkoutForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    #[serde(default = "default_duration", deserialize_with = "deserialize_minutes")]
    pub duration: u32,
}

impl Default for WorkoutForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            category: default_category(),
            difficulty: default_difficulty(),
            duration: default_duration(),
        }
    }
}

impl WorkoutForm {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() || self.description.trim().is_empty() {
            return Err("Name and description are required".to_string());
        }
        if self.duration == 0 {
            return Err("Duration must be at least one minute".to_string());
        }
        Ok(())
    }
}

impl From<&AdminWorkout> for WorkoutForm {
    fn from(workout: &AdminWorkout) -> Self {
        Self {
            name: workout.name.clone(),
            description: workout.description.clone(),
            category: workout.category.clone(),
            difficulty: workout.difficulty.clone(),
            duration: workout.duration,
        }
    }
}

pub const WORKOUT_CATEGORIES: &[&str] = &["strength", "cardio", "flexibility", "hiit", "core"];
pub const WORKOUT_DIFFICULTIES: &[&str] = &["beginner", "intermediate", "advanced"];
