//! Back-office data that lives in the local key/value store rather than in
//! its own table: the admin workout list and the gym settings.

use std::time::Duration;

use rand::Rng;

use crate::error::{AppError, Result};
use crate::models::{AdminWorkout, GymSettings, WorkoutForm};
use crate::repositories::LocalStoreRepository;

pub const WORKOUTS_KEY: &str = "workouts";
pub const SETTINGS_KEY: &str = "gym_settings";

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 9;

/// `workout_` followed by nine random base-36 characters.
pub fn new_workout_id() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("workout_{suffix}")
}

#[derive(Clone)]
pub struct AdminStore {
    store: LocalStoreRepository,
    latency: Duration,
}

impl AdminStore {
    pub fn new(store: LocalStoreRepository, latency: Duration) -> Self {
        Self { store, latency }
    }

    /// Writes are delayed by the configured latency so the admin screens
    /// behave like they talk to a slow backend.
    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    pub async fn list_workouts(&self) -> Result<Vec<AdminWorkout>> {
        Ok(self.store.get(WORKOUTS_KEY).await?.unwrap_or_default())
    }

    pub async fn find_workout(&self, id: &str) -> Result<Option<AdminWorkout>> {
        Ok(self
            .list_workouts()
            .await?
            .into_iter()
            .find(|w| w.id == id))
    }

    pub async fn create_workout(&self, form: WorkoutForm) -> Result<AdminWorkout> {
        form.validate().map_err(AppError::Validation)?;
        self.simulate_latency().await;

        let workout = AdminWorkout {
            id: new_workout_id(),
            name: form.name.trim().to_string(),
            description: form.description.trim().to_string(),
            category: form.category,
            difficulty: form.difficulty,
            duration: form.duration,
        };
        let mut workouts = self.list_workouts().await?;
        workouts.push(workout.clone());
        self.store.set(WORKOUTS_KEY, &workouts).await?;

        tracing::info!("Added admin workout {}", workout.id);
        Ok(workout)
    }

    pub async fn update_workout(&self, id: &str, form: WorkoutForm) -> Result<AdminWorkout> {
        form.validate().map_err(AppError::Validation)?;
        self.simulate_latency().await;

        let mut workouts = self.list_workouts().await?;
        let workout = workouts
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Workout {id} not found")))?;
        workout.name = form.name.trim().to_string();
        workout.description = form.description.trim().to_string();
        workout.category = form.category;
        workout.difficulty = form.difficulty;
        workout.duration = form.duration;
        let updated = workout.clone();

        self.store.set(WORKOUTS_KEY, &workouts).await?;
        Ok(updated)
    }

    pub async fn delete_workout(&self, id: &str) -> Result<()> {
        self.simulate_latency().await;

        let mut workouts = self.list_workouts().await?;
        let before = workouts.len();
        workouts.retain(|w| w.id != id);
        if workouts.len() == before {
            return Err(AppError::NotFound(format!("Workout {id} not found")));
        }

        self.store.set(WORKOUTS_KEY, &workouts).await?;
        tracing::info!("Deleted admin workout {}", id);
        Ok(())
    }

    pub async fn settings(&self) -> Result<GymSettings> {
        Ok(self.store.get(SETTINGS_KEY).await?.unwrap_or_default())
    }

    pub async fn save_settings(&self, settings: &GymSettings) -> Result<()> {
        if settings.gym_name.is_empty() || settings.username.is_empty() {
            return Err(AppError::Validation(
                "Gym name and username are required".to_string(),
            ));
        }
        self.simulate_latency().await;
        self.store.set(SETTINGS_KEY, settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;
    use crate::migrations::run_migrations_for_tests;

    fn store() -> AdminStore {
        let pool = create_memory_pool().unwrap();
        run_migrations_for_tests(&pool).unwrap();
        AdminStore::new(LocalStoreRepository::new(pool), Duration::ZERO)
    }

    fn form(name: &str) -> WorkoutForm {
        WorkoutForm {
            name: name.to_string(),
            description: "Heavy compound lifts".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_workout_id_format() {
        let id = new_workout_id();
        let suffix = id.strip_prefix("workout_").unwrap();
        assert_eq!(suffix.len(), 9);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[tokio::test]
    async fn test_workout_crud() {
        let store = store();
        assert!(store.list_workouts().await.unwrap().is_empty());

        let created = store.create_workout(form("Push Day")).await.unwrap();
        assert_eq!(created.category, "strength");
        assert_eq!(created.duration, 30);

        let mut edit = form("Push Day v2");
        edit.duration = 45;
        let updated = store.update_workout(&created.id, edit).await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.duration, 45);

        let all = store.list_workouts().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Push Day v2");

        store.delete_workout(&created.id).await.unwrap();
        assert!(store.find_workout(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_workout_is_not_found() {
        let store = store();
        let err = store.delete_workout("workout_missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let err = store
            .update_workout("workout_missing", form("X"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_invalid_workout_rejected() {
        let store = store();
        let err = store.create_workout(form(" ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(store.list_workouts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_settings_default_then_saved() {
        let store = store();
        assert_eq!(store.settings().await.unwrap(), GymSettings::default());

        let settings = GymSettings {
            gym_name: "Iron Temple".to_string(),
            ..GymSettings::default()
        };
        store.save_settings(&settings).await.unwrap();
        assert_eq!(store.settings().await.unwrap().gym_name, "Iron Temple");
    }
}
