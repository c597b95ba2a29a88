//! Case-insensitive substring filters for the admin list screens.

use crate::models::{
    AdminWorkout, AttendanceRecord, MemberProfile, MemberWithStatus, SubscriptionWithMember,
};

/// A record that can be matched against a free-text admin query.
pub trait Searchable {
    /// Text fields the query is matched against.
    fn search_fields(&self) -> Vec<String>;

    fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Keep the items matching `query`, in their original order. An empty query
/// keeps everything.
pub fn filter_by_query<T: Searchable>(items: Vec<T>, query: &str) -> Vec<T> {
    if query.is_empty() {
        return items;
    }
    items.into_iter().filter(|item| item.matches(query)).collect()
}

impl Searchable for MemberProfile {
    fn search_fields(&self) -> Vec<String> {
        vec![
            format!("{} {}", self.first_name, self.last_name),
            self.primary_email().to_string(),
        ]
    }
}

impl Searchable for MemberWithStatus {
    fn search_fields(&self) -> Vec<String> {
        self.profile.search_fields()
    }
}

impl Searchable for SubscriptionWithMember {
    fn search_fields(&self) -> Vec<String> {
        let mut fields = vec![self.subscription.plan_name.clone()];
        if let Some(user) = &self.user {
            fields.extend(user.search_fields());
        }
        fields
    }
}

impl Searchable for AdminWorkout {
    fn search_fields(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.description.clone(),
            self.category.clone(),
        ]
    }
}

impl Searchable for AttendanceRecord {
    fn search_fields(&self) -> Vec<String> {
        vec![self.name.clone(), self.email.clone()]
    }
}
