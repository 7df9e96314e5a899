//! In-memory resource caches.
//!
//! Each cache holds the last list fetched from the API. The API stays the
//! authority: the application replaces a cache wholesale after every
//! mutation rather than patching it locally.

use chrono::{DateTime, Utc};

use safeaid_core::Entity;
use safeaid_training::TrainingModule;

#[derive(Debug, Clone)]
pub struct ResourceCache<T> {
    items: Vec<T>,
    fetched_at: Option<DateTime<Utc>>,
}

impl<T> Default for ResourceCache<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            fetched_at: None,
        }
    }
}

impl<T: Entity> ResourceCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with a fresh listing.
    pub fn replace(&mut self, items: Vec<T>, fetched_at: DateTime<Utc>) {
        self.items = items;
        self.fetched_at = Some(fetched_at);
    }

    pub fn all(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `None` until the first successful fetch.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.fetched_at = None;
    }
}

impl ResourceCache<TrainingModule> {
    /// Modules in `category`, compared case-insensitively.
    pub fn by_category(&self, category: &str) -> Vec<&TrainingModule> {
        self.items.iter().filter(|m| m.in_category(category)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use safeaid_core::UserId;
    use safeaid_training::{NewTrainingModule, TrainingInput};

    fn module(title: &str, category: &str) -> TrainingModule {
        let new = NewTrainingModule::try_from(TrainingInput {
            title: Some(title.to_string()),
            category: Some(category.to_string()),
            duration: Some("1 hour".to_string()),
            description: Some("desc".to_string()),
            content: Some("content".to_string()),
            ..Default::default()
        })
        .unwrap();
        TrainingModule::create(new, UserId::new(), Utc::now())
    }

    #[test]
    fn empty_until_fetched() {
        let cache: ResourceCache<TrainingModule> = ResourceCache::new();
        assert!(cache.is_empty());
        assert!(cache.fetched_at().is_none());
    }

    #[test]
    fn lookup_and_category_filter() {
        let a = module("CPR", "First Aid");
        let b = module("Phishing", "Data Security");
        let c = module("Splints", "first aid");

        let mut cache = ResourceCache::new();
        cache.replace(vec![a.clone(), b.clone(), c.clone()], Utc::now());

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get(&b.id).map(|m| m.title.as_str()), Some("Phishing"));
        assert!(cache.get(&safeaid_core::TrainingModuleId::new()).is_none());

        let first_aid: Vec<_> = cache.by_category("First Aid").iter().map(|m| m.id).collect();
        assert_eq!(first_aid, vec![a.id, c.id]);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.fetched_at().is_none());
    }
}
