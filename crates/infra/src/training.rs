//! Training module service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use safeaid_core::{TrainingModuleId, UserId};
use safeaid_training::{NewTrainingModule, TrainingInput, TrainingModule, TrainingPatch};

use crate::error::{ServiceError, ServiceResult};
use crate::store::DocumentStore;

/// Listing filter. The default lists active modules in every category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainingFilter {
    pub include_inactive: bool,
    pub category: Option<String>,
}

#[derive(Clone)]
pub struct TrainingService {
    store: Arc<dyn DocumentStore<TrainingModule>>,
}

impl TrainingService {
    pub fn new(store: Arc<dyn DocumentStore<TrainingModule>>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, input), err)]
    pub async fn create(&self, input: TrainingInput, created_by: UserId, now: DateTime<Utc>) -> ServiceResult<TrainingModule> {
        let new = NewTrainingModule::try_from(input)?;
        let module = self.store.insert(TrainingModule::create(new, created_by, now)).await?;
        info!(training_id = %module.id, level = %module.level, "training module created");
        Ok(module)
    }

    pub async fn list(&self, filter: &TrainingFilter) -> ServiceResult<Vec<TrainingModule>> {
        let modules = self.store.list().await?;
        Ok(modules
            .into_iter()
            .filter(|m| filter.include_inactive || m.is_active)
            .filter(|m| filter.category.as_deref().is_none_or(|c| m.in_category(c)))
            .collect())
    }

    pub async fn get(&self, id: TrainingModuleId) -> ServiceResult<TrainingModule> {
        self.store.get(id).await?.ok_or(ServiceError::NotFound("training module"))
    }

    #[instrument(skip(self, input), err)]
    pub async fn update(&self, id: TrainingModuleId, input: TrainingInput, now: DateTime<Utc>) -> ServiceResult<TrainingModule> {
        let patch = TrainingPatch::try_from(input)?;
        let mut module = self.get(id).await?;
        module.apply(patch, now);

        if !self.store.replace(module.clone()).await? {
            return Err(ServiceError::NotFound("training module"));
        }
        info!(training_id = %id, "training module updated");
        Ok(module)
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&self, id: TrainingModuleId) -> ServiceResult<()> {
        if !self.store.delete(id).await? {
            return Err(ServiceError::NotFound("training module"));
        }
        info!(training_id = %id, "training module deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use safeaid_training::Level;

    use crate::store::InMemoryDocumentStore;

    fn service() -> TrainingService {
        TrainingService::new(Arc::new(InMemoryDocumentStore::new()))
    }

    fn input(title: &str, category: &str, active: Option<bool>) -> TrainingInput {
        TrainingInput {
            title: Some(title.to_string()),
            category: Some(category.to_string()),
            duration: Some("1 hour".to_string()),
            level: None,
            description: Some("desc".to_string()),
            content: Some("<p>content</p>".to_string()),
            is_active: active,
        }
    }

    #[tokio::test]
    async fn listing_hides_inactive_unless_asked() {
        let svc = service();
        let trainer = UserId::new();
        let now = Utc::now();
        svc.create(input("CPR", "First Aid", None), trainer, now).await.unwrap();
        svc.create(input("Old", "First Aid", Some(false)), trainer, now).await.unwrap();

        assert_eq!(svc.list(&TrainingFilter::default()).await.unwrap().len(), 1);
        let all = TrainingFilter {
            include_inactive: true,
            ..Default::default()
        };
        assert_eq!(svc.list(&all).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn category_filter() {
        let svc = service();
        let now = Utc::now();
        svc.create(input("CPR", "First Aid", None), UserId::new(), now).await.unwrap();
        svc.create(input("PFA", "Mental Health", None), UserId::new(), now).await.unwrap();

        let filter = TrainingFilter {
            category: Some("mental health".to_string()),
            ..Default::default()
        };
        let found = svc.list(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "PFA");
    }

    #[tokio::test]
    async fn update_and_delete() {
        let svc = service();
        let now = Utc::now();
        let module = svc.create(input("CPR", "First Aid", None), UserId::new(), now).await.unwrap();
        assert_eq!(module.level, Level::Beginner);

        let updated = svc
            .update(
                module.id,
                TrainingInput {
                    level: Some("Essential".to_string()),
                    ..Default::default()
                },
                now,
            )
            .await
            .unwrap();
        assert_eq!(updated.level, Level::Essential);
        assert_eq!(svc.get(module.id).await.unwrap().level, Level::Essential);

        svc.delete(module.id).await.unwrap();
        assert!(matches!(
            svc.get(module.id).await,
            Err(ServiceError::NotFound("training module"))
        ));
    }
}
