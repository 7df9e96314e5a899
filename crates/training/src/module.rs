use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use safeaid_core::{DomainError, DomainResult, Entity, FieldError, TrainingModuleId, UserId};

use crate::Level;

/// Categories offered by the client. The server accepts any non-empty category.
pub const SUGGESTED_CATEGORIES: [&str; 4] = ["First Aid", "Trauma Care", "Data Security", "Mental Health"];

/// Raw training payload, as received on create or update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingInput {
    pub title: Option<String>,
    pub category: Option<String>,
    pub duration: Option<String>,
    pub level: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTrainingModule {
    pub title: String,
    pub category: String,
    pub duration: String,
    pub level: Level,
    pub description: String,
    pub content: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainingPatch {
    pub title: Option<String>,
    pub category: Option<String>,
    pub duration: Option<String>,
    pub level: Option<Level>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub is_active: Option<bool>,
}

/// Stored training module; also the API form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingModule {
    pub id: TrainingModuleId,
    pub title: String,
    pub category: String,
    pub duration: String,
    pub level: Level,
    pub description: String,
    pub content: String,
    pub is_active: bool,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for TrainingModule {
    type Id = TrainingModuleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn text(errors: &mut Vec<FieldError>, field: &'static str, value: Option<String>) -> Option<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => {
            errors.push(FieldError::new(field, format!("{field} is required")));
            None
        }
    }
}

fn level(errors: &mut Vec<FieldError>, value: Option<String>) -> Option<Level> {
    let raw = value?;
    match raw.parse::<Level>() {
        Ok(level) => Some(level),
        Err(e) => {
            errors.push(FieldError::new("level", e.to_string()));
            None
        }
    }
}

impl TryFrom<TrainingInput> for NewTrainingModule {
    type Error = DomainError;

    fn try_from(input: TrainingInput) -> DomainResult<Self> {
        let mut errors = Vec::new();

        let title = text(&mut errors, "title", input.title);
        let category = text(&mut errors, "category", input.category);
        let duration = text(&mut errors, "duration", input.duration);
        let parsed_level = level(&mut errors, input.level);
        let description = text(&mut errors, "description", input.description);
        let content = text(&mut errors, "content", input.content);

        DomainError::check_fields(errors)?;

        match (title, category, duration, description, content) {
            (Some(title), Some(category), Some(duration), Some(description), Some(content)) => Ok(Self {
                title,
                category,
                duration,
                level: parsed_level.unwrap_or_default(),
                description,
                content,
                is_active: input.is_active.unwrap_or(true),
            }),
            _ => Err(DomainError::validation("training payload is incomplete")),
        }
    }
}

impl TryFrom<TrainingInput> for TrainingPatch {
    type Error = DomainError;

    fn try_from(input: TrainingInput) -> DomainResult<Self> {
        let mut errors = Vec::new();

        let patch = Self {
            title: input.title.and_then(|v| text(&mut errors, "title", Some(v))),
            category: input.category.and_then(|v| text(&mut errors, "category", Some(v))),
            duration: input.duration.and_then(|v| text(&mut errors, "duration", Some(v))),
            level: level(&mut errors, input.level),
            description: input
                .description
                .and_then(|v| text(&mut errors, "description", Some(v))),
            content: input.content.and_then(|v| text(&mut errors, "content", Some(v))),
            is_active: input.is_active,
        };

        DomainError::check_fields(errors)?;
        Ok(patch)
    }
}

impl TrainingModule {
    pub fn create(new: NewTrainingModule, created_by: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: TrainingModuleId::new(),
            title: new.title,
            category: new.category,
            duration: new.duration,
            level: new.level,
            description: new.description,
            content: new.content,
            is_active: new.is_active,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: TrainingPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(duration) = patch.duration {
            self.duration = duration;
        }
        if let Some(level) = patch.level {
            self.level = level;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        self.updated_at = now;
    }

    /// Case-insensitive category match.
    pub fn in_category(&self, category: &str) -> bool {
        self.category.eq_ignore_ascii_case(category.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn first_aid() -> TrainingInput {
        TrainingInput {
            title: Some("CPR basics".to_string()),
            category: Some("First Aid".to_string()),
            duration: Some("2 hours".to_string()),
            level: None,
            description: Some("Chest compressions".to_string()),
            content: Some("<p>Push hard, push fast</p>".to_string()),
            is_active: None,
        }
    }

    #[test]
    fn defaults_to_beginner_and_active() {
        let new = NewTrainingModule::try_from(first_aid()).unwrap();
        assert_eq!(new.level, Level::Beginner);
        assert!(new.is_active);
    }

    #[test]
    fn unknown_level_is_a_field_error() {
        let mut input = first_aid();
        input.level = Some("Expert".to_string());
        match NewTrainingModule::try_from(input).unwrap_err() {
            DomainError::InvalidFields(fields) => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].field, "level");
            }
            other => panic!("expected InvalidFields, got {other:?}"),
        }
    }

    #[test]
    fn blank_required_fields_are_reported_in_order() {
        let err = NewTrainingModule::try_from(TrainingInput::default()).unwrap_err();
        match err {
            DomainError::InvalidFields(fields) => {
                let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, ["title", "category", "duration", "description", "content"]);
                assert_eq!(fields[0].message, "title is required");
            }
            other => panic!("expected InvalidFields, got {other:?}"),
        }
    }

    #[test]
    fn patch_merges_and_refreshes_timestamp() {
        let created = Utc::now();
        let mut module =
            TrainingModule::create(NewTrainingModule::try_from(first_aid()).unwrap(), UserId::new(), created);

        let patch = TrainingPatch::try_from(TrainingInput {
            level: Some("Advanced".to_string()),
            is_active: Some(false),
            ..Default::default()
        })
        .unwrap();
        let later = created + chrono::Duration::minutes(1);
        module.apply(patch, later);

        assert_eq!(module.level, Level::Advanced);
        assert!(!module.is_active);
        assert_eq!(module.title, "CPR basics");
        assert_eq!(module.updated_at, later);
    }

    #[test]
    fn patch_rejects_blank_present_fields() {
        let err = TrainingPatch::try_from(TrainingInput {
            title: Some("".to_string()),
            ..Default::default()
        });
        assert!(err.is_err());
    }

    #[test]
    fn api_form_is_camel_case() {
        let module = TrainingModule::create(NewTrainingModule::try_from(first_aid()).unwrap(), UserId::new(), Utc::now());
        let json = serde_json::to_value(&module).unwrap();
        assert_eq!(json["isActive"], true);
        assert_eq!(json["level"], "Beginner");
        assert!(json.get("createdBy").is_some());
    }

    #[test]
    fn category_match_ignores_case() {
        let module = TrainingModule::create(NewTrainingModule::try_from(first_aid()).unwrap(), UserId::new(), Utc::now());
        assert!(module.in_category("first aid"));
        assert!(!module.in_category("Mental Health"));
    }

    #[test]
    fn suggested_categories_are_the_client_set() {
        assert!(SUGGESTED_CATEGORIES.contains(&"Trauma Care"));
        assert_eq!(SUGGESTED_CATEGORIES.len(), 4);
    }

    proptest! {
        #[test]
        fn whitespace_title_is_never_accepted(pad in "[ \t\n]{0,8}") {
            let mut input = first_aid();
            input.title = Some(pad);
            prop_assert!(NewTrainingModule::try_from(input).is_err());
        }

        #[test]
        fn only_the_four_levels_parse(level in "[A-Za-z]{1,12}") {
            let mut input = first_aid();
            input.level = Some(level.clone());
            let known = Level::ALL.iter().any(|l| l.as_str() == level);
            prop_assert_eq!(NewTrainingModule::try_from(input).is_ok(), known);
        }
    }
}
