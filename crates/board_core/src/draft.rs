use chrono::NaiveDateTime;
use shared::{
    domain::{ColumnId, DashboardId, UserId},
    protocol::CreateCardRequest,
};
use thiserror::Error;

pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Ordered free-text tag entry. Tags are committed one at a time by
/// pressing Enter; insertion order is display order, duplicates and empty
/// strings are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagCollector {
    current_input: String,
    tags: Vec<String>,
}

impl TagCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input_changed(&mut self, value: impl Into<String>) {
        self.current_input = value.into();
    }

    /// Enter commits the pending input to the end of the list and clears
    /// it; every other key leaves the list untouched.
    pub fn key_pressed(&mut self, key: &str) {
        if key == "Enter" {
            self.tags.push(std::mem::take(&mut self.current_input));
        }
    }

    pub fn current_input(&self) -> &str {
        &self.current_input
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn into_tags(self) -> Vec<String> {
        self.tags
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Title,
    Description,
}

impl DraftField {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftField::Title => "title",
            DraftField::Description => "description",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("required fields missing: {missing:?}")]
pub struct DraftValidationError {
    pub missing: Vec<DraftField>,
}

/// Client-local, not-yet-submitted card. Created empty when the modal
/// opens, mutated field by field, consumed exactly once at submit and
/// discarded on close regardless of outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardDraft {
    pub assignee_user_id: Option<UserId>,
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDateTime>,
    pub image_url: String,
}

impl CardDraft {
    /// Required-field check. Pure; reports every missing field so a form
    /// layer can mark them all at once.
    pub fn validate(&self) -> Result<(), DraftValidationError> {
        let mut missing = Vec::new();
        if self.title.is_empty() {
            missing.push(DraftField::Title);
        }
        if self.description.is_empty() {
            missing.push(DraftField::Description);
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DraftValidationError { missing })
        }
    }

    /// Pure payload composition: numeric id coercion and due-date
    /// formatting happen here and nowhere else.
    pub fn to_create_request(
        &self,
        dashboard_id: DashboardId,
        column_id: ColumnId,
        tags: Vec<String>,
    ) -> CreateCardRequest {
        CreateCardRequest {
            assignee_user_id: self.assignee_user_id.map(|id| id.0).unwrap_or_default(),
            dashboard_id: dashboard_id.0,
            column_id,
            title: self.title.clone(),
            description: self.description.clone(),
            due_date: self
                .due_date
                .map(|date| date.format(DUE_DATE_FORMAT).to_string())
                .unwrap_or_default(),
            tags,
            image_url: self.image_url.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
#[path = "tests/draft_tests.rs"]
mod tests;
