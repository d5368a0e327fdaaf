//! Message template domain types.
//!
//! A message template pairs a conditions expression with a markup body and
//! belongs to exactly one outgoing intent. Only `conditions` and
//! `message_markup` are versioned; every accepted write records their values
//! as a [`VersionSnapshot`].

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

/// Maximum length (in UTF-8 bytes) of a message template name.
pub const NAME_MAX_LENGTH: usize = 255;

// ---------------------------------------------------------------------------
// Field names
// ---------------------------------------------------------------------------

pub const FIELD_NAME: &str = "name";
pub const FIELD_CONDITIONS: &str = "conditions";
pub const FIELD_MESSAGE_MARKUP: &str = "message_markup";

/// The current state of a message template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    pub id: DbId,
    pub outgoing_intent_id: DbId,
    pub name: String,
    pub conditions: String,
    pub message_markup: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl MessageTemplate {
    /// The versioned subset of this template's fields.
    pub fn properties(&self) -> VersionProperties {
        VersionProperties {
            conditions: self.conditions.clone(),
            message_markup: self.message_markup.clone(),
        }
    }

    /// Start a candidate for rewriting this template in place.
    pub fn to_candidate(&self) -> TemplateCandidate {
        TemplateCandidate {
            id: Some(self.id),
            outgoing_intent_id: self.outgoing_intent_id,
            name: self.name.clone(),
            conditions: self.conditions.clone(),
            message_markup: self.message_markup.clone(),
        }
    }
}

/// DTO for creating a message template. Absent fields default to empty text
/// so that validation, not deserialization, reports them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateMessageTemplate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub conditions: Option<String>,
    #[serde(default)]
    pub message_markup: String,
}

/// DTO for updating a message template. Only `Some` fields are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMessageTemplate {
    pub name: Option<String>,
    pub conditions: Option<String>,
    pub message_markup: Option<String>,
}

/// A template as it would be written: the input to the validation pipeline
/// and to the repository's atomic write operations.
///
/// `id` is `None` for a record that has not been created yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateCandidate {
    pub id: Option<DbId>,
    pub outgoing_intent_id: DbId,
    pub name: String,
    pub conditions: String,
    pub message_markup: String,
}

impl TemplateCandidate {
    /// Build a candidate for a new template under `outgoing_intent_id`.
    pub fn new(outgoing_intent_id: DbId, input: &CreateMessageTemplate) -> Self {
        Self {
            id: None,
            outgoing_intent_id,
            name: input.name.clone(),
            conditions: input.conditions.clone().unwrap_or_default(),
            message_markup: input.message_markup.clone(),
        }
    }

    /// Merge the `Some` fields of `patch` into this candidate.
    pub fn apply(mut self, patch: &UpdateMessageTemplate) -> Self {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(conditions) = &patch.conditions {
            self.conditions = conditions.clone();
        }
        if let Some(markup) = &patch.message_markup {
            self.message_markup = markup.clone();
        }
        self
    }

    /// Overwrite only the versioned fields with a snapshot's properties.
    pub fn with_properties(mut self, properties: &VersionProperties) -> Self {
        self.conditions = properties.conditions.clone();
        self.message_markup = properties.message_markup.clone();
        self
    }

    pub fn properties(&self) -> VersionProperties {
        VersionProperties {
            conditions: self.conditions.clone(),
            message_markup: self.message_markup.clone(),
        }
    }
}

/// The versioned fields of a template at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionProperties {
    pub conditions: String,
    pub message_markup: String,
}

/// One immutable entry in a template's version history.
///
/// `id` is global and strictly increasing across all templates; it is the
/// version id callers pass to restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionSnapshot {
    pub id: DbId,
    pub subject_id: DbId,
    pub properties: VersionProperties,
    pub created_at: Timestamp,
}

/// A template as returned by a fetch: the current state plus the version
/// metadata used for audit display.
#[derive(Debug, Clone, Serialize)]
pub struct MessageTemplateDetail {
    #[serde(flatten)]
    pub template: MessageTemplate,
    /// The most recent snapshot (the one describing the current state).
    pub current_version: Option<VersionSnapshot>,
    /// Every snapshot of this template, newest first.
    pub history: Vec<VersionSnapshot>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
