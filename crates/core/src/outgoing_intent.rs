//! Outgoing intents: the parent aggregate that owns message templates.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{CoreError, ValidationFailure};
use crate::types::{DbId, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingIntent {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating an outgoing intent.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOutgoingIntent {
    #[validate(length(min = 1, max = 255, message = "Outgoing intent name must be 1-255 characters"))]
    pub name: String,
}

impl CreateOutgoingIntent {
    /// Check the input, reporting the first offending field.
    pub fn check(&self) -> Result<(), CoreError> {
        let Err(errors) = self.validate() else {
            return Ok(());
        };
        let message = errors
            .field_errors()
            .get("name")
            .and_then(|errs| errs.first())
            .and_then(|e| e.message.as_ref())
            .map(|m| m.to_string())
            .unwrap_or_else(|| "Outgoing intent name is invalid".to_string());
        Err(ValidationFailure::new("name", message).into())
    }
}
