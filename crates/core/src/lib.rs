//! Domain logic for outgoing message templates.
//!
//! Templates belong to an outgoing intent and carry a conditions expression
//! plus a markup body. Every accepted write records a version snapshot, and
//! any snapshot can later be restored onto its template.

pub mod conditions;
pub mod error;
pub mod markup;
pub mod memory;
pub mod message_template;
pub mod outgoing_intent;
pub mod paging;
pub mod repository;
pub mod restore;
pub mod template_store;
pub mod types;
pub mod validation;
