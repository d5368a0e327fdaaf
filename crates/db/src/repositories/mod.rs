//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query functions.
//! Reads take `&PgPool`; writes that must share a transaction take
//! `&mut PgConnection` so callers can pass `&mut *tx`.

pub mod message_template_repo;
pub mod outgoing_intent_repo;
pub mod template_version_repo;

pub use message_template_repo::MessageTemplateRepo;
pub use outgoing_intent_repo::OutgoingIntentRepo;
pub use template_version_repo::TemplateVersionRepo;
