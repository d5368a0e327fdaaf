//! Database row structs.
//!
//! Each row derives `FromRow` and converts into the matching
//! `responder_core` domain type; inputs reuse the core DTOs directly.

pub mod message_template;
pub mod outgoing_intent;
pub mod template_version;
