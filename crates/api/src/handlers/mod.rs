//! HTTP handlers. Each submodule backs the route module of the same name.

pub mod message_template;
pub mod outgoing_intent;
