//! HTTP route handlers.

pub mod health;
pub mod publish;
pub mod subscribe;
pub mod subscriptions;
