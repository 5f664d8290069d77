// apps/storefront_api/src/services/mod.rs

//! Collaborators the HTTP layer needs beyond the storefront domain: accounts
//! and tokens, and the notification queue.

pub mod auth_service;
pub mod notifications;
