//! API endpoint handlers, grouped by resource.

pub mod auth;
pub mod health;
pub mod reports;
pub mod wells;
