//! HTTP surface for the followup reminder service.
//!
//! Exposes the `/api/v1/connections` CRUD surface (JWT-authenticated), the
//! secured `/api/v1/cron/reminders` dispatch trigger, and `/health`.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod linkedin;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
