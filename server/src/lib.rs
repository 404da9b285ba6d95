//! Event coordination backend: organizers publish capacity-bounded events,
//! participants join them, and a role/lifecycle policy decides who sees and
//! changes what.

pub mod config;
pub mod domain;
pub mod handlers;
pub mod repository;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
