// Clinic Client - Library root

pub mod auth;
pub mod calendar;
pub mod config;
pub mod error;
pub mod http_client;
pub mod models;
pub mod services;
