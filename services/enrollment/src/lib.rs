pub mod catalog;
pub mod config;
pub mod discount;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod notifications;
pub mod routes;
pub mod services;
pub mod validation;
