pub mod admin_store;
pub mod cache;
pub mod catalog;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod migrations;
pub mod models;
pub mod payment;
pub mod repositories;
pub mod routes;
pub mod search;
pub mod session;
pub mod version;
