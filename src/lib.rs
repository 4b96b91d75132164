pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod jobs;
pub mod models;
pub mod pages;
pub mod routes;
pub mod schema;
pub mod site;
pub mod state;
