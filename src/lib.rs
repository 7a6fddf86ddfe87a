pub mod app;
pub mod auth;
pub mod cart;
pub mod config;
pub mod db;
pub mod error;
pub mod favorites;
pub mod foods;
pub mod health;
pub mod retry;
pub mod reviews;
pub mod seed;
pub mod state;
pub mod telemetry;
