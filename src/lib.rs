pub mod auth;
pub mod config;
pub mod domain;
pub mod forms;
pub mod health;
pub mod logging;
pub mod storage;
pub mod web;
