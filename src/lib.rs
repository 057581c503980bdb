//! spendlog - A small self-hosted expense tracker
//!
//! This library provides the core functionality for spendlog: login
//! sessions, expense records, spending statistics and the htmx-driven
//! web pages on top of them.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod views;
