//! motoapi - REST backend for a motorcycle news site
//!
//! This library provides articles, tags, photo uploads with server-side
//! resizing, and token-authenticated user accounts.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
