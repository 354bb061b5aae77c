//! Notekeeper Backend Library
//!
//! Notes, todo lists and labels for authenticated users, served over a JSON
//! and multipart HTTP API.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod media;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
