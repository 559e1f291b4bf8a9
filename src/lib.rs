//! Survey Text-Coding API Client
//!
//! This library provides a typed client for a remote survey text-analytics
//! coding service, plus the sequential workflow that demo binaries drive:
//! submit a batch of text rows as a coding job, poll its status until the
//! service reports a terminal state, and fetch the predicted codes.

pub mod config;
pub mod models;
pub mod services;
