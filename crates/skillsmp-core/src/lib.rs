//! Core library for the SkillsMP command-line tools.
//!
//! This crate provides:
//! - An authenticated client for the SkillsMP marketplace API
//! - Credential resolution across CLI, environment and local key files
//! - Scanning of the local skills registry
//! - The update-check workflow with its on-disk freshness cache
//! - Installation of packaged skills into the registry

pub mod api;
pub mod credentials;
pub mod diff;
pub mod error;
pub mod install;
pub mod models;
pub mod paths;
pub mod registry;
pub mod updates;

pub use error::{ApiErrorCode, ErrorCategory, Result, SkillsmpError};
pub use models::*;
