//! Core functionality for vault access, documents, watching, and configuration

pub mod config;
pub mod document;
pub mod file_system;
pub mod watcher;
