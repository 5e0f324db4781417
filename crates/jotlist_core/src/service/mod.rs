//! Core use-case services.
//!
//! # Responsibility
//! - Combine repository calls into the units of work the list dispatches.
//! - Keep the list layer free of SQL and connection handling.

pub mod note_service;
