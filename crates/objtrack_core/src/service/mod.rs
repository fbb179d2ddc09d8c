//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into lifecycle, closure and reporting APIs.
//! - Keep presentation collaborators decoupled from storage details.

pub mod closure_service;
pub mod objective_service;
pub mod report_service;
