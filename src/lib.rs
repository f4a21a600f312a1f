//! Accountdesk - a terminal client for account onboarding and credential administration
//!
//! This library provides self-service registration with email verification,
//! management of API access tokens and editing of upstream provider endpoints
//! against an account backend over HTTP, with a Ratatui interface on top.
//!
//! # Modules
//!
//! * [`api`] - HTTP client and wire types for the account backend
//! * [`config`] - Application configuration management
//! * [`registration`] - Code entry widget and registration flow
//! * [`endpoints`] - Provider endpoint form handling
//! * [`tokens`] - Management token drafts
//! * [`ui`] - Terminal user interface components

/// HTTP client and wire types for the account backend
pub mod api;

/// Configuration module for managing application settings
pub mod config;

/// Application constants and default values
pub mod constants;

/// Provider endpoint form parsing and validation
pub mod endpoints;

/// Logging setup and the in-memory log buffer
pub mod logger;

/// Registration flow: code entry, cooldown and orchestration
pub mod registration;

/// Management token drafts
pub mod tokens;

/// Terminal user interface components and rendering
pub mod ui;
