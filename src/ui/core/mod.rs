//! Core UI functionality for the Accountdesk application.
//!
//! This module contains the building blocks every screen relies on: the
//! action vocabulary, the component trait, terminal event polling, and the
//! background task manager that runs API requests off the render loop.
//!
//! - [`actions`] - Action definitions and UI state transitions
//! - [`component`] - Base component trait and rendering abstractions
//! - [`event_handler`] - Keyboard, paste and resize polling
//! - [`task_manager`] - Background request management
//!
//! Components turn input into [`Action`]s. Actions flow through the component
//! hierarchy first and end up at the app level, which may spawn requests whose
//! results come back as new actions on the next tick.

pub mod actions;
pub mod component;
pub mod event_handler;
pub mod task_manager;

pub use actions::{Action, DialogType};
pub use component::Component;
pub use event_handler::{EventHandler, EventType};
pub use task_manager::{TaskId, TaskManager};
