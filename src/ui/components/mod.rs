//! Reusable UI components

pub mod common;

// Screens and dialogs
pub mod endpoint_dialog;
pub mod logs_dialog;
pub mod message_dialog;
pub mod registration_dialog;
pub mod status_bar;
pub mod token_creation_dialog;
pub mod token_list;

// Component exports
pub use endpoint_dialog::EndpointDialog;
pub use logs_dialog::LogsDialog;
pub use message_dialog::{Message, MessageDialog};
pub use registration_dialog::RegistrationDialog;
pub use status_bar::StatusBar;
pub use token_creation_dialog::TokenCreationDialog;
pub use token_list::TokenListComponent;
