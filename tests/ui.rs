#[path = "ui/app_component.rs"]
mod app_component;

#[path = "ui/layout.rs"]
mod layout;
