//! egui shell: the login and home views plus the overlays drawn over them.

pub mod app;
pub mod format;

pub use app::BlogDeskApp;
