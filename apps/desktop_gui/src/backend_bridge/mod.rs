//! Worker side of the app: commands from the UI and the thread that runs them.

pub mod commands;
pub mod runtime;
