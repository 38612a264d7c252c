//! Snare - headless control panel for an intercepting proxy
//!
//! Wires the application services to the HTTP backend and local storage,
//! and drives them from text commands.

pub mod app;
pub mod command;

pub use app::{ActiveView, App, Backend};
pub use command::{Command, CommandError, HELP, View};
