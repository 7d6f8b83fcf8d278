//! Terminal host for the composer
//!
//! Owns the attachment list, renders the composer with ratatui, and turns
//! every send into a stream exchange whose body is shown as it arrives.

mod app;
mod clipboard;
mod handlers;
mod host;
mod keys;
mod polling;
mod render;
mod selector;
mod state;
mod stream;
mod terminal;
mod theme;

pub use app::App;
