//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules for better organization:
//! - `message_handler`: Runs incoming messages through the intake flow
//! - `inbound`: Turns Telegram messages into flow events
//! - `transport`: Forwards accepted submissions to officials
//! - `ui_builder`: Creates keyboards and formats messages
//! - `commands`: Registers the bot command menu

pub mod commands;
pub mod inbound;
pub mod message_handler;
pub mod transport;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use commands::register_commands;
pub use message_handler::{message_handler, Controller};

// Re-export utility functions that might be used elsewhere
pub use transport::deliver;
pub use ui_builder::{create_menu_keyboard, format_delivery_header, render_reply};
