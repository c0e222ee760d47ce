//! # Civic Relay Telegram Bot
//!
//! A Telegram bot that walks citizens through a region → district →
//! neighborhood menu, collects text, photos, videos, voice messages and
//! locations, and forwards them to the officer responsible for the chosen
//! neighborhood.

pub mod bot;
pub mod config;
pub mod delivery;
pub mod errors;
pub mod event;
pub mod flow;
pub mod hierarchy;
pub mod localization;
pub mod session;
pub mod session_store;
