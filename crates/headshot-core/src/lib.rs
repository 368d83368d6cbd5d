//! Domain layer for Headshot Studio.
//!
//! Holds the state models (usage quota, bonus credits, edit history, chat log),
//! the traits the outer layers implement (local store, image generator,
//! article/subscriber repositories, auth provider, secrets) and the retry
//! wrapper used around generation calls. Nothing in here performs I/O on its
//! own.

pub mod article;
pub mod auth;
pub mod chat;
pub mod config;
pub mod credit;
pub mod edit_history;
pub mod error;
pub mod generation;
pub mod identity;
pub mod image;
pub mod secret;
pub mod storage;
pub mod usage;

pub use error::{HeadshotError, Result};
pub use identity::Identity;
