//! Live studio sessions.

mod cache;
mod studio;

pub use cache::SessionCache;
pub use studio::{StudioSession, StudioSnapshot};
