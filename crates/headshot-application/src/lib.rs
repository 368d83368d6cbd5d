//! Application layer for Headshot Studio.
//!
//! Use cases that coordinate the domain types in `headshot-core` with the
//! stores and clients built in the composition root.

pub mod auth_service;
pub mod blog_service;
pub mod context;
pub mod credit_service;
pub mod session;
pub mod studio_usecase;

pub use auth_service::AuthService;
pub use blog_service::BlogService;
pub use context::{AppContext, BootstrapOptions, bootstrap_at};
pub use credit_service::CreditService;
pub use studio_usecase::StudioUseCase;
