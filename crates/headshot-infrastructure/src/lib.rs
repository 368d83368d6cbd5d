pub mod config_service;
pub mod fallback_repository;
pub mod file_local_store;
pub mod firebase_auth;
pub mod firestore;
pub mod logging;
pub mod paths;
pub mod secret_service;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::fallback_repository::{FallbackArticleRepository, FallbackSubscriberRepository};
pub use crate::file_local_store::FileLocalStore;
pub use crate::firebase_auth::FirebaseAuthProvider;
pub use crate::firestore::{FirestoreArticleRepository, FirestoreClient, FirestoreSubscriberRepository};
pub use crate::paths::{HeadshotPaths, ServiceType};
pub use crate::secret_service::SecretServiceImpl;
