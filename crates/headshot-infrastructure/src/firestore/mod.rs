//! Firestore-backed document store.
//!
//! - `client`: REST calls against `projects/{id}/databases/(default)/documents`
//! - `value`: the typed-value field encoding
//! - `repository`: article and subscriber repositories over the client

mod client;
mod repository;
mod value;

pub use client::{DEFAULT_BASE_URL, Document, FirestoreClient};
pub use repository::{
    ARTICLES_COLLECTION, FirestoreArticleRepository, FirestoreSubscriberRepository,
    SUBSCRIBERS_COLLECTION,
};
pub use value::Fields;
