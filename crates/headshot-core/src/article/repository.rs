//! Blog persistence traits.

use super::model::{Article, ArticleCategory, Subscriber};
use crate::error::Result;
use async_trait::async_trait;

/// An abstract repository for blog articles.
///
/// Decouples the blog from the concrete document store so a degraded,
/// in-memory dataset can stand in when the store is unreachable.
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Lists articles, newest first, optionally restricted to one category.
    async fn list(&self, category: Option<ArticleCategory>) -> Result<Vec<Article>>;

    /// Finds an article by id.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Article))`: Article found
    /// - `Ok(None)`: Article not found
    /// - `Err(_)`: Error occurred during retrieval
    async fn find_by_id(&self, id: &str) -> Result<Option<Article>>;

    /// Creates or replaces the article with `article.id`.
    async fn save(&self, article: &Article) -> Result<()>;

    /// Deletes an article. Deleting a missing id is not an error.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Newsletter subscribers.
#[async_trait]
pub trait SubscriberRepository: Send + Sync {
    /// Adds a subscriber. Returns `false` if the email was already present.
    async fn add(&self, subscriber: &Subscriber) -> Result<bool>;

    async fn list(&self) -> Result<Vec<Subscriber>>;
}
