//! Blog repositories that degrade to local data instead of failing.
//!
//! The first backend error flips `backend_available` off for the lifetime of
//! the repository; from then on every call is served from the in-memory
//! dataset, which starts as the built-in mock articles. Errors are logged,
//! never returned.

use async_trait::async_trait;
use headshot_core::Result;
use headshot_core::article::{
    Article, ArticleCategory, ArticleRepository, Subscriber, SubscriberRepository,
    mock_articles, sort_newest_first,
};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// Shared circuit-breaker state.
struct Backend<B: ?Sized> {
    inner: Option<Arc<B>>,
    available: AtomicBool,
    name: &'static str,
}

impl<B: ?Sized> Backend<B> {
    fn new(inner: Option<Arc<B>>, name: &'static str) -> Self {
        let available = inner.is_some();
        Self {
            inner,
            available: AtomicBool::new(available),
            name,
        }
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Runs `op` against the backend unless the breaker is open. `None`
    /// means the caller should use local data.
    async fn call<'a, T, F, Fut>(&'a self, op: F) -> Option<T>
    where
        F: FnOnce(&'a B) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !self.is_available() {
            return None;
        }
        let inner = self.inner.as_deref()?;

        match op(inner).await {
            Ok(value) => Some(value),
            Err(e) => {
                if self.available.swap(false, Ordering::SeqCst) {
                    tracing::warn!(
                        "{} backend unavailable, serving local data from now on: {}",
                        self.name,
                        e
                    );
                }
                None
            }
        }
    }
}

pub struct FallbackArticleRepository {
    backend: Backend<dyn ArticleRepository>,
    local: RwLock<Vec<Article>>,
}

impl FallbackArticleRepository {
    pub fn new(backend: Arc<dyn ArticleRepository>) -> Self {
        Self::build(Some(backend))
    }

    /// A repository that never leaves degraded mode.
    pub fn offline() -> Self {
        Self::build(None)
    }

    fn build(backend: Option<Arc<dyn ArticleRepository>>) -> Self {
        let mut local = mock_articles();
        sort_newest_first(&mut local);
        Self {
            backend: Backend::new(backend, "Article"),
            local: RwLock::new(local),
        }
    }

    pub fn is_degraded(&self) -> bool {
        !self.backend.is_available()
    }

    async fn list_local(&self, category: Option<ArticleCategory>) -> Vec<Article> {
        self.local
            .read()
            .await
            .iter()
            .filter(|article| category.is_none_or(|c| article.category == c))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ArticleRepository for FallbackArticleRepository {
    async fn list(&self, category: Option<ArticleCategory>) -> Result<Vec<Article>> {
        // An empty store is treated the same as an unreachable one.
        if let Some(articles) = self.backend.call(|b| b.list(None)).await {
            if !articles.is_empty() {
                return Ok(articles
                    .into_iter()
                    .filter(|article| category.is_none_or(|c| article.category == c))
                    .collect());
            }
        }
        Ok(self.list_local(category).await)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Article>> {
        if let Some(Some(article)) = self.backend.call(|b| b.find_by_id(id)).await {
            return Ok(Some(article));
        }
        Ok(self.local.read().await.iter().find(|a| a.id == id).cloned())
    }

    async fn save(&self, article: &Article) -> Result<()> {
        if self.backend.call(|b| b.save(article)).await.is_some() {
            return Ok(());
        }

        let mut local = self.local.write().await;
        local.retain(|a| a.id != article.id);
        local.push(article.clone());
        sort_newest_first(&mut local);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        if self.backend.call(|b| b.delete(id)).await.is_some() {
            return Ok(());
        }
        self.local.write().await.retain(|a| a.id != id);
        Ok(())
    }
}

pub struct FallbackSubscriberRepository {
    backend: Backend<dyn SubscriberRepository>,
    local: RwLock<Vec<Subscriber>>,
}

impl FallbackSubscriberRepository {
    pub fn new(backend: Arc<dyn SubscriberRepository>) -> Self {
        Self {
            backend: Backend::new(Some(backend), "Subscriber"),
            local: RwLock::new(Vec::new()),
        }
    }

    pub fn offline() -> Self {
        Self {
            backend: Backend::new(None, "Subscriber"),
            local: RwLock::new(Vec::new()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        !self.backend.is_available()
    }
}

#[async_trait]
impl SubscriberRepository for FallbackSubscriberRepository {
    async fn add(&self, subscriber: &Subscriber) -> Result<bool> {
        if let Some(created) = self.backend.call(|b| b.add(subscriber)).await {
            return Ok(created);
        }

        let mut local = self.local.write().await;
        if local.iter().any(|s| s.email == subscriber.email) {
            return Ok(false);
        }
        local.push(subscriber.clone());
        Ok(true)
    }

    async fn list(&self) -> Result<Vec<Subscriber>> {
        if let Some(subscribers) = self.backend.call(|b| b.list()).await {
            return Ok(subscribers);
        }
        Ok(self.local.read().await.clone())
    }
}
