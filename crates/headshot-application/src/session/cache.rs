use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory cache of live sessions keyed by session id.
///
/// Entries are shared handles; callers lock the inner value themselves.
pub struct SessionCache<T> {
    sessions: Arc<RwLock<HashMap<String, Arc<T>>>>,
}

impl<T> SessionCache<T> {
    /// Creates a new empty SessionCache.
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Gets a cached session by id.
    ///
    /// # Returns
    ///
    /// `Some(session)` if the session is cached, `None` otherwise.
    pub async fn get(&self, session_id: &str) -> Option<Arc<T>> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).cloned()
    }

    /// Inserts a session, replacing any previous entry with the same id.
    pub async fn insert(&self, session_id: String, session: Arc<T>) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id, session);
    }

    /// Removes a session, returning it if it was cached.
    pub async fn remove(&self, session_id: &str) -> Option<Arc<T>> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id)
    }

    /// Clears all cached sessions.
    pub async fn clear(&self) {
        let mut sessions = self.sessions.write().await;
        sessions.clear();
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl<T> Default for SessionCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_get_remove() {
        let cache = SessionCache::new();
        cache.insert("s1".to_string(), Arc::new(1u32)).await;
        cache.insert("s2".to_string(), Arc::new(2u32)).await;

        assert_eq!(cache.get("s1").await.as_deref(), Some(&1));
        assert_eq!(cache.len().await, 2);

        assert!(cache.remove("s1").await.is_some());
        assert!(cache.get("s1").await.is_none());
        assert!(cache.remove("s1").await.is_none());

        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
