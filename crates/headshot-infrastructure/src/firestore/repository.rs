//! Blog repositories backed by Firestore collections.

use super::client::{Document, FirestoreClient};
use super::value::Fields;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use headshot_core::article::{
    Article, ArticleCategory, ArticleRepository, Subscriber, SubscriberRepository,
    estimate_read_time, sort_newest_first,
};
use headshot_core::{HeadshotError, Result};
use std::str::FromStr;
use std::sync::Arc;

pub const ARTICLES_COLLECTION: &str = "articles";
pub const SUBSCRIBERS_COLLECTION: &str = "subscribers";

pub struct FirestoreArticleRepository {
    client: Arc<FirestoreClient>,
}

impl FirestoreArticleRepository {
    pub fn new(client: Arc<FirestoreClient>) -> Self {
        Self { client }
    }
}

pub(crate) fn article_to_fields(article: &Article) -> Fields {
    Fields::new()
        .string("title", &article.title)
        .string("excerpt", &article.excerpt)
        .string("content", &article.content)
        .string("category", article.category.to_string())
        .string("author", &article.author)
        .string("date", article.date.format("%Y-%m-%d").to_string())
        .string("imageUrl", &article.image_url)
        .string("readTime", &article.read_time)
        .strings("tags", article.tags.iter().cloned())
}

pub(crate) fn article_from_document(doc: &Document) -> Result<Article> {
    let fields = doc.fields();

    let category = fields.require_string("category")?;
    let category = ArticleCategory::from_str(&category).map_err(|_| {
        HeadshotError::data_access(format!("Unknown article category '{}'", category))
    })?;

    // Older documents store the publish date as a timestamp.
    let date = match fields.get_string("date") {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|e| HeadshotError::data_access(format!("Invalid article date: {}", e)))?,
        None => fields
            .get_timestamp("date")
            .map(|ts| ts.date_naive())
            .ok_or_else(|| HeadshotError::data_access("Document is missing field 'date'"))?,
    };

    Ok(Article {
        id: doc.id().to_string(),
        title: fields.require_string("title")?,
        excerpt: fields.get_string("excerpt").unwrap_or_default().to_string(),
        content: fields.require_string("content")?,
        category,
        author: fields.get_string("author").unwrap_or_default().to_string(),
        date,
        image_url: fields.get_string("imageUrl").unwrap_or_default().to_string(),
        read_time: fields
            .get_string("readTime")
            .map(str::to_string)
            .unwrap_or_else(|| estimate_read_time(fields.get_string("content").unwrap_or_default())),
        tags: fields.get_strings("tags"),
    })
}

#[async_trait]
impl ArticleRepository for FirestoreArticleRepository {
    async fn list(&self, category: Option<ArticleCategory>) -> Result<Vec<Article>> {
        let documents = self.client.list_documents(ARTICLES_COLLECTION).await?;

        let mut articles: Vec<Article> = documents
            .iter()
            .filter_map(|doc| match article_from_document(doc) {
                Ok(article) => Some(article),
                Err(e) => {
                    tracing::warn!("Skipping malformed article {}: {}", doc.id(), e);
                    None
                }
            })
            .filter(|article| category.is_none_or(|c| article.category == c))
            .collect();

        sort_newest_first(&mut articles);
        Ok(articles)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Article>> {
        match self.client.get_document(ARTICLES_COLLECTION, id).await? {
            Some(doc) => article_from_document(&doc).map(Some),
            None => Ok(None),
        }
    }

    async fn save(&self, article: &Article) -> Result<()> {
        self.client
            .upsert_document(ARTICLES_COLLECTION, &article.id, article_to_fields(article))
            .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.client.delete_document(ARTICLES_COLLECTION, id).await
    }
}

pub struct FirestoreSubscriberRepository {
    client: Arc<FirestoreClient>,
}

impl FirestoreSubscriberRepository {
    pub fn new(client: Arc<FirestoreClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SubscriberRepository for FirestoreSubscriberRepository {
    async fn add(&self, subscriber: &Subscriber) -> Result<bool> {
        let fields = Fields::new()
            .string("email", &subscriber.email)
            .timestamp("subscribedAt", subscriber.subscribed_at);
        self.client
            .create_document(SUBSCRIBERS_COLLECTION, &subscriber.email, fields)
            .await
    }

    async fn list(&self) -> Result<Vec<Subscriber>> {
        let documents = self.client.list_documents(SUBSCRIBERS_COLLECTION).await?;
        Ok(documents
            .iter()
            .map(|doc| {
                let fields = doc.fields();
                Subscriber {
                    email: fields
                        .get_string("email")
                        .unwrap_or_else(|| doc.id())
                        .to_string(),
                    subscribed_at: fields.get_timestamp("subscribedAt").unwrap_or_else(Utc::now),
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use headshot_core::article::mock_articles;
    use serde_json::json;

    fn document(id: &str, fields: Fields) -> Document {
        Document {
            name: format!("projects/p/databases/(default)/documents/articles/{id}"),
            fields: fields.into_map(),
        }
    }

    #[test]
    fn test_article_fields_read_back() {
        let article = mock_articles().remove(0);
        let doc = document(&article.id, article_to_fields(&article));
        assert_eq!(article_from_document(&doc).unwrap(), article);
    }

    #[test]
    fn test_timestamp_date_and_missing_read_time() {
        let doc = Document {
            name: "projects/p/databases/(default)/documents/articles/x".into(),
            fields: json!({
                "title": { "stringValue": "T" },
                "content": { "stringValue": "<p>short</p>" },
                "category": { "stringValue": "news" },
                "date": { "timestampValue": "2025-06-01T08:00:00Z" }
            })
            .as_object()
            .unwrap()
            .clone(),
        };

        let article = article_from_document(&doc).unwrap();
        assert_eq!(article.id, "x");
        assert_eq!(article.date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(article.read_time, "1 min read");
        assert!(article.tags.is_empty());
    }

    #[test]
    fn test_unknown_category_is_error() {
        let doc = document(
            "x",
            Fields::new()
                .string("title", "T")
                .string("content", "c")
                .string("category", "gossip")
                .string("date", "2025-01-01"),
        );
        assert!(article_from_document(&doc).is_err());
    }
}
