//! Blog use cases on top of the article and subscriber repositories.

use chrono::Utc;
use headshot_core::article::{
    Article, ArticleCategory, ArticleRepository, NewArticle, Subscriber, SubscriberRepository,
    estimate_read_time, slugify,
};
use headshot_core::auth::validate_email;
use headshot_core::{HeadshotError, Result};
use std::sync::Arc;

pub struct BlogService {
    articles: Arc<dyn ArticleRepository>,
    subscribers: Arc<dyn SubscriberRepository>,
}

impl BlogService {
    pub fn new(
        articles: Arc<dyn ArticleRepository>,
        subscribers: Arc<dyn SubscriberRepository>,
    ) -> Self {
        Self {
            articles,
            subscribers,
        }
    }

    pub async fn list_articles(&self, category: Option<ArticleCategory>) -> Result<Vec<Article>> {
        self.articles.list(category).await
    }

    pub async fn get_article(&self, id: &str) -> Result<Article> {
        self.articles
            .find_by_id(id)
            .await?
            .ok_or_else(|| HeadshotError::not_found("Article", id))
    }

    /// Publishes a new post. The id is a slug of the title, suffixed when
    /// already taken.
    pub async fn publish(&self, draft: NewArticle) -> Result<Article> {
        validate_draft(&draft)?;

        let base = slugify(&draft.title);
        let mut id = base.clone();
        let mut suffix = 2;
        while self.articles.find_by_id(&id).await?.is_some() {
            id = format!("{base}-{suffix}");
            suffix += 1;
        }

        let article = Article {
            id,
            read_time: estimate_read_time(&draft.content),
            date: Utc::now().date_naive(),
            title: draft.title,
            excerpt: draft.excerpt,
            content: draft.content,
            category: draft.category,
            author: draft.author,
            image_url: draft.image_url,
            tags: draft.tags,
        };
        self.articles.save(&article).await?;
        tracing::info!("[Blog] Published article {}", article.id);
        Ok(article)
    }

    /// Replaces an existing post's content. Id and publish date are kept.
    pub async fn update(&self, id: &str, draft: NewArticle) -> Result<Article> {
        validate_draft(&draft)?;
        let existing = self.get_article(id).await?;

        let article = Article {
            id: existing.id,
            date: existing.date,
            read_time: estimate_read_time(&draft.content),
            title: draft.title,
            excerpt: draft.excerpt,
            content: draft.content,
            category: draft.category,
            author: draft.author,
            image_url: draft.image_url,
            tags: draft.tags,
        };
        self.articles.save(&article).await?;
        Ok(article)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.articles.delete(id).await
    }

    /// Adds a newsletter subscriber. Returns `false` if already subscribed.
    pub async fn subscribe(&self, email: &str) -> Result<bool> {
        let email = validate_email(email)?;
        let created = self
            .subscribers
            .add(&Subscriber {
                email,
                subscribed_at: Utc::now(),
            })
            .await?;
        if created {
            tracing::info!("[Blog] New newsletter subscriber");
        }
        Ok(created)
    }

    pub async fn subscribers(&self) -> Result<Vec<Subscriber>> {
        self.subscribers.list().await
    }
}

fn validate_draft(draft: &NewArticle) -> Result<()> {
    if slugify(&draft.title).is_empty() {
        return Err(HeadshotError::validation("Article title must contain letters or digits"));
    }
    if draft.content.trim().is_empty() {
        return Err(HeadshotError::validation("Article content is empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use headshot_infrastructure::{FallbackArticleRepository, FallbackSubscriberRepository};

    fn service() -> BlogService {
        BlogService::new(
            Arc::new(FallbackArticleRepository::offline()),
            Arc::new(FallbackSubscriberRepository::offline()),
        )
    }

    fn draft(title: &str) -> NewArticle {
        NewArticle {
            title: title.into(),
            excerpt: "Short".into(),
            content: format!("<p>{}</p>", "word ".repeat(250)),
            category: ArticleCategory::News,
            author: "Editor".into(),
            image_url: String::new(),
            tags: vec!["launch".into()],
        }
    }

    #[tokio::test]
    async fn test_publish_derives_id_and_read_time() {
        let blog = service();

        let first = blog.publish(draft("We're Live!")).await.unwrap();
        assert_eq!(first.id, "we-re-live");
        assert_eq!(first.read_time, "2 min read");

        let second = blog.publish(draft("We're live")).await.unwrap();
        assert_eq!(second.id, "we-re-live-2");

        let news = blog.list_articles(Some(ArticleCategory::News)).await.unwrap();
        assert!(news.iter().any(|a| a.id == "we-re-live-2"));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let blog = service();
        let published = blog.publish(draft("Update me")).await.unwrap();

        let mut changed = draft("Update me, again");
        changed.content = "<p>tiny</p>".into();
        let updated = blog.update(&published.id, changed).await.unwrap();
        assert_eq!(updated.id, published.id);
        assert_eq!(updated.read_time, "1 min read");
        assert_eq!(blog.get_article(&published.id).await.unwrap().title, "Update me, again");

        blog.delete(&published.id).await.unwrap();
        assert!(blog.get_article(&published.id).await.unwrap_err().is_not_found());
        assert!(blog.update(&published.id, draft("x")).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_invalid_drafts() {
        let blog = service();
        assert!(blog.publish(draft("!!!")).await.unwrap_err().is_validation());

        let mut empty = draft("Empty");
        empty.content = "   ".into();
        assert!(blog.publish(empty).await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_subscribe_is_idempotent() {
        let blog = service();
        assert!(blog.subscribe(" Reader@Example.com ").await.unwrap());
        assert!(!blog.subscribe("reader@example.com").await.unwrap());
        assert!(blog.subscribe("not an email").await.unwrap_err().is_validation());

        let subscribers = blog.subscribers().await.unwrap();
        assert_eq!(subscribers.len(), 1);
        assert_eq!(subscribers[0].email, "reader@example.com");
    }
}
