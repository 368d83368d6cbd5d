use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ArticleCategory {
    Tip,
    Job,
    News,
}

/// A blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    /// Rendered HTML body.
    pub content: String,
    pub category: ArticleCategory,
    pub author: String,
    pub date: NaiveDate,
    pub image_url: String,
    /// Display label such as "5 min read".
    pub read_time: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Fields supplied when publishing a post; id and read time are derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArticle {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub category: ArticleCategory,
    pub author: String,
    pub image_url: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Newsletter subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub email: String,
    pub subscribed_at: DateTime<Utc>,
}
