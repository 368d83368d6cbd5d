//! Blog / CMS domain.
//!
//! - `model`: `Article`, `NewArticle`, `ArticleCategory`, `Subscriber`
//! - `repository`: persistence traits
//! - `mock`: the built-in fallback dataset
//! - `read_time`: read-time labels and slugs

mod mock;
mod model;
mod read_time;
mod repository;

pub use mock::{mock_articles, sort_newest_first};
pub use model::{Article, ArticleCategory, NewArticle, Subscriber};
pub use read_time::{estimate_read_time, slugify, strip_html};
pub use repository::{ArticleRepository, SubscriberRepository};
