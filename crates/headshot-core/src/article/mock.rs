//! Built-in articles served when the document store is unavailable.

use super::model::{Article, ArticleCategory};
use super::read_time::estimate_read_time;
use chrono::NaiveDate;

struct Seed {
    id: &'static str,
    title: &'static str,
    excerpt: &'static str,
    content: &'static str,
    category: ArticleCategory,
    author: &'static str,
    date: (i32, u32, u32),
    image_url: &'static str,
    tags: &'static [&'static str],
}

const SEEDS: &[Seed] = &[
    Seed {
        id: "linkedin-photo-tips",
        title: "7 Tips for a LinkedIn Profile Photo That Gets Noticed",
        excerpt: "Recruiters spend seconds on your profile. Make your photo count.",
        content: "<p>Your profile photo is the first thing a recruiter sees. Face the camera, \
                  keep the background simple and let your shoulders show.</p>\
                  <p>Wear what you would wear to an interview in your industry, and choose \
                  soft, even light over harsh overhead bulbs.</p>\
                  <p>Finally, smile with your eyes: a relaxed expression reads as confident \
                  and approachable.</p>",
        category: ArticleCategory::Tip,
        author: "Headshot Studio Team",
        date: (2025, 9, 2),
        image_url: "https://images.headshot.studio/blog/linkedin-tips.jpg",
        tags: &["linkedin", "photography", "career"],
    },
    Seed {
        id: "what-to-wear",
        title: "What to Wear for a Professional Headshot",
        excerpt: "Solid colors, good fit and a neckline that frames your face.",
        content: "<p>Solid, mid-tone colors photograph best. Avoid busy patterns and logos \
                  that pull attention from your face.</p>\
                  <p>Make sure the fit is right at the shoulders; that is most of what the \
                  frame shows.</p>",
        category: ArticleCategory::Tip,
        author: "Headshot Studio Team",
        date: (2025, 8, 18),
        image_url: "https://images.headshot.studio/blog/what-to-wear.jpg",
        tags: &["style", "wardrobe"],
    },
    Seed {
        id: "remote-hiring-2025",
        title: "Remote Hiring Is Here to Stay: How to Stand Out",
        excerpt: "When the first meeting is a video call, your online presence is your handshake.",
        content: "<p>More first-round interviews now happen over video. A consistent photo \
                  across your resume, LinkedIn and company chat builds recognition.</p>\
                  <p>Keep your profiles current and make sure they tell the same story.</p>",
        category: ArticleCategory::Job,
        author: "Career Desk",
        date: (2025, 7, 30),
        image_url: "https://images.headshot.studio/blog/remote-hiring.jpg",
        tags: &["jobs", "remote", "career"],
    },
    Seed {
        id: "ai-headshots-explained",
        title: "AI Headshots, Explained",
        excerpt: "How a single selfie becomes a studio-quality portrait.",
        content: "<p>Modern image models can restyle lighting, wardrobe and background while \
                  keeping your facial features intact.</p>\
                  <p>You can keep refining the result through chat: ask for a different \
                  backdrop or a warmer tone, and step back if you prefer an earlier version.</p>",
        category: ArticleCategory::News,
        author: "Headshot Studio Team",
        date: (2025, 9, 10),
        image_url: "https://images.headshot.studio/blog/ai-explained.jpg",
        tags: &["ai", "product"],
    },
];

/// The fixed fallback dataset, newest first.
pub fn mock_articles() -> Vec<Article> {
    let mut articles: Vec<Article> = SEEDS
        .iter()
        .map(|seed| Article {
            id: seed.id.to_string(),
            title: seed.title.to_string(),
            excerpt: seed.excerpt.to_string(),
            content: seed.content.to_string(),
            category: seed.category,
            author: seed.author.to_string(),
            date: NaiveDate::from_ymd_opt(seed.date.0, seed.date.1, seed.date.2)
                .unwrap_or_default(),
            image_url: seed.image_url.to_string(),
            read_time: estimate_read_time(seed.content),
            tags: seed.tags.iter().map(|t| t.to_string()).collect(),
        })
        .collect();
    sort_newest_first(&mut articles);
    articles
}

pub fn sort_newest_first(articles: &mut [Article]) {
    articles.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
}
