use super::friendly;
use anyhow::Result;
use headshot_application::AppContext;
use headshot_core::article::{ArticleCategory, strip_html};

pub async fn list(ctx: &AppContext, category: Option<ArticleCategory>) -> Result<()> {
    let articles = ctx.blog.list_articles(category).await.map_err(friendly)?;
    if articles.is_empty() {
        println!("No articles yet.");
        return Ok(());
    }

    for article in articles {
        println!(
            "{}  [{}]  {}  ({})",
            article.date, article.category, article.title, article.read_time
        );
        println!("    {}", article.excerpt);
        println!("    id: {}", article.id);
    }
    Ok(())
}

pub async fn show(ctx: &AppContext, id: &str) -> Result<()> {
    let article = ctx.blog.get_article(id).await.map_err(friendly)?;
    println!("{}", article.title);
    println!("{} | {} | {}", article.author, article.date, article.read_time);
    if !article.tags.is_empty() {
        println!("Tags: {}", article.tags.join(", "));
    }
    println!();
    println!("{}", strip_html(&article.content));
    Ok(())
}

pub async fn subscribe(ctx: &AppContext, email: &str) -> Result<()> {
    if ctx.blog.subscribe(email).await.map_err(friendly)? {
        println!("Subscribed. Watch your inbox for tips and job posts.");
    } else {
        println!("That address is already subscribed.");
    }
    Ok(())
}
