use regex::Regex;
use std::sync::OnceLock;

const WORDS_PER_MINUTE: usize = 200;

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").expect("static regex is valid"))
}

/// Plain text of an HTML fragment.
pub fn strip_html(html: &str) -> String {
    tag_pattern().replace_all(html, " ").into_owned()
}

/// "N min read" label for an HTML body, at least one minute.
pub fn estimate_read_time(html: &str) -> String {
    let words = strip_html(html).split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    format!("{minutes} min read")
}

/// URL-safe id derived from a title.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
