// Blog posts bundled as Markdown files with YAML front matter

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use pulldown_cmark::{html, Options, Parser};
use serde::Deserialize;

use super::{BlogSource, SourceError};
use crate::logger;
use crate::models::BlogPost;

#[derive(Debug, Default, Deserialize)]
struct FrontMatter {
    /// Falls back to the slug
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    date: Option<String>,
    /// Minutes; either a number or text such as `5 мин`
    #[serde(default)]
    reading_time: Option<serde_yaml::Value>,
}

/// Directory of `<slug>.md` files
#[derive(Debug, Clone)]
pub struct MarkdownPosts {
    dir: PathBuf,
}

impl MarkdownPosts {
    pub fn new(dir: &str) -> Self {
        Self {
            dir: PathBuf::from(dir),
        }
    }

    async fn load(&self, path: &Path, slug: &str) -> Result<BlogPost, SourceError> {
        let display = path.display().to_string();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SourceError::Io {
                path: display.clone(),
                source,
            })?;
        parse_post(slug, &raw).map_err(|source| SourceError::FrontMatter {
            path: display,
            source,
        })
    }
}

#[async_trait]
impl BlogSource for MarkdownPosts {
    async fn posts(&self) -> Result<Vec<BlogPost>, SourceError> {
        let io_error = |source| SourceError::Io {
            path: self.dir.display().to_string(),
            source,
        };
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(io_error)?;

        let mut posts = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            let Some(slug) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match self.load(&path, slug).await {
                Ok(post) => posts.push(post),
                Err(e) => logger::log_warning(&format!("Skipping blog post: {e}")),
            }
        }

        // newest first, undated posts last
        posts.sort_by(|a, b| post_date(b).cmp(&post_date(a)));
        Ok(posts)
    }

    async fn post(&self, slug: &str) -> Result<Option<BlogPost>, SourceError> {
        if !is_safe_slug(slug) {
            return Ok(None);
        }
        let path = self.dir.join(format!("{slug}.md"));
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }
        self.load(&path, slug).await.map(Some)
    }
}

/// Render Markdown to HTML
pub fn render_markdown(md_content: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);

    let parser = Parser::new_ext(md_content, options);
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    html_output
}

fn parse_post(slug: &str, raw: &str) -> Result<BlogPost, serde_yaml::Error> {
    let (yaml, body) = split_front_matter(raw);
    let meta: FrontMatter = if yaml.trim().is_empty() {
        FrontMatter::default()
    } else {
        serde_yaml::from_str(yaml)?
    };

    Ok(BlogPost {
        slug: slug.to_string(),
        title: meta.title.unwrap_or_else(|| slug.to_string()),
        description: meta.description,
        content: render_markdown(body),
        reading_time_minutes: meta.reading_time.as_ref().and_then(minutes),
        created_at: meta.date,
    })
}

/// Split `---\n<yaml>\n---\n<body>`; files without front matter yield an empty header
fn split_front_matter(raw: &str) -> (&str, &str) {
    let raw = raw.trim_start_matches('\u{feff}');
    let Some(rest) = raw
        .strip_prefix("---\n")
        .or_else(|| raw.strip_prefix("---\r\n"))
    else {
        return ("", raw);
    };
    if let Some(body) = closing_line(rest) {
        return ("", body);
    }
    match rest.find("\n---") {
        Some(end) => {
            let yaml = &rest[..end];
            let after = &rest[end + 4..];
            let body = after
                .find('\n')
                .map_or("", |newline| &after[newline + 1..]);
            (yaml, body)
        }
        None => ("", raw),
    }
}

/// Body following a `---` line at the very start of `text`
fn closing_line(text: &str) -> Option<&str> {
    let after = text.strip_prefix("---")?;
    match after.find('\n') {
        Some(newline) if after[..newline].trim().is_empty() => Some(&after[newline + 1..]),
        None if after.trim().is_empty() => Some(""),
        _ => None,
    }
}

fn minutes(value: &serde_yaml::Value) -> Option<i64> {
    match value {
        serde_yaml::Value::Number(n) => n.as_i64(),
        serde_yaml::Value::String(s) => {
            let digits: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

fn post_date(post: &BlogPost) -> Option<NaiveDate> {
    let raw = post.created_at.as_deref()?;
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn is_safe_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATE: &str = "---\ntitle: Как пить мате\ndescription: Гид\ndate: 2024-05-01\nreading_time: 5\n---\n# Мате\n\nТекст.\n";
    const TANGO: &str = "---\ntitle: Танго\ndate: 2024-06-12\nreading_time: \"7 мин\"\n---\nТанго *везде*.\n";
    const NOTES: &str = "---\ntitle: Заметки\n---\nБез даты.\n";

    fn write_posts() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mate.md"), MATE).unwrap();
        std::fs::write(dir.path().join("tango.md"), TANGO).unwrap();
        std::fs::write(dir.path().join("notes.md"), NOTES).unwrap();
        std::fs::write(dir.path().join("cover.jpg"), b"\xff\xd8").unwrap();
        dir
    }

    #[test]
    fn test_front_matter_fields() {
        let post = parse_post("mate", MATE).unwrap();
        assert_eq!(post.title, "Как пить мате");
        assert_eq!(post.description.as_deref(), Some("Гид"));
        assert_eq!(post.created_at.as_deref(), Some("2024-05-01"));
        assert_eq!(post.reading_time_minutes, Some(5));
        assert!(post.content.contains("<h1>Мате</h1>"));
    }

    #[test]
    fn test_reading_time_from_text() {
        let post = parse_post("tango", TANGO).unwrap();
        assert_eq!(post.reading_time_minutes, Some(7));
        assert!(post.content.contains("<em>везде</em>"));
    }

    #[tokio::test]
    async fn test_posts_sorted_newest_first() {
        let dir = write_posts();
        let source = MarkdownPosts::new(dir.path().to_str().unwrap());

        let slugs: Vec<String> = source
            .posts()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.slug)
            .collect();
        assert_eq!(slugs, vec!["tango", "mate", "notes"]);
    }

    #[test]
    fn test_empty_front_matter_is_not_body() {
        let post = parse_post("draft", "---\n---\nЧерновик.\n").unwrap();
        assert_eq!(post.title, "draft");
        assert_eq!(post.content, "<p>Черновик.</p>\n");
    }

    #[tokio::test]
    async fn test_untitled_and_broken_posts_keep_the_listing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mate.md"), MATE).unwrap();
        std::fs::write(dir.path().join("draft.md"), "Просто текст без заголовка.\n").unwrap();
        std::fs::write(dir.path().join("broken.md"), "---\ntitle: [unclosed\n---\nТекст\n").unwrap();
        let source = MarkdownPosts::new(dir.path().to_str().unwrap());

        let posts = source.posts().await.unwrap();
        let titles: Vec<&str> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Как пить мате", "draft"]);
        assert!(posts[1].content.contains("Просто текст"));
    }

    #[tokio::test]
    async fn test_post_lookup() {
        let dir = write_posts();
        let source = MarkdownPosts::new(dir.path().to_str().unwrap());

        assert_eq!(source.post("mate").await.unwrap().unwrap().title, "Как пить мате");
        assert!(source.post("missing").await.unwrap().is_none());
        assert!(source.post("../secret").await.unwrap().is_none());
    }
}
