// Shared page chrome and HTML escaping

/// Escape text for HTML element and attribute content
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap page content in the site layout; `title` is escaped, `body` is not
pub fn page(title: &str, description: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="ru">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<meta name="description" content="{description}">
<link rel="icon" href="/favicon.ico">
<link rel="stylesheet" href="/styles.css">
</head>
<body>
<header>
<nav>
<a href="/">Главная</a>
<a href="/group-tours">Групповые экскурсии</a>
<a href="/blog">Блог</a>
<a href="/contacts">Контакты</a>
</nav>
</header>
<main>
{body}
</main>
<footer>
<p>Анастасия Шимук, гид по Буэнос-Айресу</p>
</footer>
</body>
</html>
"#,
        title = escape(title),
        description = escape(description),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#39;y&#39;&lt;/script&gt;"
        );
        assert_eq!(escape("Реколета"), "Реколета");
    }

    #[test]
    fn test_page_escapes_title_only() {
        let html = page("A & B", "desc", "<p>body</p>");
        assert!(html.contains("<title>A &amp; B</title>"));
        assert!(html.contains("<p>body</p>"));
    }
}
