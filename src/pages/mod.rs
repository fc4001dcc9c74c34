//! Server-rendered pages
//!
//! Plain HTML assembled in code. Text from the database or the backend is
//! escaped; blog bodies are trusted HTML.

mod format;
mod layout;

pub use format::{format_date_ru, format_hours};
pub use layout::escape;

use chrono::NaiveDate;
use hyper::{StatusCode, Uri};

use crate::config::AppState;
use crate::http::{build_html_response, SiteResponse};
use crate::logger;
use crate::models::{BlogPost, ScheduledTour, TourDetail};
use layout::page;

const TOUR_NOT_FOUND: &str = "Тур не найден";
const POST_NOT_FOUND: &str = "Статья не найдена";
const PAGE_NOT_FOUND: &str = "Страница не найдена";

/// Render the page for a GET/HEAD request; `None` when no page matches
pub async fn render(uri: &Uri, state: &AppState, is_head: bool) -> Option<SiteResponse> {
    let path = uri.path();
    let segments: Vec<&str> = path
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    let (status, html) = match segments.as_slice() {
        [] => (StatusCode::OK, home_html()),
        ["tours" | "group-tours"] => (StatusCode::OK, schedule_html(&load_schedule(state).await)),
        ["group-tours", slug] => match query_param(uri, "date_id") {
            Some(date_id) => tour_page(state, slug, &date_id).await,
            None => tour_dates_page(state, slug).await,
        },
        ["group-tours", slug, date_id] => tour_page(state, slug, date_id).await,
        ["blog"] => (StatusCode::OK, blog_list_html(&load_posts(state).await)),
        ["blog", slug] => blog_post_page(state, slug).await,
        ["contacts"] => (StatusCode::OK, contacts_html()),
        ["login"] => (StatusCode::OK, login_html()),
        _ => return None,
    };

    Some(build_html_response(status, html, is_head))
}

/// 404 page for paths nothing else claimed
pub fn not_found(is_head: bool) -> SiteResponse {
    build_html_response(StatusCode::NOT_FOUND, not_found_html(PAGE_NOT_FOUND), is_head)
}

async fn load_schedule(state: &AppState) -> Vec<ScheduledTour> {
    state
        .tour_catalog()
        .scheduled_tours()
        .await
        .unwrap_or_else(|e| {
            logger::log_error(&format!("Failed to load tour schedule: {e}"));
            Vec::new()
        })
}

async fn load_posts(state: &AppState) -> Vec<BlogPost> {
    state.blog_source().posts().await.unwrap_or_else(|e| {
        logger::log_error(&format!("Error fetching blog posts: {e}"));
        Vec::new()
    })
}

async fn tour_dates_page(state: &AppState, slug: &str) -> (StatusCode, String) {
    let dates: Vec<ScheduledTour> = load_schedule(state)
        .await
        .into_iter()
        .filter(|t| t.slug == slug)
        .collect();
    if dates.is_empty() {
        return (StatusCode::NOT_FOUND, not_found_html(TOUR_NOT_FOUND));
    }
    (StatusCode::OK, tour_dates_html(&dates))
}

async fn tour_page(state: &AppState, slug: &str, date_id: &str) -> (StatusCode, String) {
    let Ok(date_id) = date_id.parse::<i64>() else {
        return (StatusCode::NOT_FOUND, not_found_html(TOUR_NOT_FOUND));
    };
    match state.tour_catalog().tour_for_date(slug, date_id).await {
        Ok(Some(tour)) => (StatusCode::OK, tour_html(&tour)),
        Ok(None) => (StatusCode::NOT_FOUND, not_found_html(TOUR_NOT_FOUND)),
        Err(e) => {
            logger::log_error(&format!("Failed to load tour {slug}/{date_id}: {e}"));
            (StatusCode::NOT_FOUND, not_found_html(TOUR_NOT_FOUND))
        }
    }
}

async fn blog_post_page(state: &AppState, slug: &str) -> (StatusCode, String) {
    match state.blog_source().post(slug).await {
        Ok(Some(post)) => (StatusCode::OK, blog_post_html(&post)),
        Ok(None) => (StatusCode::NOT_FOUND, not_found_html(POST_NOT_FOUND)),
        Err(e) => {
            logger::log_error(&format!("Error fetching blog post {slug}: {e}"));
            (StatusCode::NOT_FOUND, not_found_html(POST_NOT_FOUND))
        }
    }
}

fn query_param(uri: &Uri, name: &str) -> Option<String> {
    uri.query()?.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name && !value.is_empty()).then(|| value.to_string())
    })
}

pub fn home_html() -> String {
    page(
        "Анастасия Шимук - гид по Буэнос-Айресу",
        "Экскурсии по Буэнос-Айресу и Аргентине на русском языке",
        r#"<section>
<h1>Экскурсии по Буэнос-Айресу</h1>
<p>Пешеходные и автомобильные экскурсии, мастер-классы и поездки по Аргентине.</p>
<p><a href="/group-tours">Расписание групповых экскурсий</a></p>
<p><a href="/blog">Блог о жизни в Буэнос-Айресе</a></p>
<p><a href="/contacts">Связаться со мной</a></p>
</section>"#,
    )
}

/// Schedule listing: one link per tour date
pub fn schedule_html(tours: &[ScheduledTour]) -> String {
    let mut body = String::from("<h1>Расписание экскурсий</h1>\n");
    if tours.is_empty() {
        body.push_str("<p>Сейчас нет запланированных групповых экскурсий.</p>\n");
    } else {
        body.push_str(&schedule_list(tours));
    }
    body.push_str(SIGN_UP);
    page("Групповые экскурсии", "Групповые экскурсии по Буэнос Айресу", &body)
}

fn tour_dates_html(dates: &[ScheduledTour]) -> String {
    let name = dates.first().map_or("", |t| t.name.as_str());
    let body = format!(
        "<h1>{}</h1>\n<h2>Ближайшие даты</h2>\n{}{SIGN_UP}",
        escape(name),
        schedule_list(dates)
    );
    page(name, "Групповая экскурсия по Буэнос Айресу", &body)
}

fn schedule_list(tours: &[ScheduledTour]) -> String {
    let mut list = String::from("<ul class=\"schedule\">\n");
    for tour in tours {
        list.push_str(&format!(
            "<li><a href=\"/group-tours/{}/{}\">📅 {}, {} - {}</a></li>\n",
            escape(&tour.slug),
            tour.date_id,
            format_date_ru(tour.raw_date),
            escape(&tour.time),
            escape(&tour.name),
        ));
    }
    list.push_str("</ul>\n");
    list
}

const SIGN_UP: &str = r#"<p>👉 Запись в <a href="https://ig.me/m/anastasiaenargentina/" target="_blank" rel="noopener">Директ инстаграм</a> или через <a href="/contacts">форму обратной связи</a></p>
"#;

/// One tour on one date
pub fn tour_html(tour: &TourDetail) -> String {
    let mut facts = format!(
        "<p>⏱ Длительность: {}</p>\n",
        format_hours(tour.duration)
    );
    if let Some(capacity) = tour.max_capacity {
        facts.push_str(&format!("<p>👥 Максимум: {capacity} человек</p>\n"));
    }
    facts.push_str(&format!("<p>💸 Стоимость: {}</p>\n", escape(&tour.cost)));
    if !tour.additional_cost.is_empty() {
        facts.push_str(&format!(
            "<p>Доп. расходы: {}</p>\n",
            escape(&tour.additional_cost)
        ));
    }

    let mut about = format!("<p>{}</p>\n", escape(&tour.description));
    if !tour.additional_description.is_empty() {
        about.push_str(&format!(
            "<p class=\"secondary\">{}</p>\n",
            escape(&tour.additional_description)
        ));
    }

    let body = format!(
        "<article class=\"tour\">\n<h1>{name}</h1>\n<div class=\"facts\">\n{facts}</div>\n\
         <div class=\"meeting\">\n<p>📍 Где встречаемся:</p>\n<p>{meeting}</p>\n\
         <p>📅 Когда: {date}, {time}</p>\n</div>\n<hr>\n{about}</article>\n{SIGN_UP}",
        name = escape(&tour.name),
        meeting = escape(&tour.meeting_point),
        date = format_date_ru(tour.date),
        time = escape(&tour.time),
    );
    page(&tour.name, &tour.description, &body)
}

fn reading_time(post: &BlogPost) -> String {
    post.reading_time_minutes
        .map_or_else(|| "N/A".to_string(), |m| format!("{m} мин"))
}

fn post_date(post: &BlogPost) -> Option<String> {
    let raw = post.created_at.as_deref()?;
    let date = NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()?;
    Some(format!("{} {}", format_date_ru(date), date.format("%Y")))
}

pub fn blog_list_html(posts: &[BlogPost]) -> String {
    let mut body = String::from(
        "<p class=\"intro\">В блоге я делюсь своим опытом жизни в Буэнос Айресе и интересными \
         поездками, где я рассказываю много полезной информации для путешествий</p>\n",
    );
    if posts.is_empty() {
        body.push_str("<p>Пока нет статей.</p>\n");
    }
    for post in posts {
        body.push_str(&format!(
            "<article class=\"post-card\">\n<h2><a href=\"/blog/{}\">{}</a></h2>\n<p class=\"meta\">{}{}</p>\n",
            escape(&post.slug),
            escape(&post.title),
            reading_time(post),
            post_date(post).map(|d| format!(" · {d}")).unwrap_or_default(),
        ));
        if let Some(description) = &post.description {
            body.push_str(&format!("<p>{}</p>\n", escape(description)));
        }
        body.push_str("</article>\n");
    }
    page(
        "Блог Анастасии Шимук",
        "Анастасия Шимук - гид по Аргентине, гид по Буэнос Айресу",
        &body,
    )
}

pub fn blog_post_html(post: &BlogPost) -> String {
    let body = format!(
        "<article class=\"post\">\n<h1>{title}</h1>\n<p class=\"meta\">⏱ {time}</p>\n{content}\n</article>\n\
         <p><a href=\"/blog\">← Назад к блогу</a></p>\n",
        title = escape(&post.title),
        time = reading_time(post),
        content = post.content,
    );
    page(
        &format!("Блог Анастасии Шимук - {}", post.title),
        post.description.as_deref().unwrap_or(""),
        &body,
    )
}

pub fn contacts_html() -> String {
    page(
        "Контакты",
        "Связаться с гидом по Буэнос-Айресу",
        r#"<h1>Контакты</h1>
<form id="contact-form">
<label>Имя <input name="name" required></label>
<label>Email <input name="email" type="email" required></label>
<label>Телефон <input name="phone" type="tel"></label>
<label>Сообщение <textarea name="message" required></textarea></label>
<button type="submit">Отправить</button>
<p id="contact-status" role="status"></p>
</form>
<script>
document.getElementById("contact-form").addEventListener("submit", async (event) => {
  event.preventDefault();
  const form = event.target;
  const status = document.getElementById("contact-status");
  const payload = Object.fromEntries(new FormData(form));
  const res = await fetch("/api/submit-form", {
    method: "POST",
    headers: { "Content-Type": "application/json" },
    body: JSON.stringify(payload),
  });
  const data = await res.json().catch(() => ({}));
  status.textContent = data.message || "";
  if (res.ok) form.reset();
});
</script>"#,
    )
}

pub fn login_html() -> String {
    page(
        "Вход для администратора",
        "Вход в панель администратора",
        r#"<h1>Вход для администратора</h1>
<form id="login-form">
<label>Email <input name="email" type="email" required></label>
<label>Пароль <input name="password" type="password" required></label>
<button type="submit">Войти</button>
<p id="login-error" role="alert"></p>
</form>
<script>
document.getElementById("login-form").addEventListener("submit", async (event) => {
  event.preventDefault();
  const error = document.getElementById("login-error");
  const payload = Object.fromEntries(new FormData(event.target));
  const res = await fetch("/api/admin/login", {
    method: "POST",
    headers: { "Content-Type": "application/json" },
    body: JSON.stringify(payload),
  });
  const data = await res.json().catch(() => ({}));
  if (!res.ok) {
    error.textContent = data.error || "Authentication failed";
    return;
  }
  localStorage.setItem("admin_token", data.access_token);
  window.location.href = "/admin";
});
</script>"#,
    )
}

fn not_found_html(message: &str) -> String {
    let body = format!(
        "<h1>{}</h1>\n<p><a href=\"/\">На главную</a></p>\n",
        escape(message)
    );
    page(message, "", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{state_for, FakeBackend};
    use http_body_util::BodyExt;

    fn recoleta() -> TourDetail {
        TourDetail {
            name: "Реколета <VIP>".into(),
            slug: "recoleta".into(),
            description: "Кладбище и кафе".into(),
            additional_description: String::new(),
            duration: 120,
            cost: "30 USD".into(),
            additional_cost: String::new(),
            meeting_point: "Plaza Francia".into(),
            max_capacity: Some(12),
            date: NaiveDate::from_ymd_opt(2024, 7, 10).unwrap(),
            time: "11:00".into(),
            date_id: 7,
        }
    }

    async fn body_text(resp: SiteResponse) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_schedule_links_to_dates() {
        let tours = vec![ScheduledTour {
            name: "Реколета".into(),
            slug: "recoleta".into(),
            date_id: 7,
            raw_date: NaiveDate::from_ymd_opt(2024, 7, 10).unwrap(),
            time: "11:00".into(),
        }];
        let html = schedule_html(&tours);
        assert!(html.contains(r#"<a href="/group-tours/recoleta/7">📅 10 июля, 11:00 - Реколета</a>"#));
    }

    #[test]
    fn test_tour_page_fields() {
        let html = tour_html(&recoleta());
        assert!(html.contains("Реколета &lt;VIP&gt;"));
        assert!(html.contains("⏱ Длительность: 2 часа"));
        assert!(html.contains("👥 Максимум: 12 человек"));
        assert!(html.contains("📅 Когда: 10 июля, 11:00"));
        assert!(!html.contains("Доп. расходы"));
    }

    #[test]
    fn test_blog_listing_reading_time() {
        let posts = vec![
            BlogPost {
                slug: "mate".into(),
                title: "Мате".into(),
                description: Some("Гид".into()),
                content: String::new(),
                reading_time_minutes: Some(5),
                created_at: Some("2024-05-01T10:00:00".into()),
            },
            BlogPost {
                slug: "tango".into(),
                title: "Танго".into(),
                description: None,
                content: String::new(),
                reading_time_minutes: None,
                created_at: None,
            },
        ];
        let html = blog_list_html(&posts);
        assert!(html.contains("5 мин · 1 мая 2024"));
        assert!(html.contains("N/A"));
    }

    #[test]
    fn test_query_param() {
        let uri: Uri = "/group-tours/recoleta?date_id=7&utm=ig".parse().unwrap();
        assert_eq!(query_param(&uri, "date_id").as_deref(), Some("7"));
        assert_eq!(query_param(&uri, "missing"), None);
    }

    #[tokio::test]
    async fn test_tour_page_from_backend() {
        let fake = FakeBackend::start(|req| match req.uri.as_str() {
            "/api/v1/tours/recoleta/7" => (200, serde_json::to_string(&recoleta()).unwrap()),
            _ => (404, r#"{"detail":"Tour not found"}"#.to_string()),
        })
        .await;
        let state = state_for(&fake.origin);

        let resp = render(&"/group-tours/recoleta/7".parse().unwrap(), &state, false)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("Plaza Francia"));

        let resp = render(&"/group-tours/recoleta?date_id=7".parse().unwrap(), &state, false)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = render(&"/group-tours/recoleta/8".parse().unwrap(), &state, false)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(body_text(resp).await.contains(TOUR_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_schedule_degrades_to_empty_on_failure() {
        let state = state_for("http://127.0.0.1:1");
        let resp = render(&"/group-tours".parse().unwrap(), &state, false).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("нет запланированных"));
    }

    #[tokio::test]
    async fn test_unknown_paths_are_not_pages() {
        let state = state_for("http://127.0.0.1:1");
        assert!(render(&"/styles.css".parse().unwrap(), &state, false).await.is_none());
        assert!(render(&"/blog/a/b".parse().unwrap(), &state, false).await.is_none());
    }
}
