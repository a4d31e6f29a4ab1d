use crate::server::router::ForgeState;
use axum::{
    Router,
    extract::State,
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, SecondsFormat, Utc};
use url::Url;

pub fn router() -> Router<ForgeState> {
    Router::new().route("/sitemap.xml", get(sitemap_handler))
}

pub async fn sitemap_handler(State(state): State<ForgeState>) -> impl IntoResponse {
    (
        [
            (CONTENT_TYPE, "application/xml"),
            (CACHE_CONTROL, "public, max-age=86400"),
        ],
        render_sitemap(&state.site_url, Utc::now()),
    )
}

fn render_sitemap(site_url: &Url, lastmod: DateTime<Utc>) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url>
    <loc>{}</loc>
    <lastmod>{}</lastmod>
    <changefreq>weekly</changefreq>
    <priority>1.0</priority>
  </url>
</urlset>"#,
        xml_escape(site_url.as_str()),
        lastmod.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

fn xml_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
