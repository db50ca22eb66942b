//! HTML page wrapper around a rendered gateway page.

use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::gateway::{PageKind, RenderedPage, GATEWAY_PREFIX};

const STYLESHEET: &str = r#"
body { max-width: 48rem; margin: 0 auto; padding: 0 1rem; font-family: sans-serif; line-height: 1.5; }
header { display: flex; justify-content: space-between; gap: 1rem; padding: 0.5rem 0; border-bottom: 3px solid var(--accent); }
header a, main a { color: var(--accent); }
.status { font-family: monospace; white-space: nowrap; }
pre { overflow-x: auto; padding: 0.5rem; background: #f4f4f4; }
p.list::before { content: "\2022  "; }
p.quote { border-left: 3px solid var(--accent); padding-left: 0.75rem; font-style: italic; }
p.link a { display: block; }
.error { color: #a00; }
footer { margin: 2rem 0 1rem; font-size: 0.85rem; color: #666; }
"#;

/// Render a complete HTML document for `page`.
pub fn render_page(page: &RenderedPage) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (page.host) " - gemgate" }
                style { (PreEscaped(STYLESHEET)) }
            }
            body style={ "--accent: " (page.theme) } {
                header {
                    nav.breadcrumbs { (breadcrumbs(&page.path)) }
                    span.status { "status " (page.status) }
                }
                main { (content(page)) }
                footer {
                    "Proxied from "
                    a href={ "gemini://" (page.path) } { "gemini://" (page.path) }
                }
            }
        }
    }
}

fn content(page: &RenderedPage) -> Markup {
    match &page.kind {
        PageKind::Input { prompt, sensitive } => {
            let document = page.path.split('?').next().unwrap_or_default();
            let field_type = if *sensitive { "password" } else { "text" };
            html! {
                form.input action="/search" method="get" {
                    input type="hidden" name="url" value=(document);
                    label for="q" { (prompt) }
                    input id="q" type=(field_type) name="q" autofocus;
                    button type="submit" { "Submit" }
                }
            }
        }
        PageKind::Document(fragment) => html! {
            article.gemtext { (PreEscaped(fragment)) }
        },
        PageKind::PlainText(text) => html! {
            pre.plain { "\n" (text) }
        },
        PageKind::Error(description) => html! {
            section.error {
                h1 { "Error" }
                p { (description) }
            }
        },
    }
}

/// Link every prefix of `host/dir/page?query`, directories with a trailing slash.
fn breadcrumbs(path_with_query: &str) -> Markup {
    let (path, query) = match path_with_query.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path_with_query, None),
    };
    let segments: Vec<&str> = path.split('/').collect();
    let last = segments.len() - 1;

    html! {
        @for (i, segment) in segments.iter().enumerate() {
            @if !segment.is_empty() {
                @if i > 0 { "/" }
                @let target = segments[..=i].join("/");
                @if i < last {
                    a href={ (GATEWAY_PREFIX) (target) "/" } { (segment) }
                } @else {
                    a href={ (GATEWAY_PREFIX) (target) } { (segment) }
                }
            } @else if i == last && i > 0 {
                "/"
            }
        }
        @if let Some(query) = query {
            "?" span.query { (query) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::PageStatus;

    fn page(kind: PageKind) -> RenderedPage {
        RenderedPage {
            host: "example.org".to_string(),
            path: "example.org/dir/page.gmi?a<b".to_string(),
            theme: "#123456".to_string(),
            status: PageStatus::Code(20),
            kind,
        }
    }

    #[test]
    fn test_page_shows_every_field() {
        let html = render_page(&page(PageKind::Document("<h1>Hi</h1>".to_string()))).into_string();
        assert!(html.contains("<title>example.org - gemgate</title>"));
        assert!(html.contains("--accent: #123456"));
        assert!(html.contains("status 20"));
        assert!(html.contains("<article class=\"gemtext\"><h1>Hi</h1></article>"));
        // The query is escaped in the breadcrumb.
        assert!(html.contains("a&lt;b"));
    }

    #[test]
    fn test_plain_text_escaped() {
        let html = render_page(&page(PageKind::PlainText("1 < 2 & <b>".to_string()))).into_string();
        assert!(html.contains("1 &lt; 2 &amp; &lt;b&gt;"));
    }

    #[test]
    fn test_input_form() {
        let html = render_page(&page(PageKind::Input {
            prompt: "Search for".to_string(),
            sensitive: false,
        }))
        .into_string();
        assert!(html.contains(r#"action="/search""#));
        assert!(html.contains(r#"name="url" value="example.org/dir/page.gmi""#));
        assert!(html.contains("Search for"));
        assert!(html.contains(r#"type="text""#));
    }

    #[test]
    fn test_sensitive_input_uses_password_field() {
        let html = render_page(&page(PageKind::Input {
            prompt: "Password".to_string(),
            sensitive: true,
        }))
        .into_string();
        assert!(html.contains(r#"type="password""#));
    }

    #[test]
    fn test_error_page_placeholder_status() {
        let mut error = page(PageKind::Error("connection refused".to_string()));
        error.status = PageStatus::Unavailable;
        let html = render_page(&error).into_string();
        assert!(html.contains("status --"));
        assert!(html.contains("connection refused"));
    }

    #[test]
    fn test_breadcrumbs() {
        let html = breadcrumbs("example.org/dir/page.gmi").into_string();
        assert_eq!(
            html,
            concat!(
                r#"<a href="/gateway/example.org/">example.org</a>"#,
                r#"/<a href="/gateway/example.org/dir/">dir</a>"#,
                r#"/<a href="/gateway/example.org/dir/page.gmi">page.gmi</a>"#,
            )
        );

        let html = breadcrumbs("example.org/dir/").into_string();
        assert!(html.ends_with(r#"<a href="/gateway/example.org/dir/">dir</a>/"#));
    }
}
