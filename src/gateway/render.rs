//! Gemtext to HTML conversion.
//!
//! # Responsibilities
//! - Classify each line with an ordered prefix rule table
//! - Track preformatted mode explicitly across the loop
//! - Rewrite link targets into gateway paths
//! - Escape every piece of document text (maud does this for all splices)
//!
//! # Design Decisions
//! - One output element per line; a preformatted block is one `<pre>`
//! - An unterminated preformatted block is closed at end of input
//! - Malformed link lines degrade to plain paragraphs

use maud::{html, Markup};
use url::Url;

use crate::gateway::url::to_proxy_path;

const FENCE: &str = "```";

/// Schemes that would run code if placed in an href.
const EXECUTABLE_SCHEMES: [&str; 3] = ["javascript", "vbscript", "data"];

/// Inputs available to a line rule.
#[derive(Debug, Clone, Copy)]
pub struct LineContext<'a> {
    /// The complete line.
    pub line: &'a str,
    /// The line with the rule's prefix removed.
    pub rest: &'a str,
    /// Gateway path of the document, used to resolve links.
    pub base: &'a str,
}

/// A prefix and the element it produces.
pub struct LineRule {
    pub prefix: &'static str,
    pub render: fn(LineContext<'_>) -> Markup,
}

/// Rules for lines outside a preformatted block, checked in order.
///
/// Longer heading prefixes come first so `##` is never read as `#`.
pub const LINE_RULES: &[LineRule] = &[
    LineRule { prefix: "###", render: heading3 },
    LineRule { prefix: "##", render: heading2 },
    LineRule { prefix: "#", render: heading1 },
    LineRule { prefix: "=>", render: link },
    LineRule { prefix: "*", render: list_item },
    LineRule { prefix: ">", render: quote },
];

/// Lines collected while inside a fence.
#[derive(Debug)]
struct Preformatted<'a> {
    caption: &'a str,
    lines: Vec<&'a str>,
}

impl Preformatted<'_> {
    fn into_markup(self) -> Markup {
        let caption = Some(self.caption).filter(|c| !c.is_empty());
        // HTML parsers drop a newline directly after `<pre>`.
        html! {
            pre title=[caption] { "\n" (self.lines.join("\n")) }
        }
    }
}

/// Render a gemtext document located at `base` into an HTML fragment.
pub fn render(body: &str, base: &str) -> String {
    let mut out = String::with_capacity(body.len() * 2);
    let mut pre: Option<Preformatted<'_>> = None;

    for line in body.lines() {
        if let Some(mut block) = pre.take() {
            if line.starts_with(FENCE) {
                push_element(&mut out, block.into_markup());
            } else {
                block.lines.push(line);
                pre = Some(block);
            }
            continue;
        }

        if let Some(caption) = line.strip_prefix(FENCE) {
            pre = Some(Preformatted {
                caption: caption.trim(),
                lines: Vec::new(),
            });
            continue;
        }

        push_element(&mut out, render_line(line, base));
    }

    if let Some(block) = pre {
        tracing::debug!(base = %base, "Closing unterminated preformatted block");
        push_element(&mut out, block.into_markup());
    }

    out
}

/// Render a single line that is not inside a preformatted block.
pub fn render_line(line: &str, base: &str) -> Markup {
    for rule in LINE_RULES {
        if let Some(rest) = line.strip_prefix(rule.prefix) {
            return (rule.render)(LineContext { line, rest, base });
        }
    }
    paragraph(line)
}

fn push_element(out: &mut String, element: Markup) {
    out.push_str(&element.into_string());
    out.push('\n');
}

fn paragraph(text: &str) -> Markup {
    html! { p { (text) } }
}

fn heading1(ctx: LineContext<'_>) -> Markup {
    html! { h1 { (ctx.rest.trim_start()) } }
}

fn heading2(ctx: LineContext<'_>) -> Markup {
    html! { h2 { (ctx.rest.trim_start()) } }
}

fn heading3(ctx: LineContext<'_>) -> Markup {
    html! { h3 { (ctx.rest.trim_start()) } }
}

fn list_item(ctx: LineContext<'_>) -> Markup {
    html! { p.list { (ctx.rest.trim_start()) } }
}

fn quote(ctx: LineContext<'_>) -> Markup {
    html! { p.quote { (ctx.rest.trim_start()) } }
}

fn link(ctx: LineContext<'_>) -> Markup {
    let rest = ctx.rest.trim_start();
    let (target, label) = match rest.split_once(char::is_whitespace) {
        Some((target, label)) => (target, label.trim()),
        None => (rest, ""),
    };

    if target.is_empty() {
        tracing::debug!(line = %ctx.line, "Link line without a target");
        return paragraph(ctx.line);
    }

    let label = if label.is_empty() { target } else { label };
    let href = safe_href(to_proxy_path(target, ctx.base));

    match split_annotation(label) {
        Some((text, annotation)) => html! {
            p.link {
                a href=(href) {
                    (text)
                    span.annotation style="float:right" { (annotation) }
                }
            }
        },
        None => html! {
            p.link { a href=(href) { (label) } }
        },
    }
}

/// Split `text (note)` into its text and trailing parenthetical.
fn split_annotation(label: &str) -> Option<(&str, &str)> {
    if !label.ends_with(')') {
        return None;
    }
    let open = label.rfind('(')?;
    let head = &label[..open];
    if !head.ends_with(char::is_whitespace) {
        return None;
    }
    let text = head.trim_end();
    if text.is_empty() {
        return None;
    }
    Some((text, &label[open..]))
}

/// Replace hrefs with an executable scheme by `#`.
///
/// The scheme is taken from the parsed URL, which strips the leading control
/// characters and embedded tabs or newlines that browsers ignore as well.
fn safe_href(href: String) -> String {
    let executable = Url::parse(&href)
        .map(|url| EXECUTABLE_SCHEMES.contains(&url.scheme()))
        .unwrap_or(false);
    if executable {
        tracing::debug!(href = %href.escape_debug(), "Neutralising executable link");
        "#".to_string()
    } else {
        href
    }
}
