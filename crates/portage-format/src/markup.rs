// SPDX-FileCopyrightText: 2026 Portage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source markdown to destination HTML conversion.
//!
//! Code spans must be extracted before anything else: literal `*`/`_`/`[`
//! inside inline or fenced code are not formatting, and escaping must not
//! touch already-produced tags. The pipeline is therefore: segment into
//! code and non-code, escape `&`/`<`/`>` per segment, then run span
//! conversion on the non-code segments only.

use std::sync::LazyLock;

use regex::Regex;

static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)\s]+)\)").unwrap());
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").unwrap());
static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static ITALIC_STAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*]+)\*").unwrap());
// \b keeps snake_case identifiers and URL path segments intact: an
// underscore flanked by word characters is not an italic delimiter.
static ITALIC_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b_([^_]+)_\b").unwrap());

/// One lexed piece of the source body.
#[derive(Debug, PartialEq, Eq)]
enum Segment {
    Text(String),
    InlineCode(String),
    FencedCode(String),
}

/// Escape the destination markup's special characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Split the body into code and non-code segments.
///
/// A run of three or more backticks opens a fenced block closed by the
/// next run of three; a single backtick opens an inline span closed by
/// the next backtick. Two bare backticks are literal text. Unclosed
/// spans keep their collected content as code rather than erroring.
fn segment(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch != '`' {
            current.push(chars.next().unwrap());
            continue;
        }

        let mut backticks = 0;
        while chars.peek() == Some(&'`') {
            chars.next();
            backticks += 1;
        }

        if backticks == 2 {
            current.push_str("``");
            continue;
        }

        if !current.is_empty() {
            segments.push(Segment::Text(std::mem::take(&mut current)));
        }

        if backticks >= 3 {
            let mut body = String::new();
            let mut close_run = 0;
            for c in chars.by_ref() {
                if c == '`' {
                    close_run += 1;
                    if close_run == 3 {
                        break;
                    }
                } else {
                    for _ in 0..close_run {
                        body.push('`');
                    }
                    close_run = 0;
                    body.push(c);
                }
            }
            segments.push(Segment::FencedCode(body));
        } else {
            let mut body = String::new();
            for c in chars.by_ref() {
                if c == '`' {
                    break;
                }
                body.push(c);
            }
            segments.push(Segment::InlineCode(body));
        }
    }

    if !current.is_empty() {
        segments.push(Segment::Text(current));
    }
    segments
}

/// Convert the spans of one already-escaped text segment.
fn convert_spans(escaped: &str) -> String {
    let out = IMAGE.replace_all(escaped, r#"<img src="$2" alt="$1" />"#);
    let out = LINK.replace_all(&out, r#"<a href="$2">$1</a>"#);
    let out = BOLD.replace_all(&out, "<strong>$1</strong>");
    let out = ITALIC_STAR.replace_all(&out, "<em>$1</em>");
    let out = ITALIC_UNDERSCORE.replace_all(&out, "<em>$1</em>");
    out.replace('\n', "<br />")
}

/// Render a fenced block, lifting a leading single-word language line
/// into a class attribute.
fn render_fenced(body: &str) -> String {
    let (lang, code) = match body.split_once('\n') {
        Some((first, rest))
            if !first.is_empty() && first.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            (Some(first), rest)
        }
        _ => (None, body),
    };
    let code = escape_html(code.trim_matches('\n'));
    match lang {
        Some(lang) => format!("<pre><code class=\"language-{lang}\">{code}</code></pre>"),
        None => format!("<pre><code>{code}</code></pre>"),
    }
}

/// Convert a markdown body to destination HTML.
pub fn markdown_to_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    for seg in segment(text) {
        match seg {
            Segment::Text(t) => out.push_str(&convert_spans(&escape_html(&t))),
            Segment::InlineCode(c) => {
                out.push_str("<code>");
                out.push_str(&escape_html(&c));
                out.push_str("</code>");
            }
            Segment::FencedCode(c) => out.push_str(&render_fenced(&c)),
        }
    }
    out
}

/// Convert a plain-text body: entity escaping and line breaks only.
pub fn plain_to_html(text: &str) -> String {
    escape_html(text).replace('\n', "<br />")
}
