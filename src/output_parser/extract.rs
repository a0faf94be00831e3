//! Shared cleanup and extraction helpers for raw model output.
//!
//! Used by the schema-guided strategy only. Line-format parsing reads the
//! raw text as-is.

/// Strip reasoning blocks and surrounding whitespace.
///
/// The schema-guided parser calls this before any decode attempt.
pub fn preprocess(text: &str) -> String {
    strip_think_tags(text).trim().to_string()
}

/// Remove `<think>...</think>` and `<thinking>...</thinking>` blocks.
///
/// An unterminated block swallows the rest of the text, since whatever
/// follows an unclosed reasoning tag is still reasoning.
///
/// ```
/// use readme_digest::output_parser::strip_think_tags;
///
/// assert_eq!(strip_think_tags("<think>hmm</think>Summary: ok"), "Summary: ok");
/// assert_eq!(strip_think_tags("<thinking>never closed"), "");
/// ```
pub fn strip_think_tags(text: &str) -> String {
    let once = strip_blocks(text, "<think>", "</think>");
    strip_blocks(&once, "<thinking>", "</thinking>")
}

fn strip_blocks(text: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(open) {
        out.push_str(&rest[..start]);
        match rest[start..].find(close) {
            Some(end) => rest = &rest[start + end + close.len()..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Body of the first fenced code block tagged `lang` (case-insensitive).
///
/// Falls back to the first untagged fence when no tagged one exists.
///
/// ```
/// use readme_digest::output_parser::extract::fenced_block;
///
/// let text = "Result:\n```json\n{\"summary\": \"x\"}\n```";
/// assert_eq!(fenced_block(text, "json"), Some("{\"summary\": \"x\"}"));
/// ```
pub fn fenced_block<'a>(text: &'a str, lang: &str) -> Option<&'a str> {
    let mut untagged = None;
    let mut from = 0;

    while let Some(offset) = text[from..].find("```") {
        let info_start = from + offset + 3;
        let Some(info_len) = text[info_start..].find('\n') else {
            break;
        };
        let info = text[info_start..info_start + info_len].trim();
        let body_start = info_start + info_len + 1;
        let Some(body_len) = text[body_start..].find("```") else {
            break;
        };
        let body = text[body_start..body_start + body_len].trim();

        if info.eq_ignore_ascii_case(lang) {
            return Some(body);
        }
        if info.is_empty() && untagged.is_none() {
            untagged = Some(body);
        }
        from = body_start + body_len + 3;
    }

    untagged
}

/// The last balanced `{...}` region in `text`.
///
/// Braces inside JSON string literals are ignored. Later objects win because
/// models tend to put their answer after any preamble that quotes JSON.
///
/// ```
/// use readme_digest::output_parser::extract::last_object;
///
/// let text = r#"Example: {"a": 1}. Answer: {"summary": "{braces}"}"#;
/// assert_eq!(last_object(text), Some(r#"{"summary": "{braces}"}"#));
/// ```
pub fn last_object(text: &str) -> Option<&str> {
    let mut found = None;
    let mut from = 0;

    while let Some(offset) = text[from..].find('{') {
        let start = from + offset;
        match matching_close(&text[start..]) {
            Some(len) => {
                found = Some(&text[start..start + len]);
                from = start + len;
            }
            None => break,
        }
    }

    found
}

/// Byte length of the object starting at `s[0] == '{'`, if it closes.
fn matching_close(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in s.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}
