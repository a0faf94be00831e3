//! Conservative JSON repair for near-miss model output.
//!
//! Only fixes that cannot change the meaning of a well-intended object are
//! applied. Anything more ambitious is left to the fallback path.

/// Try to turn almost-JSON into JSON.
///
/// Returns `None` when the input is already valid or still invalid after
/// repair. Fixes, in order:
/// 1. Typographic double quotes (`“ ”`) outside strings become `"`
/// 2. Trailing commas before `}` or `]` are removed
/// 3. Unclosed strings, arrays and objects at the end are closed
///
/// ```
/// use readme_digest::output_parser::try_repair_json;
///
/// let fixed = try_repair_json(r#"{"cool_facts": ["a", "b",],}"#).unwrap();
/// assert_eq!(fixed, r#"{"cool_facts": ["a", "b"]}"#);
/// ```
pub fn try_repair_json(broken: &str) -> Option<String> {
    if serde_json::from_str::<serde_json::Value>(broken).is_ok() {
        return None;
    }

    let repaired = close_unterminated(&drop_trailing_commas(&straighten_quotes(broken)));

    serde_json::from_str::<serde_json::Value>(&repaired)
        .is_ok()
        .then_some(repaired)
}

/// Replace curly double quotes used as string delimiters.
///
/// A string opened with a curly quote is closed by the next curly quote;
/// curly quotes inside a normally quoted string are content.
fn straighten_quotes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    // Some(true) while inside a string opened by a curly quote.
    let mut open: Option<bool> = None;
    let mut escaped = false;

    for ch in s.chars() {
        let curly = ch == '\u{201C}' || ch == '\u{201D}';
        match open {
            Some(_) if escaped => {
                escaped = false;
                out.push(ch);
            }
            Some(_) if ch == '\\' => {
                escaped = true;
                out.push(ch);
            }
            Some(true) if curly => {
                open = None;
                out.push('"');
            }
            Some(false) if ch == '"' => {
                open = None;
                out.push('"');
            }
            Some(_) => out.push(ch),
            None if curly || ch == '"' => {
                open = Some(curly);
                out.push('"');
            }
            None => out.push(ch),
        }
    }

    out
}

fn drop_trailing_commas(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &ch) in chars.iter().enumerate() {
        if in_string {
            out.push(ch);
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        if ch == '"' {
            in_string = true;
        }
        if ch == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(ch);
    }

    out
}

/// Close whatever is still open when the text ends (truncated output).
fn close_unterminated(s: &str) -> String {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for ch in s.chars() {
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
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                stack.pop();
            }
            _ => {}
        }
    }

    let mut out = s.trim_end().to_string();
    if in_string {
        out.push('"');
    }
    while let Some(close) = stack.pop() {
        out.push(close);
    }
    out
}
