//! Boilerplate stripping for free-text fields captured from login-walled pages.

use once_cell::sync::Lazy;
use regex::Regex;

/// Longest value kept without looking for a truncation point
const MAX_CLEAN_CHARS: usize = 120;

/// Login and consent phrases, each removed together with the rest of its sentence
static BOILERPLATE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)sign in[^.]*\.?",
        r"(?i)join now[^.]*\.?",
        r"(?i)by clicking[^.]*\.?",
        r"(?i)privacy policy[^.]*\.?",
        r"(?i)cookie policy[^.]*\.?",
        r"(?i)email or phone[^.]*\.?",
        r"(?i)password[^.]*\.?",
        r"(?i)view\s+(?:[\w'’]+\s+){0,3}profile[^.]*\.?",
        r"(?i)learn more[^.]*\.?",
        r"(?i)contact info",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

static WHITESPACE_RUN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\s{2,}").ok());

const LEADING_SEPARATORS: &[char] = &['·', '•', '|', ',', ';', ':', '-', '–', '—', '.'];

/// Strip boilerplate, collapse whitespace and cut overlong leftovers.
///
/// Overlong output (more than 120 chars) is cut at the first run of two or
/// more whitespace characters in the stripped text, when there is one.
pub fn sanitize(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let stripped = BOILERPLATE
        .iter()
        .fold(text.to_string(), |acc, pattern| pattern.replace_all(&acc, "").into_owned());

    let cleaned = collapse(&stripped);
    if cleaned.chars().count() <= MAX_CLEAN_CHARS {
        return cleaned;
    }

    let body = stripped.trim_start();
    let cut = WHITESPACE_RUN
        .as_ref()
        .and_then(|run| run.find(body))
        .map(|m| m.start())
        .filter(|start| *start > 0);

    match cut {
        Some(start) => collapse(&body[..start]),
        None => cleaned,
    }
}

fn collapse(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_start_matches(|c: char| c.is_whitespace() || LEADING_SEPARATORS.contains(&c))
        .trim_end()
        .to_string()
}
