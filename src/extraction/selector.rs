//! Ranked candidate selectors and the resolver that walks them.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

static SELECTOR_CACHE: Lazy<RwLock<HashMap<&'static str, Option<Arc<Selector>>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

static REGEX_CACHE: Lazy<RwLock<HashMap<&'static str, Option<Arc<Regex>>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Parse a CSS expression once per process; invalid expressions are cached as `None`
pub fn compiled_selector(css: &'static str) -> Option<Arc<Selector>> {
    if let Ok(cache) = SELECTOR_CACHE.read() {
        if let Some(entry) = cache.get(css) {
            return entry.clone();
        }
    }

    let parsed = match Selector::parse(css) {
        Ok(selector) => Some(Arc::new(selector)),
        Err(e) => {
            debug!("Ignoring invalid selector '{}': {:?}", css, e);
            None
        }
    };

    if let Ok(mut cache) = SELECTOR_CACHE.write() {
        cache.insert(css, parsed.clone());
    }
    parsed
}

/// Compile a regex pattern once per process
pub fn compiled_regex(pattern: &'static str) -> Option<Arc<Regex>> {
    if let Ok(cache) = REGEX_CACHE.read() {
        if let Some(entry) = cache.get(pattern) {
            return entry.clone();
        }
    }

    let parsed = match Regex::new(pattern) {
        Ok(regex) => Some(Arc::new(regex)),
        Err(e) => {
            debug!("Ignoring invalid pattern '{}': {}", pattern, e);
            None
        }
    };

    if let Ok(mut cache) = REGEX_CACHE.write() {
        cache.insert(pattern, parsed.clone());
    }
    parsed
}

/// Collapse runs of whitespace into single spaces and trim
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Concatenated, whitespace-normalized text content of an element
pub fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

/// Something CSS lookups can run against: a whole document or one container element
pub trait QueryScope {
    fn query(&self, selector: &Selector) -> Vec<ElementRef<'_>>;

    /// The element standing for the scope itself
    fn scope_element(&self) -> ElementRef<'_>;

    /// Visible text nodes under the scope, skipping script and style content
    fn text_nodes(&self) -> Vec<&str> {
        self.scope_element()
            .descendants()
            .filter_map(|node| {
                let text = node.value().as_text()?;
                let hidden = node
                    .parent()
                    .and_then(|parent| parent.value().as_element().map(|e| e.name()))
                    .map(|name| matches!(name, "script" | "style" | "noscript"))
                    .unwrap_or(false);
                if hidden {
                    None
                } else {
                    Some(&**text)
                }
            })
            .filter(|text| !text.trim().is_empty())
            .collect()
    }
}

impl QueryScope for Html {
    fn query(&self, selector: &Selector) -> Vec<ElementRef<'_>> {
        self.select(selector).collect()
    }

    fn scope_element(&self) -> ElementRef<'_> {
        self.root_element()
    }
}

impl<'a> QueryScope for ElementRef<'a> {
    fn query(&self, selector: &Selector) -> Vec<ElementRef<'_>> {
        self.select(selector).collect()
    }

    fn scope_element(&self) -> ElementRef<'_> {
        *self
    }
}

/// What to read from a matched element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extract {
    Text,
    Attribute(&'static str),
    /// Text of the matched element's parent
    ParentText,
    /// Text of the first element sibling after the match
    NextSiblingText,
}

impl Extract {
    fn read(&self, element: ElementRef<'_>) -> Option<String> {
        match self {
            Extract::Text => Some(element_text(element)),
            Extract::Attribute(name) => element.value().attr(name).map(normalize_whitespace),
            Extract::ParentText => element.parent().and_then(ElementRef::wrap).map(element_text),
            Extract::NextSiblingText => element
                .next_siblings()
                .find_map(ElementRef::wrap)
                .map(element_text),
        }
    }
}

/// Predicate over a matched element's text, standing in for `:contains()`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFilter {
    Contains(&'static str),
    Matches(&'static str),
}

impl TextFilter {
    pub fn accepts(&self, text: &str) -> bool {
        match self {
            TextFilter::Contains(needle) => text.contains(needle),
            TextFilter::Matches(pattern) => compiled_regex(pattern)
                .map(|regex| regex.is_match(text))
                .unwrap_or(false),
        }
    }
}

/// One ranked lookup expression; an empty `css` addresses the scope element itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub css: &'static str,
    pub extract: Extract,
    pub filter: Option<TextFilter>,
}

impl Candidate {
    /// Elements this candidate matches in `scope`, text filter applied
    pub fn matches<'s, S: QueryScope + ?Sized>(&self, scope: &'s S) -> Vec<ElementRef<'s>> {
        let elements = if self.css.is_empty() {
            vec![scope.scope_element()]
        } else {
            match compiled_selector(self.css) {
                Some(selector) => scope.query(&selector),
                None => return Vec::new(),
            }
        };

        match self.filter {
            Some(filter) => elements
                .into_iter()
                .filter(|element| filter.accepts(&element_text(*element)))
                .collect(),
            None => elements,
        }
    }

    /// First non-empty value among this candidate's matches
    pub fn first_value<S: QueryScope + ?Sized>(&self, scope: &S) -> Option<String> {
        self.matches(scope)
            .into_iter()
            .filter_map(|element| self.extract.read(element))
            .find(|value| !value.is_empty())
    }

    /// Every non-empty value among this candidate's matches, in document order
    pub fn all_values<S: QueryScope + ?Sized>(&self, scope: &S) -> Vec<String> {
        self.matches(scope)
            .into_iter()
            .filter_map(|element| self.extract.read(element))
            .filter(|value| !value.is_empty())
            .collect()
    }
}

/// Priority fallback: the first candidate that yields a non-empty value wins
pub fn resolve<S: QueryScope + ?Sized>(scope: &S, candidates: &[Candidate]) -> Option<String> {
    candidates.iter().find_map(|candidate| candidate.first_value(scope))
}

/// All values of the first productive candidate, de-duplicated in order
pub fn resolve_all<S: QueryScope + ?Sized>(scope: &S, candidates: &[Candidate]) -> Vec<String> {
    for candidate in candidates {
        let values = candidate.all_values(scope);
        if !values.is_empty() {
            let mut seen = std::collections::HashSet::new();
            return values
                .into_iter()
                .filter(|value| seen.insert(value.clone()))
                .collect();
        }
    }
    Vec::new()
}
