//! Fallback values computed when no selector produced a field.

use once_cell::unsync::OnceCell;
use std::collections::BTreeMap;

use super::selector::{compiled_regex, normalize_whitespace, QueryScope};

/// How a derived value is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    /// First free-text node in scope matching `pattern`; the whole match is kept
    TextScan { pattern: &'static str },
    /// Capture group `group` of `pattern` over an earlier field of the same record
    Capture {
        field: &'static str,
        pattern: &'static str,
        group: usize,
    },
    /// Capture group `group` of `pattern` over the source URL
    UrlCapture { pattern: &'static str, group: usize },
}

/// Inputs a derivation may read; text nodes are gathered at most once per scope
pub struct DeriveContext<'s, S: QueryScope + ?Sized> {
    scope: &'s S,
    text_nodes: OnceCell<Vec<&'s str>>,
    url: Option<&'s str>,
}

impl<'s, S: QueryScope + ?Sized> DeriveContext<'s, S> {
    pub fn new(scope: &'s S, url: Option<&'s str>) -> Self {
        Self {
            scope,
            text_nodes: OnceCell::new(),
            url,
        }
    }

    fn text_nodes(&self) -> &[&'s str] {
        self.text_nodes.get_or_init(|| self.scope.text_nodes())
    }

    /// Evaluate `derivation`; `fields` holds the values resolved so far
    pub fn derive(&self, derivation: &Derivation, fields: &BTreeMap<String, String>) -> Option<String> {
        let value = match *derivation {
            Derivation::TextScan { pattern } => {
                let regex = compiled_regex(pattern)?;
                self.text_nodes()
                    .iter()
                    .find_map(|text| regex.find(text).map(|m| normalize_whitespace(m.as_str())))
            }
            Derivation::Capture { field, pattern, group } => {
                let source = fields.get(field).filter(|value| !value.is_empty())?;
                capture(pattern, group, source)
            }
            Derivation::UrlCapture { pattern, group } => capture(pattern, group, self.url?),
        };
        value.filter(|value| !value.is_empty())
    }

    /// First derivation in the list that yields a value
    pub fn first(&self, derivations: &[Derivation], fields: &BTreeMap<String, String>) -> Option<String> {
        derivations.iter().find_map(|derivation| self.derive(derivation, fields))
    }
}

fn capture(pattern: &'static str, group: usize, source: &str) -> Option<String> {
    let regex = compiled_regex(pattern)?;
    regex
        .captures(source)
        .and_then(|caps| caps.get(group))
        .map(|m| normalize_whitespace(m.as_str()))
}
