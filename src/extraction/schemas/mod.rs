//! Static field tables, one per entity kind.
//!
//! Tables are plain data: the engine walks them the same way for every kind.

use super::derive::Derivation;
use super::selector::Candidate;
use crate::platform::EntityKind;

macro_rules! text {
    ($css:expr) => {
        $crate::extraction::selector::Candidate {
            css: $css,
            extract: $crate::extraction::selector::Extract::Text,
            filter: None,
        }
    };
    ($css:expr, contains $needle:expr) => {
        $crate::extraction::selector::Candidate {
            css: $css,
            extract: $crate::extraction::selector::Extract::Text,
            filter: Some($crate::extraction::selector::TextFilter::Contains($needle)),
        }
    };
    ($css:expr, matches $pattern:expr) => {
        $crate::extraction::selector::Candidate {
            css: $css,
            extract: $crate::extraction::selector::Extract::Text,
            filter: Some($crate::extraction::selector::TextFilter::Matches($pattern)),
        }
    };
}

macro_rules! attr {
    ($css:expr, $name:expr) => {
        $crate::extraction::selector::Candidate {
            css: $css,
            extract: $crate::extraction::selector::Extract::Attribute($name),
            filter: None,
        }
    };
}

macro_rules! parent_text {
    ($css:expr) => {
        $crate::extraction::selector::Candidate {
            css: $css,
            extract: $crate::extraction::selector::Extract::ParentText,
            filter: None,
        }
    };
}

macro_rules! next_text {
    ($css:expr, contains $needle:expr) => {
        $crate::extraction::selector::Candidate {
            css: $css,
            extract: $crate::extraction::selector::Extract::NextSiblingText,
            filter: Some($crate::extraction::selector::TextFilter::Contains($needle)),
        }
    };
}

mod business;
mod professional;
mod social;

/// Counter phrases shared by the social schemas
pub(crate) const FOLLOWERS_SCAN: &str = r"(?i)\d[\d,.]*[kmb]?\s*followers";
pub(crate) const FOLLOWING_SCAN: &str = r"(?i)\d[\d,.]*[kmb]?\s*following";
pub(crate) const LIKES_SCAN: &str = r"(?i)\d[\d,.]*[kmb]?\s*likes";

/// Post-processing applied to a resolved value, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Sanitize,
    /// Remove a leading label matching the pattern
    StripLeadingLabel(&'static str),
    /// Keep the text before the first occurrence of the separator
    FirstSegment(&'static str),
    /// Keep the text before the first whitespace
    SplitHead,
    /// Keep the text after the first whitespace
    SplitTail,
}

/// One named field: ranked candidates, transforms, then derived fallbacks
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub candidates: &'static [Candidate],
    pub transforms: &'static [Transform],
    pub derived: &'static [Derivation],
}

impl FieldSpec {
    pub const BASE: FieldSpec = FieldSpec {
        name: "",
        candidates: &[],
        transforms: &[],
        derived: &[],
    };
}

/// Where the elements of a repeated sub-list come from
#[derive(Debug, Clone, Copy)]
pub enum ListSource {
    /// Container nodes (first productive candidate), each read with nested fields.
    /// Records where every `required` field is empty are dropped; an empty
    /// `required` list means at least one field must be filled.
    Records {
        containers: &'static [Candidate],
        fields: &'static [FieldSpec],
        required: &'static [&'static str],
    },
    /// Flat de-duplicated values of the first productive candidate
    Tags { candidates: &'static [Candidate] },
    /// A single `{day: label, hours: <match>}` record captured from an earlier field
    Status {
        field: &'static str,
        pattern: &'static str,
        label: &'static str,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct ListSpec {
    pub name: &'static str,
    pub source: ListSource,
    pub limit: Option<usize>,
}

/// Complete extraction table for one entity kind
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub kind: EntityKind,
    pub fields: &'static [FieldSpec],
    pub lists: &'static [ListSpec],
}

impl Schema {
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> {
        self.fields.iter().map(|field| field.name)
    }

    pub fn list(&self, name: &str) -> Option<&'static ListSpec> {
        self.lists.iter().find(|list| list.name == name)
    }
}

/// The table for an entity kind
pub fn schema_for(kind: EntityKind) -> &'static Schema {
    match kind {
        EntityKind::ProfessionalProfile => &professional::PROFILE,
        EntityKind::ProfessionalCompany => &professional::COMPANY,
        EntityKind::BusinessListing => &business::LISTING,
        EntityKind::SocialPage => &social::PAGE,
        EntityKind::SocialProfile => &social::PROFILE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::selector::compiled_selector;

    const ALL_KINDS: [EntityKind; 5] = [
        EntityKind::ProfessionalProfile,
        EntityKind::ProfessionalCompany,
        EntityKind::BusinessListing,
        EntityKind::SocialPage,
        EntityKind::SocialProfile,
    ];

    fn all_candidates(schema: &Schema) -> Vec<Candidate> {
        let mut out = Vec::new();
        for field in schema.fields {
            out.extend_from_slice(field.candidates);
        }
        for list in schema.lists {
            match list.source {
                ListSource::Records { containers, fields, .. } => {
                    out.extend_from_slice(containers);
                    for field in fields {
                        out.extend_from_slice(field.candidates);
                    }
                }
                ListSource::Tags { candidates } => out.extend_from_slice(candidates),
                ListSource::Status { .. } => {}
            }
        }
        out
    }

    #[test]
    fn test_every_selector_parses() {
        for kind in ALL_KINDS {
            for candidate in all_candidates(schema_for(kind)) {
                if !candidate.css.is_empty() {
                    assert!(
                        compiled_selector(candidate.css).is_some(),
                        "{}: invalid selector {}",
                        kind,
                        candidate.css
                    );
                }
            }
        }
    }

    #[test]
    fn test_schema_kinds_and_unique_field_names() {
        for kind in ALL_KINDS {
            let schema = schema_for(kind);
            assert_eq!(schema.kind, kind);

            let mut names: Vec<_> = schema.field_names().collect();
            let total = names.len();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), total, "duplicate field in {}", kind);
        }
    }

    #[test]
    fn test_declared_fields() {
        let profile: Vec<_> = schema_for(EntityKind::ProfessionalProfile).field_names().collect();
        assert_eq!(profile, vec!["name", "headline", "location", "about", "connections"]);

        let listing = schema_for(EntityKind::BusinessListing);
        assert!(listing.field_names().any(|name| name == "latitude"));
        assert_eq!(listing.list("reviews").and_then(|list| list.limit), Some(3));
        assert_eq!(listing.list("photos").and_then(|list| list.limit), Some(5));

        let page = schema_for(EntityKind::SocialPage);
        assert_eq!(page.list("posts").and_then(|list| list.limit), Some(5));
    }
}
