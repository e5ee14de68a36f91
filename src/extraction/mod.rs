//! Field extraction: static schema tables evaluated against a parsed document.
//!
//! Extraction never fails. A field no candidate can fill comes back empty and
//! the caller decides whether that matters.

use scraper::Html;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod derive;
pub mod sanitize;
pub mod schemas;
pub mod selector;

use crate::platform::EntityKind;
use derive::DeriveContext;
use schemas::{FieldSpec, ListSource, ListSpec, Schema, Transform};
use selector::{compiled_regex, resolve, resolve_all, QueryScope};

pub use sanitize::sanitize;
pub use schemas::schema_for;

/// One element of a structured sub-list
pub type Record = BTreeMap<String, String>;

/// A repeated sub-structure of an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubList {
    Records(Vec<Record>),
    Tags(Vec<String>),
}

impl SubList {
    pub fn len(&self) -> usize {
        match self {
            SubList::Records(records) => records.len(),
            SubList::Tags(tags) => tags.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything extracted from one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedEntity {
    pub kind: EntityKind,
    pub source_url: String,
    pub extracted_at: String,
    /// Set when the identifying field could not be extracted
    #[serde(default)]
    pub partial: bool,
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub lists: BTreeMap<String, SubList>,
}

impl ExtractedEntity {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            source_url: String::new(),
            extracted_at: String::new(),
            partial: false,
            fields: BTreeMap::new(),
            lists: BTreeMap::new(),
        }
    }

    /// Field value, empty when missing
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn name(&self) -> &str {
        self.field("name")
    }

    pub fn records(&self, list: &str) -> &[Record] {
        match self.lists.get(list) {
            Some(SubList::Records(records)) => records,
            _ => &[],
        }
    }

    pub fn tags(&self, list: &str) -> &[String] {
        match self.lists.get(list) {
            Some(SubList::Tags(tags)) => tags,
            _ => &[],
        }
    }
}

/// Extract an entity from `document` using `schema`.
///
/// Pure and deterministic: the same document and schema always give the same
/// entity. `source_url` and `extracted_at` are left for the caller to stamp.
pub fn extract(document: &Html, schema: &Schema) -> ExtractedEntity {
    extract_with(document, schema, None)
}

/// Like [`extract`], also evaluating URL-derived fields and recording the URL
pub fn extract_page(document: &Html, schema: &Schema, url: &str) -> ExtractedEntity {
    let mut entity = extract_with(document, schema, Some(url));
    entity.source_url = url.to_string();
    entity
}

fn extract_with(document: &Html, schema: &Schema, url: Option<&str>) -> ExtractedEntity {
    let mut entity = ExtractedEntity::new(schema.kind);
    entity.fields = extract_fields(document, schema.fields, url);

    for list in schema.lists {
        let mut values = extract_list(document, list, &entity.fields);
        if let Some(limit) = list.limit {
            truncate(&mut values, limit);
        }
        entity.lists.insert(list.name.to_string(), values);
    }

    entity
}

/// Resolve every field of `specs` against `scope`; later fields may derive from earlier ones
fn extract_fields<S: QueryScope + ?Sized>(scope: &S, specs: &[FieldSpec], url: Option<&str>) -> Record {
    let ctx = DeriveContext::new(scope, url);
    let mut fields = Record::new();

    for spec in specs {
        let value = resolve(scope, spec.candidates)
            .map(|raw| apply_transforms(raw, spec.transforms))
            .filter(|value| !value.is_empty())
            .or_else(|| ctx.first(spec.derived, &fields))
            .unwrap_or_default();
        fields.insert(spec.name.to_string(), value);
    }

    fields
}

fn extract_list(document: &Html, list: &ListSpec, fields: &Record) -> SubList {
    match list.source {
        ListSource::Records {
            containers,
            fields: specs,
            required,
        } => {
            let nodes = containers
                .iter()
                .map(|candidate| candidate.matches(document))
                .find(|nodes| !nodes.is_empty())
                .unwrap_or_default();

            let records = nodes
                .iter()
                .map(|node| extract_fields(node, specs, None))
                .filter(|record| keeps_record(record, required))
                .collect();
            SubList::Records(records)
        }
        ListSource::Tags { candidates } => SubList::Tags(resolve_all(document, candidates)),
        ListSource::Status { field, pattern, label } => {
            let status = fields
                .get(field)
                .zip(compiled_regex(pattern))
                .and_then(|(text, regex)| regex.find(text).map(|m| m.as_str().to_string()));

            let records = status
                .map(|hours| {
                    let mut record = Record::new();
                    record.insert("day".to_string(), label.to_string());
                    record.insert("hours".to_string(), hours);
                    vec![record]
                })
                .unwrap_or_default();
            SubList::Records(records)
        }
    }
}

fn keeps_record(record: &Record, required: &[&str]) -> bool {
    let filled = |name: &str| record.get(name).map(|v| !v.is_empty()).unwrap_or(false);
    if required.is_empty() {
        record.values().any(|value| !value.is_empty())
    } else {
        required.iter().any(|name| filled(name))
    }
}

fn truncate(list: &mut SubList, limit: usize) {
    match list {
        SubList::Records(records) => records.truncate(limit),
        SubList::Tags(tags) => tags.truncate(limit),
    }
}

fn apply_transforms(value: String, transforms: &[Transform]) -> String {
    transforms
        .iter()
        .fold(value, |acc, transform| apply_transform(&acc, transform))
}

fn apply_transform(value: &str, transform: &Transform) -> String {
    match *transform {
        Transform::Sanitize => sanitize(value),
        Transform::StripLeadingLabel(pattern) => match compiled_regex(pattern) {
            Some(regex) => regex.replace(value, "").trim().to_string(),
            None => value.to_string(),
        },
        Transform::FirstSegment(separator) => value
            .split(separator)
            .next()
            .unwrap_or(value)
            .trim()
            .to_string(),
        Transform::SplitHead => value
            .split_once(char::is_whitespace)
            .map(|(head, _)| head)
            .unwrap_or(value)
            .trim()
            .to_string(),
        Transform::SplitTail => value
            .split_once(char::is_whitespace)
            .map(|(_, tail)| tail.trim().to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use selector::{Candidate, Extract};

    const PRIORITY: Schema = Schema {
        kind: EntityKind::ProfessionalCompany,
        fields: &[FieldSpec {
            name: "name",
            candidates: &[
                Candidate {
                    css: "h1.first",
                    extract: Extract::Text,
                    filter: None,
                },
                Candidate {
                    css: "h2.second",
                    extract: Extract::Text,
                    filter: None,
                },
                Candidate {
                    css: ".third",
                    extract: Extract::Text,
                    filter: None,
                },
            ],
            ..FieldSpec::BASE
        }],
        lists: &[],
    };

    #[test]
    fn test_nth_candidate_match_is_used() {
        let doc = Html::parse_document(
            r#"<html><body><h2 class="other">Nope</h2><div class="third">Acme Corp</div></body></html>"#,
        );
        let entity = extract(&doc, &PRIORITY);
        assert_eq!(entity.name(), "Acme Corp");
        assert_eq!(entity.kind, EntityKind::ProfessionalCompany);
    }

    #[test]
    fn test_missing_fields_are_empty_not_errors() {
        let doc = Html::parse_document("<html><body><p>nothing here</p></body></html>");
        let entity = extract(&doc, schema_for(EntityKind::ProfessionalProfile));

        assert_eq!(entity.name(), "");
        assert_eq!(entity.field("headline"), "");
        assert!(entity.records("experience").is_empty());
        assert!(entity.tags("skills").is_empty());
        assert!(entity.lists.contains_key("recommendations"));
    }

    #[test]
    fn test_profile_extraction() {
        let doc = Html::parse_document(
            r#"<html><body>
            <h1 class="text-heading-xlarge">Jane Doe</h1>
            <div class="text-body-medium break-words">Staff Engineer at Acme</div>
            <span class="text-body-small inline t-black--light break-words">Sign in to view. San Francisco, CA. Join now for more.</span>
            <span class="t-16 t-black t-bold">Follow</span>
            <span class="t-16 t-black t-bold">500+ connections</span>
            <section id="experience-section">
              <ul class="pvs-list__container">
                <li><span data-field="title">Staff Engineer</span><span data-field="company">Acme</span><span data-field="duration">2020 - Present</span></li>
                <li><span data-field="company">Initech</span></li>
                <li><span class="noise">no primary fields</span></li>
              </ul>
            </section>
            <section id="skills"></section>
            <div class="skills-section">
              <span class="pv-skill-category-entity__name">Rust</span>
              <span class="pv-skill-category-entity__name">Go</span>
              <span class="pv-skill-category-entity__name">Rust</span>
            </div>
            </body></html>"#,
        );

        let entity = extract(&doc, schema_for(EntityKind::ProfessionalProfile));
        assert_eq!(entity.name(), "Jane Doe");
        assert_eq!(entity.field("headline"), "Staff Engineer at Acme");
        assert_eq!(entity.field("location"), "San Francisco, CA.");
        assert_eq!(entity.field("connections"), "500+ connections");

        let experience = entity.records("experience");
        assert_eq!(experience.len(), 2);
        assert_eq!(experience[0]["title"], "Staff Engineer");
        assert_eq!(experience[0]["duration"], "2020 - Present");
        assert_eq!(experience[1]["company"], "Initech");
        assert_eq!(experience[1]["title"], "");

        assert_eq!(entity.tags("skills"), ["Rust".to_string(), "Go".to_string()]);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let html = r#"<html><head><title>Blue Bottle | Maps</title></head><body>
            <h1 class="DUwDvf">Blue Bottle Coffee</h1>
            <div data-test-id="review"><span data-test-id="review-author">Ann</span></div>
            <img src="https://lh5.googleusercontent.com/p/a.jpg">
            </body></html>"#;
        let doc = Html::parse_document(html);
        let schema = schema_for(EntityKind::BusinessListing);

        let first = extract(&doc, schema);
        let second = extract(&doc, schema);
        assert_eq!(first, second);

        let reparsed = extract(&Html::parse_document(html), schema);
        assert_eq!(first, reparsed);
    }

    #[test]
    fn test_business_listing_with_url_fields() {
        let doc = Html::parse_document(
            r#"<html><body>
            <h1 data-attrid="title">Blue Bottle Coffee</h1>
            <div data-test-id="hours">
              <div class="fontBodyMedium">Monday 7:00 AM–6:00 PM</div>
              <div class="fontBodyMedium">Closed on holidays</div>
              <div class="fontBodyMedium">Tuesday 7:00 AM–6:00 PM</div>
            </div>
            <div data-test-id="review"><span data-test-id="review-author">A</span><span data-test-id="review-text">Great</span></div>
            <div data-test-id="review"><span data-test-id="review-text">anonymous</span></div>
            <div data-test-id="review"><span data-test-id="review-author">B</span></div>
            <div data-test-id="review"><span data-test-id="review-author">C</span></div>
            <div data-test-id="review"><span data-test-id="review-author">D</span></div>
            <span data-test-id="amenity">Wi-Fi</span><span data-test-id="amenity">Outdoor seating</span>
            </body></html>"#,
        );
        let url = "https://www.google.com/maps/place/Blue+Bottle/@37.7763,-122.4233,17z";
        let entity = extract_page(&doc, schema_for(EntityKind::BusinessListing), url);

        assert_eq!(entity.source_url, url);
        assert_eq!(entity.field("latitude"), "37.7763");
        assert_eq!(entity.field("longitude"), "-122.4233");

        let hours = entity.records("hours");
        assert_eq!(hours.len(), 2);
        assert_eq!(hours[0]["day"], "Monday");
        assert_eq!(hours[0]["hours"], "7:00 AM–6:00 PM");

        let reviews = entity.records("reviews");
        assert_eq!(reviews.len(), 3);
        assert_eq!(
            reviews.iter().map(|r| r["author"].as_str()).collect::<Vec<_>>(),
            vec!["A", "B", "C"]
        );

        assert_eq!(entity.tags("amenities").len(), 2);

        let without_url = extract(&doc, schema_for(EntityKind::BusinessListing));
        assert_eq!(without_url.field("latitude"), "");
    }

    #[test]
    fn test_social_page_derived_fields() {
        let doc = Html::parse_document(
            r#"<html><head><title>Acme Coffee | Facebook</title></head><body>
            <div class="xieb3on">
              <span>Neighbourhood roastery. 97% recommend (120 Reviews). Open now</span>
              <div><strong>Page</strong> · Coffee shop</div>
              <span>022 1234 5678</span>
              <span>hello@acme.example</span>
              <a href="https://acme.example">acme.example</a>
            </div>
            <div><span>12,400 likes</span><span>13K followers</span><span>850 were here</span></div>
            </body></html>"#,
        );
        let url = "https://www.facebook.com/acmecoffee";
        let entity = extract_page(&doc, schema_for(EntityKind::SocialPage), url);

        assert_eq!(entity.name(), "Acme Coffee");
        assert_eq!(entity.field("category"), "Coffee shop");
        assert_eq!(entity.field("phone"), "022 1234 5678");
        assert_eq!(entity.field("email"), "hello@acme.example");
        assert_eq!(entity.field("website"), "https://acme.example");
        assert_eq!(entity.field("rating"), "97% recommend");
        assert_eq!(entity.field("likes"), "12,400 likes");
        assert_eq!(entity.field("followers"), "13K followers");
        assert_eq!(entity.field("checkins"), "850 were here");

        let hours = entity.records("hours");
        assert_eq!(hours.len(), 1);
        assert_eq!(hours[0]["day"], "Status");
        assert_eq!(hours[0]["hours"], "Open now");
    }

    #[test]
    fn test_social_profile_username_from_url() {
        let doc = Html::parse_document(
            r#"<html><body><h1>Jamie Lee</h1><span>Works at Acme</span><span>1,024 followers</span></body></html>"#,
        );
        let entity = extract_page(
            &doc,
            schema_for(EntityKind::SocialProfile),
            "https://www.facebook.com/jamie.lee?ref=bookmarks",
        );

        assert_eq!(entity.field("username"), "jamie.lee");
        assert_eq!(entity.field("work"), "Works at Acme");
        assert_eq!(entity.field("followers"), "1,024 followers");
        assert_eq!(entity.field("relationship"), "");
    }

    #[test]
    fn test_transforms() {
        assert_eq!(apply_transform("Page · Bakery", &Transform::StripLeadingLabel(r"(?i)^Page\s*·\s*")), "Bakery");
        assert_eq!(apply_transform("Acme | Facebook", &Transform::FirstSegment(" | ")), "Acme");
        assert_eq!(apply_transform("Monday 9 AM–5 PM", &Transform::SplitHead), "Monday");
        assert_eq!(apply_transform("Monday 9 AM–5 PM", &Transform::SplitTail), "9 AM–5 PM");
        assert_eq!(apply_transform("Monday", &Transform::SplitTail), "");
    }

    #[test]
    fn test_entity_serde_roundtrip() {
        let doc = Html::parse_document(r#"<h1 data-attrid="title">Blue Bottle</h1><span data-test-id="amenity">Wi-Fi</span>"#);
        let mut entity = extract(&doc, schema_for(EntityKind::BusinessListing));
        entity.extracted_at = "2026-01-01T00:00:00Z".to_string();

        let json = serde_json::to_value(&entity).expect("serialize");
        assert_eq!(json["kind"], "business-listing");
        assert_eq!(json["fields"]["name"], "Blue Bottle");
        assert_eq!(json["lists"]["amenities"][0], "Wi-Fi");

        let parsed: ExtractedEntity = serde_json::from_value(json).expect("parse");
        assert_eq!(parsed.tags("amenities"), ["Wi-Fi".to_string()]);
        assert_eq!(parsed.extracted_at, entity.extracted_at);
    }
}
