//! Flattening of extracted entities into spreadsheet rows.
//!
//! Each entity yields one primary row followed by one row per sub-list
//! element (or one aggregate row for tag lists). Every row repeats the
//! entity's Platform, Name, URL and "Extracted At" columns.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::extraction::ExtractedEntity;
use crate::platform::{EntityKind, Platform};

pub const COL_PLATFORM: &str = "Platform";
pub const COL_TYPE: &str = "Type";
pub const COL_NAME: &str = "Name";
pub const COL_URL: &str = "URL";
pub const COL_EXTRACTED_AT: &str = "Extracted At";

/// One spreadsheet cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Text(String),
    Number(i64),
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text),
            CellValue::Number(_) => None,
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Text(text) => f.write_str(text),
            CellValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<usize> for CellValue {
    fn from(value: usize) -> Self {
        CellValue::Number(value as i64)
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Text(text) => serializer.serialize_str(text),
            CellValue::Number(n) => serializer.serialize_i64(*n),
        }
    }
}

/// Ordered column → cell mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabularRow {
    cells: Vec<(String, CellValue)>,
}

impl TabularRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cell; a repeated column overwrites in place
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<CellValue>) {
        let column = column.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(name, _)| *name == column) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((column, value)),
        }
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.push(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Text of a column; numbers and missing columns read as empty
    pub fn text(&self, column: &str) -> &str {
        self.get(column).and_then(CellValue::as_text).unwrap_or("")
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn cells(&self) -> &[(String, CellValue)] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Serialize for TabularRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (column, value) in &self.cells {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Where a column's value comes from
#[derive(Debug, Clone, Copy)]
enum Source {
    Field(&'static str),
    /// Field value, or the fallback when empty
    FieldOr(&'static str, &'static str),
    /// Two fields joined with ", "
    Pair(&'static str, &'static str),
}

#[derive(Debug, Clone, Copy)]
struct Column {
    header: &'static str,
    source: Source,
}

const fn col(header: &'static str, field: &'static str) -> Column {
    Column {
        header,
        source: Source::Field(field),
    }
}

const fn col_or(header: &'static str, field: &'static str, fallback: &'static str) -> Column {
    Column {
        header,
        source: Source::FieldOr(field, fallback),
    }
}

/// How one sub-list becomes rows
#[derive(Debug, Clone, Copy)]
enum Shape {
    /// One row per record, with a 1-based "<row type> #" column
    PerRecord(&'static [Column]),
    /// One row per tag under `header`
    PerTag(&'static str),
    /// A single row of comma-joined tags plus a count column
    Aggregate {
        header: &'static str,
        count_header: &'static str,
    },
}

#[derive(Debug, Clone, Copy)]
struct SubLayout {
    list: &'static str,
    row_type: &'static str,
    shape: Shape,
}

/// Row layout for one entity kind
#[derive(Debug, Clone, Copy)]
struct Layout {
    columns: &'static [Column],
    sublists: &'static [SubLayout],
}

const HOURS: SubLayout = SubLayout {
    list: "hours",
    row_type: "Hours",
    shape: Shape::PerRecord(&[col("Day", "day"), col("Hours", "hours")]),
};

const POSTS: SubLayout = SubLayout {
    list: "posts",
    row_type: "Post",
    shape: Shape::PerRecord(&[
        col("Post Content", "content"),
        col("Post Date", "date"),
        col("Post Likes", "likes"),
        col("Post Comments", "comments"),
        col("Post Shares", "shares"),
    ]),
};

const PROFILE: Layout = Layout {
    columns: &[
        col("Headline", "headline"),
        col("Location", "location"),
        col("Connections", "connections"),
        col("About", "about"),
    ],
    sublists: &[
        SubLayout {
            list: "experience",
            row_type: "Experience",
            shape: Shape::PerRecord(&[
                col("Job Title", "title"),
                col("Company", "company"),
                col("Duration", "duration"),
                col("Description", "description"),
            ]),
        },
        SubLayout {
            list: "education",
            row_type: "Education",
            shape: Shape::PerRecord(&[
                col("School", "school"),
                col("Degree", "degree"),
                col("Field", "field"),
                col("Years", "years"),
            ]),
        },
        SubLayout {
            list: "skills",
            row_type: "Skills",
            shape: Shape::Aggregate {
                header: "Skills",
                count_header: "Skills Count",
            },
        },
        SubLayout {
            list: "languages",
            row_type: "Language",
            shape: Shape::PerTag("Language"),
        },
        SubLayout {
            list: "recommendations",
            row_type: "Recommendation",
            shape: Shape::PerRecord(&[
                col("Recommendation Author", "author"),
                col("Recommendation Text", "text"),
            ]),
        },
    ],
};

const COMPANY: Layout = Layout {
    columns: &[
        col("Industry", "industry"),
        col("Size", "size"),
        col("Location", "location"),
        col("Website", "website"),
        col("Followers", "followers"),
        col("About", "about"),
    ],
    sublists: &[],
};

const BUSINESS: Layout = Layout {
    columns: &[
        col("Category", "category"),
        col("Address", "address"),
        col("Phone", "phone"),
        col("Website", "website"),
        col("Rating", "rating"),
        col("Review Count", "reviewCount"),
        col("Price Range", "priceRange"),
        col("Description", "description"),
        Column {
            header: "Coordinates",
            source: Source::Pair("latitude", "longitude"),
        },
    ],
    sublists: &[
        HOURS,
        SubLayout {
            list: "reviews",
            row_type: "Review",
            shape: Shape::PerRecord(&[
                col("Review Author", "author"),
                col("Review Rating", "rating"),
                col("Review Text", "text"),
                col("Review Date", "date"),
            ]),
        },
        SubLayout {
            list: "amenities",
            row_type: "Amenities",
            shape: Shape::Aggregate {
                header: "Amenities",
                count_header: "Amenities Count",
            },
        },
    ],
};

const PAGE: Layout = Layout {
    columns: &[
        col("Category", "category"),
        col("Description", "description"),
        col("Address", "address"),
        col("Phone", "phone"),
        col("Website", "website"),
        col("Email", "email"),
        col("Rating", "rating"),
        col("Review Count", "reviewCount"),
        col("Likes", "likes"),
        col("Followers", "followers"),
        col("Check-ins", "checkins"),
    ],
    sublists: &[HOURS, POSTS],
};

const SOCIAL_PROFILE: Layout = Layout {
    columns: &[
        col("Username", "username"),
        col("Bio", "bio"),
        col("Location", "location"),
        col("Website", "website"),
        col("Followers", "followers"),
        col("Following", "following"),
        col_or("Work", "work", "N/A"),
        col_or("Education", "education", "N/A"),
        col_or("Relationship", "relationship", "N/A"),
        col_or("Hometown", "hometown", "N/A"),
        col_or("Email", "email", "N/A"),
        col_or("Phone", "phone", "N/A"),
    ],
    sublists: &[POSTS],
};

fn layout_for(kind: EntityKind) -> &'static Layout {
    match kind {
        EntityKind::ProfessionalProfile => &PROFILE,
        EntityKind::ProfessionalCompany => &COMPANY,
        EntityKind::BusinessListing => &BUSINESS,
        EntityKind::SocialPage => &PAGE,
        EntityKind::SocialProfile => &SOCIAL_PROFILE,
    }
}

fn read(source: Source, value: impl Fn(&str) -> String) -> String {
    match source {
        Source::Field(field) => value(field),
        Source::FieldOr(field, fallback) => {
            let v = value(field);
            if v.is_empty() {
                fallback.to_string()
            } else {
                v
            }
        }
        Source::Pair(first, second) => {
            let (a, b) = (value(first), value(second));
            if a.is_empty() && b.is_empty() {
                String::new()
            } else {
                format!("{}, {}", a, b)
            }
        }
    }
}

/// Flatten one entity into rows: the primary row first, then sub-list rows in layout order
pub fn project(entity: &ExtractedEntity, platform_tag: &str) -> Vec<TabularRow> {
    let layout = layout_for(entity.kind);

    // Columns every row of this entity starts with, and ends with
    let head = |row_type: &str| {
        TabularRow::new()
            .with(COL_PLATFORM, platform_tag)
            .with(COL_TYPE, row_type)
            .with(COL_NAME, entity.name())
    };
    let tail = |row: TabularRow| {
        row.with(COL_URL, entity.source_url.as_str())
            .with(COL_EXTRACTED_AT, entity.extracted_at.as_str())
    };

    let mut primary = head(entity.kind.type_label());
    for column in layout.columns {
        primary.push(column.header, read(column.source, |f| entity.field(f).to_string()));
    }
    let mut rows = vec![tail(primary)];

    for sub in layout.sublists {
        let index_header = format!("{} #", sub.row_type);
        match sub.shape {
            Shape::PerRecord(columns) => {
                for (index, record) in entity.records(sub.list).iter().enumerate() {
                    let mut row = head(sub.row_type);
                    for column in columns {
                        row.push(
                            column.header,
                            read(column.source, |f| record.get(f).cloned().unwrap_or_default()),
                        );
                    }
                    row.push(index_header.as_str(), index + 1);
                    rows.push(tail(row));
                }
            }
            Shape::PerTag(header) => {
                for (index, tag) in entity.tags(sub.list).iter().enumerate() {
                    let row = head(sub.row_type)
                        .with(header, tag.as_str())
                        .with(index_header.as_str(), index + 1);
                    rows.push(tail(row));
                }
            }
            Shape::Aggregate { header, count_header } => {
                let tags = entity.tags(sub.list);
                if !tags.is_empty() {
                    let row = head(sub.row_type)
                        .with(header, tags.join(", "))
                        .with(count_header, tags.len());
                    rows.push(tail(row));
                }
            }
        }
    }

    rows
}

/// Metric/Value rows describing a concatenated row set
pub fn summarize(rows: &[TabularRow], exported_at: &str) -> Vec<TabularRow> {
    let count = |tag: &str| rows.iter().filter(|row| row.text(COL_PLATFORM) == tag).count();
    let metric = |name: &str, value: CellValue| TabularRow::new().with("Metric", name).with("Value", value);

    vec![
        metric("Total Records", rows.len().into()),
        metric("LinkedIn Records", count(Platform::LinkedIn.display_tag()).into()),
        metric(
            "Google Business Records",
            count(Platform::GoogleBusiness.display_tag()).into(),
        ),
        metric("Facebook Records", count(Platform::Facebook.display_tag()).into()),
        metric("Export Date", exported_at.into()),
    ]
}
