use super::{FieldSpec, ListSource, ListSpec, Schema, Transform, FOLLOWERS_SCAN, FOLLOWING_SCAN, LIKES_SCAN};
use crate::extraction::derive::Derivation;
use crate::extraction::selector::Candidate;
use crate::platform::EntityKind;

/// Intro card holding a page's about text, category and contact details
const INTRO_SPAN: &str = ".xieb3on span";
const USERNAME: &str = r"facebook\.com/([^/?#]+)";
const STATUS: &str = r"(Closed now|Open now|Open \d+:\d+)";

const NAME_CANDIDATES: &[Candidate] = &[
    text!("h1[data-testid=\"page_name\"]"),
    text!("h1[data-testid=\"profile_name_in_profile_page\"]"),
    text!("h1[data-testid=\"profile_name\"]"),
    text!("h1"),
    text!("title"),
    attr!("meta[property=\"og:title\"]", "content"),
];

const POST_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "content",
        candidates: &[
            text!("[data-ad-preview=\"message\"]"),
            text!("[data-testid=\"post_message\"]"),
            text!("div[dir=\"auto\"]"),
        ],
        ..FieldSpec::BASE
    },
    FieldSpec {
        name: "date",
        candidates: &[
            text!("[data-testid=\"story-time\"]"),
            attr!("abbr[title]", "title"),
            text!("a[role=\"link\"] span", matches r"^\d+\s*[smhdwy]$"),
        ],
        ..FieldSpec::BASE
    },
    FieldSpec {
        name: "likes",
        derived: &[Derivation::TextScan {
            pattern: r"(?i)\d[\d,.]*[kmb]?\s*(?:likes|reactions)",
        }],
        ..FieldSpec::BASE
    },
    FieldSpec {
        name: "comments",
        derived: &[Derivation::TextScan {
            pattern: r"(?i)\d[\d,.]*[kmb]?\s*comments?",
        }],
        ..FieldSpec::BASE
    },
    FieldSpec {
        name: "shares",
        derived: &[Derivation::TextScan {
            pattern: r"(?i)\d[\d,.]*[kmb]?\s*shares?",
        }],
        ..FieldSpec::BASE
    },
];

const POSTS: ListSpec = ListSpec {
    name: "posts",
    source: ListSource::Records {
        containers: &[
            text!("[role=\"article\"]"),
            text!("[data-pagelet^=\"FeedUnit\"]"),
            text!("[data-testid=\"post\"]"),
        ],
        fields: POST_FIELDS,
        required: &["content"],
    },
    limit: Some(5),
};

pub static PAGE: Schema = Schema {
    kind: EntityKind::SocialPage,
    fields: &[
        FieldSpec {
            name: "name",
            candidates: &[
                text!("h1[data-testid=\"page_name\"]"),
                text!("h1"),
                text!("title"),
                attr!("meta[property=\"og:title\"]", "content"),
            ],
            transforms: &[Transform::FirstSegment(" | ")],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "description",
            candidates: &[text!(INTRO_SPAN)],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "category",
            candidates: &[parent_text!(".xieb3on strong")],
            transforms: &[Transform::StripLeadingLabel(r"(?i)^Page\s*·\s*")],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "address",
            candidates: &[text!("[data-testid=\"page_address\"]")],
            derived: &[
                Derivation::Capture {
                    field: "description",
                    pattern: r"([^,]+,\s*[^,]+,\s*[^,]+,\s*[^,]+)",
                    group: 1,
                },
                Derivation::Capture {
                    field: "description",
                    pattern: r"([A-Za-z\s]+,\s*[A-Za-z\s]+)",
                    group: 1,
                },
            ],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "phone",
            candidates: &[
                text!(INTRO_SPAN, matches r"^\+?\d{3,}"),
                text!("a[href^=\"tel:\"]"),
            ],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "website",
            candidates: &[attr!(".xieb3on a[href]", "href")],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "email",
            candidates: &[text!(INTRO_SPAN, contains "@"), text!("a[href^=\"mailto:\"]")],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "rating",
            derived: &[
                Derivation::Capture {
                    field: "description",
                    pattern: r"(\d+%\s*recommend)",
                    group: 1,
                },
                Derivation::TextScan {
                    pattern: r"(?i)\d+%\s*recommend",
                },
            ],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "reviewCount",
            derived: &[Derivation::TextScan {
                pattern: r"(?i)\d[\d,.]*[kmb]?\s*reviews?",
            }],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "likes",
            derived: &[
                Derivation::Capture {
                    field: "description",
                    pattern: r"[\d,]+\s*likes",
                    group: 0,
                },
                Derivation::TextScan { pattern: LIKES_SCAN },
            ],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "followers",
            derived: &[
                Derivation::Capture {
                    field: "description",
                    pattern: r"[\d,]+[KMB]?\s*followers",
                    group: 0,
                },
                Derivation::TextScan { pattern: FOLLOWERS_SCAN },
            ],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "checkins",
            derived: &[Derivation::TextScan {
                pattern: r"(?i)\d[\d,.]*[kmb]?\s*(?:check-ins|were here)",
            }],
            ..FieldSpec::BASE
        },
    ],
    lists: &[
        ListSpec {
            name: "hours",
            source: ListSource::Status {
                field: "description",
                pattern: STATUS,
                label: "Status",
            },
            limit: None,
        },
        POSTS,
    ],
};

pub static PROFILE: Schema = Schema {
    kind: EntityKind::SocialProfile,
    fields: &[
        FieldSpec {
            name: "name",
            candidates: NAME_CANDIDATES,
            transforms: &[Transform::FirstSegment(" | ")],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "username",
            derived: &[Derivation::UrlCapture {
                pattern: USERNAME,
                group: 1,
            }],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "bio",
            candidates: &[
                text!("[data-testid=\"profile_bio\"]"),
                text!(".profile_bio"),
                attr!("meta[property=\"og:description\"]", "content"),
            ],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "location",
            candidates: &[
                text!("[data-testid=\"profile_location\"]"),
                text!(".profile_location"),
                text!("span", contains "Lives in"),
            ],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "website",
            candidates: &[
                attr!("[data-testid=\"profile_about_section\"] a[href^=\"http\"]", "href"),
                attr!(".profile_website a", "href"),
                attr!(
                    "a[href^=\"http\"]:not([href*=\"facebook.com\"]):not([href*=\"maps.google.com\"])",
                    "href"
                ),
            ],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "followers",
            candidates: &[text!("[data-testid=\"profile_followers_count\"]")],
            derived: &[Derivation::TextScan { pattern: FOLLOWERS_SCAN }],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "following",
            candidates: &[text!("[data-testid=\"profile_following_count\"]")],
            derived: &[Derivation::TextScan { pattern: FOLLOWING_SCAN }],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "work",
            candidates: &[text!("[data-testid=\"profile_work\"]"), text!("span", contains "Works at")],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "education",
            candidates: &[text!("[data-testid=\"profile_education\"]"), text!("span", contains "Studied at")],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "relationship",
            candidates: &[
                text!("[data-testid=\"profile_relationship\"]"),
                text!("span", contains "Relationship"),
                text!("span", matches r"^(Single|Married|In a relationship|Engaged)"),
            ],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "hometown",
            candidates: &[text!("span", contains "From "), text!("[data-testid=\"profile_location\"]")],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "email",
            candidates: &[text!("a[href^=\"mailto:\"]")],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "phone",
            candidates: &[text!("a[href^=\"tel:\"]")],
            ..FieldSpec::BASE
        },
    ],
    lists: &[POSTS],
};
