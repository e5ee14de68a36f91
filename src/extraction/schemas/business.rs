use super::{FieldSpec, ListSource, ListSpec, Schema, Transform};
use crate::extraction::derive::Derivation;
use crate::platform::EntityKind;

/// `@lat,lng` segment of a maps URL
const COORDINATES: &str = r"@(-?\d+\.\d+),(-?\d+\.\d+)";

pub static LISTING: Schema = Schema {
    kind: EntityKind::BusinessListing,
    fields: &[
        FieldSpec {
            name: "name",
            candidates: &[
                text!("h1[data-attrid=\"title\"]"),
                text!("[data-test-id=\"business-name\"]"),
                text!("h1.DUwDvf"),
                text!("h1"),
            ],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "category",
            candidates: &[
                text!("[data-test-id=\"business-category\"]"),
                text!("button[jsaction*=\"category\"]"),
                text!("[jsaction*=\"category\"]"),
            ],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "address",
            candidates: &[
                text!("[data-test-id=\"address\"]"),
                text!("[data-item-id=\"address\"]"),
            ],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "phone",
            candidates: &[
                text!("[data-test-id=\"phone\"]"),
                text!("a[href^=\"tel:\"]"),
                attr!("a[href^=\"tel:\"]", "href"),
            ],
            transforms: &[Transform::StripLeadingLabel(r"^tel:")],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "website",
            candidates: &[
                attr!("[data-test-id=\"website\"]", "href"),
                attr!("a[data-value=\"Website\"]", "href"),
                attr!("a[data-item-id=\"authority\"]", "href"),
            ],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "rating",
            candidates: &[
                text!("[data-test-id=\"rating\"]"),
                text!(".fontDisplayLarge"),
            ],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "reviewCount",
            candidates: &[
                text!("[data-test-id=\"review-count\"]"),
                text!(".fontBodyMedium", contains "reviews"),
            ],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "priceRange",
            candidates: &[
                text!("[data-test-id=\"price-range\"]"),
                text!(".fontBodyMedium", matches r"^\${1,4}$"),
            ],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "description",
            candidates: &[
                text!("[data-test-id=\"description\"]"),
                next_text!(".fontBodyMedium", contains "About"),
            ],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "latitude",
            derived: &[Derivation::UrlCapture {
                pattern: COORDINATES,
                group: 1,
            }],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "longitude",
            derived: &[Derivation::UrlCapture {
                pattern: COORDINATES,
                group: 2,
            }],
            ..FieldSpec::BASE
        },
    ],
    lists: &[
        ListSpec {
            name: "hours",
            source: ListSource::Records {
                containers: &[
                    text!("[data-test-id=\"hours\"] .fontBodyMedium", contains ":"),
                    text!("[data-test-id=\"hours\"] li", contains ":"),
                ],
                fields: &[
                    FieldSpec {
                        name: "day",
                        candidates: &[text!("")],
                        transforms: &[Transform::SplitHead],
                        ..FieldSpec::BASE
                    },
                    FieldSpec {
                        name: "hours",
                        candidates: &[text!("")],
                        transforms: &[Transform::SplitTail],
                        ..FieldSpec::BASE
                    },
                ],
                required: &["day"],
            },
            limit: None,
        },
        ListSpec {
            name: "reviews",
            source: ListSource::Records {
                containers: &[text!("[data-test-id=\"review\"]"), text!("div.jftiEf")],
                fields: &[
                    FieldSpec {
                        name: "author",
                        candidates: &[text!("[data-test-id=\"review-author\"]"), text!(".d4r55")],
                        ..FieldSpec::BASE
                    },
                    FieldSpec {
                        name: "rating",
                        candidates: &[
                            text!("[data-test-id=\"review-rating\"]"),
                            attr!("span.kvMYJc", "aria-label"),
                        ],
                        ..FieldSpec::BASE
                    },
                    FieldSpec {
                        name: "text",
                        candidates: &[text!("[data-test-id=\"review-text\"]"), text!(".wiI7pd")],
                        ..FieldSpec::BASE
                    },
                    FieldSpec {
                        name: "date",
                        candidates: &[text!("[data-test-id=\"review-date\"]"), text!(".rsqaWe")],
                        ..FieldSpec::BASE
                    },
                ],
                required: &["author"],
            },
            limit: Some(3),
        },
        ListSpec {
            name: "amenities",
            source: ListSource::Tags {
                candidates: &[text!("[data-test-id=\"amenity\"]")],
            },
            limit: None,
        },
        ListSpec {
            name: "photos",
            source: ListSource::Tags {
                candidates: &[attr!("img[src*=\"googleusercontent\"]", "src")],
            },
            limit: Some(5),
        },
    ],
};
