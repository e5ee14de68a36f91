use super::{FieldSpec, ListSource, ListSpec, Schema, Transform};
use crate::platform::EntityKind;

const SPAN: &str = "span[aria-hidden='true']";
const BOLD_SPAN: &str = ".hoverable-link-text.t-bold span[aria-hidden='true']";
const CAPTION_SPAN: &str = ".pvs-entity__caption-wrapper span[aria-hidden='true']";

pub static PROFILE: Schema = Schema {
    kind: EntityKind::ProfessionalProfile,
    fields: &[
        FieldSpec {
            name: "name",
            candidates: &[
                text!("h1.inline.t-24.v-align-middle.break-words"),
                text!("h1.text-heading-xlarge"),
                text!("h1[data-test-id=\"profile-name\"]"),
                text!("h1"),
            ],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "headline",
            candidates: &[
                text!("div.text-body-medium.break-words"),
                text!(".text-body-medium.break-words"),
                text!(".top-card-layout__headline"),
                text!(".profile-headline"),
            ],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "location",
            candidates: &[
                text!("span.text-body-small.inline.t-black--light.break-words"),
                text!(".text-body-small.inline.t-black--light.break-words"),
                text!(".top-card-layout__first-subline"),
                text!(".profile-location"),
            ],
            transforms: &[Transform::Sanitize],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "about",
            candidates: &[
                text!("#about ~ .display-flex .break-words"),
                text!(".core-section-container__content .break-words"),
                text!(".summary-text"),
            ],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "connections",
            candidates: &[
                text!(".t-16.t-black.t-bold", contains "connection"),
                text!(".top-card-layout__first-subline", contains "connection"),
                text!(".member-count"),
            ],
            transforms: &[Transform::Sanitize],
            ..FieldSpec::BASE
        },
    ],
    lists: &[
        ListSpec {
            name: "experience",
            source: ListSource::Records {
                containers: &[
                    text!("#experience ~ .pvs-list__container .pvs-entity"),
                    text!(".experience-section .pv-entity__summary-info"),
                    text!(".pv-profile-section__section-info .pv-entity__summary-info"),
                    text!("section[id*=\"experience\"] .pvs-list__container > li"),
                    text!("[data-section=\"experience\"] li"),
                ],
                fields: &[
                    FieldSpec {
                        name: "title",
                        candidates: &[
                            text!("[data-field=\"title\"]"),
                            text!(SPAN, contains "Manager"),
                            text!(SPAN, contains "Specialist"),
                            text!(SPAN, contains "Engineer"),
                            text!(SPAN, contains "Director"),
                            text!(SPAN, contains "Analyst"),
                            text!(BOLD_SPAN),
                            text!(".pv-entity__summary-info h3"),
                        ],
                        ..FieldSpec::BASE
                    },
                    FieldSpec {
                        name: "company",
                        candidates: &[
                            text!("[data-field=\"company\"]"),
                            text!("span.t-14.t-normal > span[aria-hidden='true']"),
                            text!(".pv-entity__secondary-title"),
                        ],
                        ..FieldSpec::BASE
                    },
                    FieldSpec {
                        name: "duration",
                        candidates: &[
                            text!("[data-field=\"duration\"]"),
                            text!(SPAN, contains "Present"),
                            text!(SPAN, contains "mos"),
                            text!(SPAN, contains "yrs"),
                            text!(CAPTION_SPAN),
                            text!(".pv-entity__date-range span:nth-child(2)"),
                        ],
                        ..FieldSpec::BASE
                    },
                    FieldSpec {
                        name: "location",
                        candidates: &[
                            text!("[data-field=\"location\"]"),
                            text!("span.t-14.t-normal.t-black--light > span[aria-hidden='true']"),
                            text!(".pv-entity__location span:nth-child(2)"),
                        ],
                        transforms: &[Transform::Sanitize],
                        ..FieldSpec::BASE
                    },
                    FieldSpec {
                        name: "description",
                        candidates: &[
                            text!("[data-field=\"description\"]"),
                            text!(".pvs-list__outer-container .t-14.t-normal.t-black span[aria-hidden='true']"),
                            text!(".pv-entity__description"),
                        ],
                        ..FieldSpec::BASE
                    },
                    FieldSpec {
                        name: "skills",
                        candidates: &[
                            text!("[data-field=\"skills\"]"),
                            text!("strong", contains "skill"),
                            text!(".hoverable-link-text strong"),
                        ],
                        ..FieldSpec::BASE
                    },
                ],
                required: &["title", "company"],
            },
            limit: None,
        },
        ListSpec {
            name: "education",
            source: ListSource::Records {
                containers: &[
                    text!("#education ~ .pvs-list__container .pvs-entity"),
                    text!(".education-section .pv-entity__summary-info"),
                    text!("section[id*=education] .pvs-list__container > li"),
                    text!("[data-section=\"education\"] li"),
                ],
                fields: &[
                    FieldSpec {
                        name: "school",
                        candidates: &[
                            text!("[data-field=\"school\"]"),
                            text!(".t-16.t-black.t-bold"),
                            text!("h3"),
                        ],
                        ..FieldSpec::BASE
                    },
                    FieldSpec {
                        name: "degree",
                        candidates: &[
                            text!("[data-field=\"degree\"]"),
                            text!(".pv-entity__degree-name .pv-entity__comma-item"),
                            text!(".t-14.t-black--light"),
                        ],
                        ..FieldSpec::BASE
                    },
                    FieldSpec {
                        name: "field",
                        candidates: &[
                            text!("[data-field=\"field\"]"),
                            text!(".pv-entity__fos .pv-entity__comma-item"),
                        ],
                        ..FieldSpec::BASE
                    },
                    FieldSpec {
                        name: "years",
                        candidates: &[
                            text!("[data-field=\"years\"]"),
                            text!(".pv-entity__dates time"),
                            text!(".t-14.t-black--light.t-normal"),
                        ],
                        ..FieldSpec::BASE
                    },
                ],
                required: &["school"],
            },
            limit: None,
        },
        ListSpec {
            name: "skills",
            source: ListSource::Tags {
                candidates: &[
                    text!("#skills ~ .pvs-list__container .pvs-entity .t-16.t-black.t-bold"),
                    text!(".skills-section .pv-skill-category-entity__name"),
                    text!("[data-section=\"skills\"] li"),
                ],
            },
            limit: None,
        },
        ListSpec {
            name: "languages",
            source: ListSource::Tags {
                candidates: &[
                    text!("#languages ~ .pvs-list__container .pvs-entity .t-14"),
                    text!("section[id*=language] .pvs-list__container li"),
                    text!(".languages__list .languages__list-item"),
                ],
            },
            limit: None,
        },
        ListSpec {
            name: "recommendations",
            source: ListSource::Records {
                containers: &[
                    text!("#recommendations ~ .pvs-list__container .pvs-entity"),
                    text!("section[id*=recommendation] .pvs-list__container > li"),
                ],
                fields: &[
                    FieldSpec {
                        name: "author",
                        candidates: &[text!("strong"), text!(".t-bold")],
                        ..FieldSpec::BASE
                    },
                    FieldSpec {
                        name: "text",
                        candidates: &[text!("p"), text!(".break-words")],
                        ..FieldSpec::BASE
                    },
                ],
                required: &["author", "text"],
            },
            limit: None,
        },
    ],
};

pub static COMPANY: Schema = Schema {
    kind: EntityKind::ProfessionalCompany,
    fields: &[
        FieldSpec {
            name: "name",
            candidates: &[
                text!("h1[data-test-id=\"org-name\"]"),
                text!("h1.org-top-card-summary__title"),
                text!("h1"),
            ],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "industry",
            candidates: &[
                text!(".org-top-card-summary__industry"),
                text!("[data-test-id=\"about-us-industry\"]"),
                text!(".company-industries"),
            ],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "size",
            candidates: &[
                text!(".org-top-card-summary__company-size"),
                text!("[data-test-id=\"about-us-size\"]"),
                text!(".company-size"),
            ],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "location",
            candidates: &[
                text!(".org-top-card-summary__headquarter"),
                text!("[data-test-id=\"about-us-headquarters\"]"),
                text!(".company-location"),
            ],
            transforms: &[Transform::Sanitize],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "website",
            candidates: &[
                attr!("a[data-test-id=\"about-us-website\"]", "href"),
                attr!(".company-website a", "href"),
            ],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "about",
            candidates: &[
                text!(".break-words p"),
                text!(".org-about-us__description"),
                text!(".company-description"),
            ],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "followers",
            candidates: &[
                text!(".org-top-card-summary__follower-count"),
                text!(".follower-count"),
            ],
            ..FieldSpec::BASE
        },
        FieldSpec {
            name: "employees",
            candidates: &[
                text!(".org-top-card-summary__company-size"),
                text!("[data-test-id=\"about-us-size\"]"),
                text!(".company-size"),
            ],
            ..FieldSpec::BASE
        },
    ],
    lists: &[],
};
