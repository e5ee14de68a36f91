// benches/extraction_benchmarks.rs
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use scraper::Html;

use profile_harvester::extraction::{extract_page, sanitize, schema_for};
use profile_harvester::projection::project;
use profile_harvester::EntityKind;

const LISTING_URL: &str = "https://www.google.com/maps/place/Blue+Bottle+Coffee/@37.7764,-122.4233,17z";

fn load_sample() -> String {
    std::fs::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/business_listing.html"))
        .expect("read tests/fixtures/business_listing.html")
}

fn bench_extraction(c: &mut Criterion) {
    let html = load_sample();
    let schema = schema_for(EntityKind::BusinessListing);

    c.bench_function("parse_and_extract_listing", |b| {
        b.iter(|| {
            let doc = Html::parse_document(black_box(&html));
            let entity = extract_page(&doc, schema, LISTING_URL);
            black_box(entity.fields.len())
        })
    });

    let doc = Html::parse_document(&html);
    c.bench_function("extract_listing_parsed", |b| {
        b.iter(|| {
            let entity = extract_page(black_box(&doc), schema, LISTING_URL);
            black_box(entity.lists.len())
        })
    });

    let entity = extract_page(&doc, schema, LISTING_URL);
    c.bench_function("project_listing", |b| {
        b.iter(|| {
            let rows = project(black_box(&entity), "Google Business");
            black_box(rows.len())
        })
    });

    let noisy = "San Francisco, CA. Sign in to view Jane's full profile. Join now to see all activity. \
                 Privacy Policy applies. Learn more about cookies.";
    c.bench_function("sanitize_location", |b| {
        b.iter(|| black_box(sanitize(black_box(noisy))))
    });
}

criterion_group!(benches, bench_extraction);
criterion_main!(benches);
