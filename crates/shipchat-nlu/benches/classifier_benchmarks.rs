//! Benchmarks for the local analysis path: classification plus extraction.
//!
//! The local tier is the last line of defense and runs on every message
//! once the remote tiers are degraded, so it should stay well under a
//! millisecond per message.

use std::sync::Arc;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use shipchat_nlu::{ExtractorTable, IntentClassifier, IntentRegistry};

const MESSAGES: &[&str] = &[
    "تتبع الشحنة 12345678",
    "أنشئ شحنة جديدة للمستلم محمد أحمد جواله 0551234567 الرياض حي النرجس الوزن 3 كيلو",
    "وين شحنتي مع سمسا؟",
    "ابحث عن طلب الكتب",
    "كم سعر الشحن إلى جدة لوزن 1500 جرام",
    "hello, I want to create shipment",
    "شكرا جزيلا",
    "كلام لا علاقة له بالشحن إطلاقاً",
];

fn bench_classify(c: &mut Criterion) {
    let classifier = IntentClassifier::new(Arc::new(IntentRegistry::standard()));

    let mut group = c.benchmark_group("classifier");
    group.sample_size(200);
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("classify_mixed", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let result = classifier.classify(MESSAGES[idx % MESSAGES.len()]);
            idx += 1;
            result
        });
    });

    group.finish();
}

fn bench_extract(c: &mut Criterion) {
    let registry = IntentRegistry::standard();
    let table = ExtractorTable::standard();
    let fields = registry.extract_fields(shipchat_core::Intent::CreateShipment).to_vec();

    let mut group = c.benchmark_group("extractor");
    group.sample_size(200);

    group.bench_function("extract_create_shipment_fields", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let bag = table.extract(MESSAGES[idx % MESSAGES.len()], &fields);
            idx += 1;
            bag
        });
    });

    group.finish();
}

criterion_group!(benches, bench_classify, bench_extract);
criterion_main!(benches);
