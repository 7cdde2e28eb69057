use criterion::{black_box, criterion_group, criterion_main, Criterion};

use suola_core::{Matcher, RuleSet};

fn bench_pipeline(c: &mut Criterion) {
    let rules = match RuleSet::embedded() {
        Ok(rules) => rules,
        Err(e) => panic!("embedded rules failed to load: {e}"),
    };
    let matcher = Matcher::new(&rules);

    c.bench_function("signature_for/article", |b| {
        b.iter(|| {
            matcher.signature_for(black_box(
                "https://www.iltalehti.fi/ulkomaat/a/51495a62-a494-4474-a234-ddedae3e112b?utm_source=facebook",
            ))
        })
    });

    c.bench_function("signature_for/query", |b| {
        b.iter(|| matcher.signature_for(black_box("https://m.youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=42")))
    });

    c.bench_function("signature_for/no_match", |b| {
        b.iter(|| matcher.signature_for(black_box("https://unknown.invalid/path")))
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
