use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use read_cmap::{
    encoding::{EncodingRegistry, EncodingRsDecoder, LegacyEncoding, TranslationTable},
    tables::cmap::CmapSelector,
    FontData,
};

fn lookup(c: &mut Criterion) {
    // 64 disjoint ranges of 200 code points each
    let ranges = (0..64u32)
        .map(|i| (0x100 + i * 0x400, 0x100 + i * 0x400 + 199, 1 + i * 200))
        .collect::<Vec<_>>();
    let bmp_ranges = ranges
        .iter()
        .map(|(start, end, gid)| (*start as u16, *end as u16, *gid as u16))
        .collect::<Vec<_>>();
    let selector = CmapSelector::new(Arc::new(EncodingRegistry::without_decoder()));
    for (name, table) in [
        (
            "format4",
            cmap_test_data::cmap_table(&[(3, 1, cmap_test_data::format4(&bmp_ranges))]),
        ),
        (
            "format12",
            cmap_test_data::cmap_table(&[(3, 10, cmap_test_data::format12(&ranges))]),
        ),
    ] {
        let charmap = selector.select(FontData::new(&table)).unwrap();
        c.bench_function(name, |b| {
            b.iter(|| {
                for cp in (0..0x10000u32).step_by(7) {
                    black_box(charmap.map(cp));
                }
            })
        });
    }
}

fn translation(c: &mut Criterion) {
    let registry = EncodingRegistry::new();
    c.bench_function("build_shift_jis", |b| {
        b.iter(|| TranslationTable::build(LegacyEncoding::ShiftJis, Some(&EncodingRsDecoder)))
    });
    registry.translation(LegacyEncoding::Gbk);
    c.bench_function("cached_gbk", |b| {
        b.iter(|| black_box(registry.translation(LegacyEncoding::Gbk)))
    });
}

criterion_group!(benches, lookup, translation);
criterion_main!(benches);
