use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use kitscan_core::transfer::{extract_armored_key, verify_integrity};
use kitscan_core::{AssemblyOrder, Frame, PageAggregator, ScannerConfig};
use kitscan_crypto::sha512_hex;

fn body(key_len: usize) -> Vec<u8> {
    let mut body = br#"{"user_id":"u1","armored_key":""#.to_vec();
    body.extend(std::iter::repeat_n(b'K', key_len));
    body.extend_from_slice(br#""}"#);
    body
}

fn bench_classify(c: &mut Criterion) {
    let first_page = format!(
        r#"100{{"totalPages":8,"hash":"{}","transfer_id":"t1"}}"#,
        sha512_hex(b"")
    )
    .into_bytes();
    let mut body_page = b"105".to_vec();
    body_page.extend_from_slice(&[b'x'; 1024]);

    let mut group = c.benchmark_group("frame_classify");

    group.bench_function("first_page", |b| {
        b.iter(|| Frame::from_bytes(black_box(&first_page)))
    });

    group.throughput(Throughput::Bytes(body_page.len() as u64));
    group.bench_function("body_page_1kb", |b| {
        b.iter(|| Frame::from_bytes(black_box(&body_page)))
    });

    group.finish();
}

fn bench_verify_extract(c: &mut Criterion) {
    let sizes: Vec<(usize, &str)> = vec![(1024, "1kb"), (8192, "8kb"), (65536, "64kb")];

    let mut group = c.benchmark_group("verify_extract");

    for (size, name) in sizes {
        let body = body(size);
        let hash = sha512_hex(&body);

        group.throughput(Throughput::Bytes(body.len() as u64));
        group.bench_function(format!("verify_{name}"), |b| {
            b.iter(|| verify_integrity(black_box(&body), black_box(&hash)))
        });
        group.bench_function(format!("extract_{name}"), |b| {
            b.iter(|| extract_armored_key(black_box(&body)))
        });
    }

    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let body = body(16 * 1024);
    let pages: Vec<Vec<u8>> = body
        .chunks(1024)
        .enumerate()
        .map(|(i, chunk)| {
            let mut page = format!("1{:02x}", i + 1).into_bytes();
            page.extend_from_slice(chunk);
            page
        })
        .collect();
    let first_page = format!(
        r#"100{{"totalPages":{},"hash":"{}"}}"#,
        pages.len() + 1,
        sha512_hex(&body)
    )
    .into_bytes();

    let mut group = c.benchmark_group("aggregate");
    group.throughput(Throughput::Bytes(body.len() as u64));

    for (order, name) in [
        (AssemblyOrder::ScanOrder, "scan_order"),
        (AssemblyOrder::PageIndex, "page_index_reversed"),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut aggregator = PageAggregator::new(ScannerConfig {
                    assembly_order: order,
                    ..ScannerConfig::default()
                });
                aggregator.accept(Frame::from_bytes(&first_page));
                match order {
                    AssemblyOrder::ScanOrder => {
                        for page in &pages {
                            aggregator.accept(Frame::from_bytes(black_box(page)));
                        }
                    }
                    AssemblyOrder::PageIndex => {
                        for page in pages.iter().rev() {
                            aggregator.accept(Frame::from_bytes(black_box(page)));
                        }
                    }
                }
                aggregator.verify()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_classify, bench_verify_extract, bench_aggregate);
criterion_main!(benches);
