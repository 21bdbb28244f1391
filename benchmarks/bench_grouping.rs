use std::hint::black_box;
use std::io::Cursor;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use serialblocks::grouping::{group_into_serial_blocks, group_numbers};
use serialblocks::model::Row;
use serialblocks::parsers::{CsvOptions, RowStream};
use serialblocks::readers::ByteCounter;

/// Mostly consecutive identifiers with a gap every `run` values
fn serials(count: u64, run: u64) -> Vec<u64> {
    (0..count).map(|i| 1_000_000 + i + i / run).collect()
}

fn csv_text(count: u64) -> String {
    let mut text = String::from("serial,batch\n");
    for (i, serial) in serials(count, 250).into_iter().enumerate() {
        text.push_str(&format!("SN-{:03}-{},{}\n", serial / 1000, serial % 1000, i % 7));
    }
    text
}

fn bench_group_numbers(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_numbers");
    for &count in &[1_000u64, 100_000] {
        let sorted = serials(count, 50);
        let mut shuffled = sorted.clone();
        shuffled.reverse();

        group.throughput(Throughput::Elements(count));
        group.bench_with_input(BenchmarkId::new("sorted", count), &sorted, |b, values| {
            b.iter(|| black_box(group_numbers(values.iter().copied())));
        });
        group.bench_with_input(BenchmarkId::new("reversed", count), &shuffled, |b, values| {
            b.iter(|| black_box(group_numbers(values.iter().copied())));
        });
    }
    group.finish();
}

fn bench_group_rows(c: &mut Criterion) {
    let rows: Vec<Row> = serials(50_000, 100)
        .into_iter()
        .map(|n| Row::from(vec![format!("{}-{}", n / 10_000, n % 10_000), "x".to_string()]))
        .collect();

    c.bench_function("group_rows_50k", |b| {
        b.iter(|| black_box(group_into_serial_blocks(black_box(&rows))));
    });
}

fn bench_parse_and_group(c: &mut Criterion) {
    let text = csv_text(20_000);
    let mut group = c.benchmark_group("parse_and_group");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("keyed_20k", |b| {
        b.iter(|| {
            let stream = RowStream::new(
                Cursor::new(text.as_bytes()),
                CsvOptions::default(),
                true,
                ByteCounter::new(),
                true,
            );
            let rows: Vec<Row> = stream
                .filter_map(|item| match item {
                    serialblocks::parsers::StreamItem::Row { row, .. } => Some(row),
                    serialblocks::parsers::StreamItem::Issue(_) => None,
                })
                .collect();
            black_box(group_into_serial_blocks(&rows))
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_group_numbers,
    bench_group_rows,
    bench_parse_and_group
);
criterion_main!(benches);
