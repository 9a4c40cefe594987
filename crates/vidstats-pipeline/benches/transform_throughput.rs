//! Throughput of the clean/transform rules on in-memory tables.
//!
//! Measures `transform_table` only; CSV parsing and writing are excluded.

use std::time::Duration;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use vidstats_core::artifact::parse_table;
use vidstats_core::types::Table;
use vidstats_pipeline::transform_table;

/// A trending-videos style CSV with `rows` records.
///
/// Every 50th row carries a non-numeric view count and every 7th an empty
/// dislike count, so both the drop and fill paths are exercised.
fn generate_csv(rows: usize) -> String {
    let mut csv = String::from(
        "video_id,title,channel_title,category_id,publish_time,views,likes,dislikes,comment_count\n",
    );
    for i in 0..rows {
        let views = if i % 50 == 0 {
            "n/a".to_string()
        } else {
            (1000 + i * 37).to_string()
        };
        let dislikes = if i % 7 == 0 {
            String::new()
        } else {
            (i % 90).to_string()
        };
        csv.push_str(&format!(
            "vid{i:06},\"Video number {i}, part {}\",Channel {},{},2018-{:02}-{:02}T{:02}:15:00.000Z,{views},{},{dislikes},{}\n",
            i % 3,
            i % 40,
            [1, 10, 17, 22, 24][i % 5],
            1 + i % 12,
            1 + i % 28,
            i % 24,
            i % 500,
            i % 120,
        ));
    }
    csv
}

fn make_table(rows: usize) -> Table {
    parse_table(generate_csv(rows).as_bytes()).expect("generated CSV parses")
}

fn bench_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform");
    group.sample_size(50);
    group.measurement_time(Duration::from_secs(10));

    for rows in [1_000usize, 10_000] {
        let table = make_table(rows);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_function(format!("rows_{rows}"), |b| {
            b.iter_batched(
                || table.clone(),
                transform_table,
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_transform);
criterion_main!(benches);
