use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rowcut::{Delimiter, FieldSpec, ParseOptions, Parser, RecordSpec};

fn make_plain_rows(count: usize) -> String {
    let mut out = String::with_capacity(count * 32);
    for i in 0..count {
        out.push_str(&format!(
            "sensor-{},{},{},{}\n",
            i % 50,
            i,
            (i as f64) * 0.25,
            i % 2 == 0
        ));
    }
    out
}

fn make_quoted_rows(count: usize) -> String {
    let mut out = String::with_capacity(count * 48);
    for i in 0..count {
        out.push_str(&format!(
            "\"name, {i}\",\"said \"\"{i}\"\"\",{i}\n",
            i = i % 100
        ));
    }
    out
}

fn bench_typed_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("typed_parse");
    for count in [1_000usize, 10_000] {
        let input = make_plain_rows(count);
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_function(BenchmarkId::new("plain", count), |b| {
            b.iter(|| {
                let mut parser = Parser::from_slice(black_box(input.as_bytes())).unwrap();
                let mut total = 0i64;
                while let Some((_, id, value, _)) = parser.get_next::<(String, i64, f64, bool)>() {
                    total += id + value as i64;
                }
                black_box(total);
            });
        });
    }
    group.finish();
}

fn bench_quoted_parse(c: &mut Criterion) {
    let input = make_quoted_rows(10_000);
    let options = ParseOptions::new().with_quote(b'"');
    let spec = RecordSpec::new([FieldSpec::string(), FieldSpec::string(), FieldSpec::int()]);

    let mut group = c.benchmark_group("quoted_parse");
    group.throughput(Throughput::Bytes(input.len() as u64));
    group.bench_function("records", |b| {
        b.iter(|| {
            let mut parser = Parser::from_slice_with(
                black_box(input.as_bytes()),
                Delimiter::default(),
                options.clone(),
            )
            .unwrap();
            let mut fields = 0usize;
            while let Some(record) = parser.next_record(&spec) {
                fields += record.len();
            }
            black_box(fields);
        });
    });
    group.finish();
}

criterion_group!(benches, bench_typed_parse, bench_quoted_parse);
criterion_main!(benches);
