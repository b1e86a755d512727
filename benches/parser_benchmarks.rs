use chrono::Utc;
use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use pglogstream::parser::{csv_parser, stderr};
use pglogstream::prefix_infer;

const STDERR_SAMPLE: &str =
    "2025-01-02 10:00:00.123 UTC [4242]: user=alice,db=shop,app=psql LOG:  connection received\n\
     2025-01-02 10:00:00.456 UTC [4242]: user=alice,db=shop,app=psql ERROR:  syntax error at or near \"x\"\n\
     \tLINE 1: SELECT x\n\
     2025-01-02 10:00:01.001 UTC [4243]: user=bob,db=billing,app=pgbench LOG:  autovacuum launched\n";

const CSV_SAMPLE: &str = "\"2025-01-02 10:00:00.123 UTC\",\"alice\",\"shop\",\"4242\",,,,,,,,\"LOG\",,\"connection received\"\n";

fn benchmark_stderr_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("stderr_assembly");
    group.throughput(Throughput::Bytes(STDERR_SAMPLE.len() as u64));
    group.bench_function("assemble_and_parse", |b| {
        b.iter(|| {
            let now = Utc::now();
            let outcome =
                stderr::parse(std::io::Cursor::new(std::hint::black_box(STDERR_SAMPLE)), now)
                    .unwrap();
            std::hint::black_box(outcome.entries.len())
        });
    });
    group.finish();
}

fn benchmark_prefix_inference(c: &mut Criterion) {
    let samples: Vec<String> = vec![
        "[4242]: user=alice,db=shop,app=psql LOG:  connection received".to_string(),
        "[4300]: user=bob,db=billing,app=pgbench LOG:  connection received".to_string(),
        "[4301]: user=carol,db=shop,app=psql ERROR:  syntax error".to_string(),
    ];

    let mut group = c.benchmark_group("prefix_inference");
    group.bench_function("infer_structure", |b| {
        b.iter(|| {
            let structure = prefix_infer::infer_structure(std::hint::black_box(&samples));
            std::hint::black_box(structure)
        });
    });

    let structure = prefix_infer::infer_structure(&samples);
    group.bench_function("apply_structure", |b| {
        b.iter(|| {
            let meta = prefix_infer::apply(
                &structure,
                std::hint::black_box("[9999]: user=dana,db=reports,app=psql LOG:  autovacuum"),
            );
            std::hint::black_box(meta)
        });
    });
    group.finish();
}

fn benchmark_csv_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("csv_parsing");
    group.throughput(Throughput::Bytes(CSV_SAMPLE.len() as u64));
    group.bench_function("parse_row", |b| {
        b.iter(|| {
            let outcome = csv_parser::parse(std::io::Cursor::new(std::hint::black_box(CSV_SAMPLE)))
                .unwrap();
            std::hint::black_box(outcome.entries.len())
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_stderr_assembly,
    benchmark_prefix_inference,
    benchmark_csv_parsing
);
criterion_main!(benches);
