use cassandra_marshal::codec::{decode_decimal_cell, decode_varint, encode_decimal_cell, encode_varint};
use cassandra_marshal::native::{ColumnSpec, Prepared};
use cassandra_marshal::{BigInt, ColumnType, CqlDecimal, HostValue, ResultReader, Statement, TypeRegistry};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use std::sync::Arc;

fn big(bits: u32) -> BigInt {
    (BigInt::from(1) << bits) - 1
}

fn bind_list(prepared: &Prepared, registry: &Arc<TypeRegistry>, n: i64) -> usize {
    let mut statement = Statement::new(prepared.bind(), Arc::clone(registry));
    statement
        .bind_list(0_usize, (0..n).map(HostValue::from).collect::<HostValue>(), Some("int"))
        .unwrap();
    let submission = statement.take().unwrap().submit().unwrap();
    submission.len()
}

fn read_list(prepared: &Prepared, registry: &Arc<TypeRegistry>, n: i64) -> usize {
    let mut statement = Statement::new(prepared.bind(), Arc::clone(registry));
    statement
        .bind_list(0_usize, (0..n).map(HostValue::from).collect::<HostValue>(), Some("int"))
        .unwrap();
    let reader = ResultReader::new(statement.take().unwrap().submit().unwrap().into_result());
    reader.rows().map(|row| row.unwrap().len()).sum()
}

fn criterion_benchmark(c: &mut Criterion) {
    let widths = [32, 128, 1024];

    let mut group = c.benchmark_group("varint");
    for bits in &widths {
        let value = big(*bits);
        let encoded = encode_varint(&value);
        group.bench_with_input(BenchmarkId::new("encode", bits), &value, |b, value| {
            b.iter(|| encode_varint(black_box(value)))
        });
        group.bench_with_input(BenchmarkId::new("decode", bits), &encoded, |b, encoded| {
            b.iter(|| decode_varint(black_box(encoded)))
        });
    }
    group.finish();

    let mut group = c.benchmark_group("decimal");
    for bits in &widths {
        let value = CqlDecimal::new(-big(*bits), 6);
        let cell = encode_decimal_cell(&value);
        group.bench_with_input(BenchmarkId::new("encode", bits), &value, |b, value| {
            b.iter(|| encode_decimal_cell(black_box(value)))
        });
        group.bench_with_input(BenchmarkId::new("decode", bits), &cell, |b, cell| {
            b.iter(|| decode_decimal_cell(black_box(cell)))
        });
    }
    group.finish();

    let registry = Arc::new(TypeRegistry::new());
    let prepared = Prepared::new(
        "INSERT INTO t (l) VALUES (?)",
        vec![ColumnSpec::new("l", ColumnType::list(ColumnType::Int))],
    );
    let sizes = [100, 1_000, 10_000];
    let mut group = c.benchmark_group("list");
    for size in &sizes {
        group.throughput(criterion::Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("bind", size), size, |b, &size| {
            b.iter(|| bind_list(&prepared, &registry, size))
        });
        group.bench_with_input(BenchmarkId::new("bind and read", size), size, |b, &size| {
            b.iter(|| read_list(&prepared, &registry, size))
        });
    }
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
