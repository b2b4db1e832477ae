//! Call Marshaling Benchmarks
//!
//! Compares inline argument buffers against spilled ones, plus bound calls.
//!
//! Run with: `cargo bench -p qjs-bridge`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use qjs_bridge::{Runtime, Value, ValueRef};
use std::hint::black_box;

fn call_benchmark(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let ctx = rt.new_context().unwrap();
    let sum = ctx
        .eval("(function (...xs) { let s = 0; for (const x of xs) s += x; return s })")
        .unwrap();

    let mut group = c.benchmark_group("call");
    for count in [0usize, 4, 8] {
        let args: Vec<Value<'_>> = (0..count).map(|i| ctx.new_int32(i as i32)).collect();
        let refs: Vec<&ValueRef<'_>> = args.iter().map(|v| &**v).collect();
        group.bench_with_input(BenchmarkId::new("args", count), &refs, |b, refs| {
            b.iter(|| black_box(sum.call(None, black_box(refs)).unwrap()));
        });
    }
    group.finish();
}

fn bound_call_benchmark(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let ctx = rt.new_context().unwrap();
    let add = ctx.eval("((a, b, c) => a + b + c)").unwrap();

    let one = ctx.new_int32(1);
    let two = ctx.new_int32(2);
    let three = ctx.new_int32(3);
    let bound = add.bind(None, &[&one, &two]);

    let tail: [&ValueRef<'_>; 1] = [&three];
    let full: [&ValueRef<'_>; 3] = [&one, &two, &three];

    let mut group = c.benchmark_group("bound_call");
    group.bench_function("prefix_2_args_1", |b| {
        b.iter(|| black_box(bound.call(black_box(&tail)).unwrap()));
    });
    group.bench_function("unbound_args_3", |b| {
        b.iter(|| black_box(add.call(None, black_box(&full)).unwrap()));
    });
    group.finish();
}

criterion_group!(benches, call_benchmark, bound_call_benchmark);
criterion_main!(benches);
