//! Benchmarks for template compilation and change propagation.
//!
//! Run with: `cargo bench --package vbind-runtime --bench binding_bench`
//!
//! # Performance Baselines
//!
//! - Compiling a flat list of interpolated rows
//! - One write fanned out to every row that reads it
//! - One write reaching a single row among many

use std::hint::black_box;
use std::rc::Rc;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use vbind_reactive::{Object, obj};
use vbind_runtime::{Options, ViewModel};
use vbind_view::MemoryTree;

// ============================================================================
// Fixtures
// ============================================================================

/// `rows` paragraphs; row `i` shows the shared `title` and its own `r<i>`.
fn rows_markup(rows: usize) -> String {
    let mut out = String::from(r#"<ul id="app">"#);
    for i in 0..rows {
        out.push_str(&format!(r#"<li><input v-model="r{i}">{{{{ title }}}}: {{{{ r{i} }}}}</li>"#));
    }
    out.push_str("</ul>");
    out
}

fn rows_data(rows: usize) -> Object {
    let data = obj! { "title" => "row" };
    for i in 0..rows {
        data.insert(format!("r{i}"), i);
    }
    data
}

fn mount(rows: usize) -> (Rc<MemoryTree>, ViewModel) {
    let tree = Rc::new(MemoryTree::parse(&rows_markup(rows)).expect("fixture markup parses"));
    let vm = ViewModel::new(
        Options::new()
            .el(Rc::clone(&tree), "#app")
            .data(rows_data(rows)),
    )
    .expect("fixture compiles");
    (tree, vm)
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    for rows in [10, 100, 1_000] {
        let markup = rows_markup(rows);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, &rows| {
            b.iter(|| {
                let tree = Rc::new(MemoryTree::parse(&markup).expect("fixture markup parses"));
                let vm = ViewModel::new(
                    Options::new()
                        .el(Rc::clone(&tree), "#app")
                        .data(rows_data(rows)),
                )
                .expect("fixture compiles");
                black_box(vm.binding_count())
            });
        });
    }
    group.finish();
}

fn bench_propagate(c: &mut Criterion) {
    let mut group = c.benchmark_group("propagate");
    for rows in [10, 100, 1_000] {
        let (_tree, vm) = mount(rows);
        let mut n = 0u64;
        group.bench_with_input(BenchmarkId::new("shared_key", rows), &rows, |b, _| {
            b.iter(|| {
                n += 1;
                black_box(vm.set("title", n).expect("write succeeds"))
            });
        });
        group.bench_with_input(BenchmarkId::new("single_key", rows), &rows, |b, _| {
            b.iter(|| {
                n += 1;
                black_box(vm.set("r0", n).expect("write succeeds"))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compile, bench_propagate);
criterion_main!(benches);
