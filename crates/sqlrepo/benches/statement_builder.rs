use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sqlrepo::qb::{self, Placeholder, SqlQb, UpdateQb};

/// UPDATE t SET col1 = ?, ..., colN = ? WHERE col0 = ?
fn build_update(n: usize, placeholder: Placeholder) -> UpdateQb {
    let mut builder = qb::update("t").placeholder(placeholder);
    for i in 1..=n {
        builder = builder.set(&format!("col{i}"), i as i64);
    }
    builder.eq("col0", 0_i64)
}

fn bench_update_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement_builder/update");

    for placeholder in Placeholder::ALL {
        for n in [1, 10, 100] {
            let builder = build_update(n, placeholder);
            group.bench_with_input(
                BenchmarkId::new(placeholder.name(), n),
                &builder,
                |b, builder| {
                    b.iter(|| black_box(builder.build()));
                },
            );
        }
    }

    group.finish();
}

fn bench_insert_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement_builder/insert");

    for n in [2, 20, 200] {
        let columns: Vec<String> = (0..n).map(|i| format!("col{i}")).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &columns, |b, columns| {
            b.iter(|| {
                let mut builder = qb::insert("t").placeholder(Placeholder::Dollar);
                for (i, column) in columns.iter().enumerate() {
                    builder = builder.set(column, i as i64);
                }
                black_box(builder.build())
            });
        });
    }

    group.finish();
}

fn bench_select_by_key(c: &mut Criterion) {
    c.bench_function("statement_builder/select_by_key", |b| {
        b.iter(|| {
            black_box(
                qb::select("public.persons")
                    .placeholder(Placeholder::AtP)
                    .eq("id", black_box(42_i64))
                    .build(),
            )
        });
    });
}

criterion_group!(
    benches,
    bench_update_render,
    bench_insert_render,
    bench_select_by_key
);
criterion_main!(benches);
