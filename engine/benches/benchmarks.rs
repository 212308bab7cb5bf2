//! Performance benchmarks for garage-engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use garage_engine::{
    sales_report, stock_summary, Collection, IdClock, PartSaleDraft, Product, ProductDraft,
    RecordId, Vehicle, VehicleDraft, VehiclePart,
};

fn stock(count: usize) -> Vec<Product> {
    let mut clock = IdClock::new();
    (0..count)
        .map(|i| {
            ProductDraft {
                name: format!("Product {i}"),
                price: format!("{}.{:02}", i % 500, i % 100),
                quantity: (i % 20).to_string(),
                ..Default::default()
            }
            .into_product(clock.next_id(1000), 1000)
            .unwrap()
        })
        .collect()
}

fn vehicles_with_parts(vehicles: usize, parts_each: usize) -> Vec<(Vehicle, Vec<VehiclePart>)> {
    let mut clock = IdClock::new();
    (0..vehicles)
        .map(|v| {
            let vehicle = VehicleDraft {
                make: "Make".into(),
                model: format!("Model {v}"),
                registration_number: format!("REG{v}"),
                ..Default::default()
            }
            .into_vehicle(clock.next_id(1000), 1000)
            .unwrap();

            let parts = (0..parts_each)
                .map(|p| {
                    PartSaleDraft {
                        name: format!("Part {p}"),
                        price: "99.90".into(),
                        quantity: "2".into(),
                    }
                    .into_part(clock.next_id(2000), 2000)
                    .unwrap()
                })
                .collect();

            (vehicle, parts)
        })
        .collect()
}

fn bench_stock_summary(c: &mut Criterion) {
    let mut group = c.benchmark_group("stock_summary");

    for size in [10, 100, 1000] {
        let products = stock(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &products, |b, products| {
            b.iter(|| stock_summary(black_box(products), black_box(&[] as &[Vehicle])))
        });
    }

    group.finish();
}

fn bench_sales_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("sales_report");

    for (vehicles, parts) in [(10, 10), (100, 10), (100, 100)] {
        let data = vehicles_with_parts(vehicles, parts);
        group.bench_with_input(
            BenchmarkId::new("vehicles_x_parts", format!("{vehicles}x{parts}")),
            &data,
            |b, data| {
                b.iter(|| {
                    sales_report(
                        data.iter()
                            .map(|(vehicle, parts)| (vehicle, parts.clone())),
                    )
                })
            },
        );
    }

    group.finish();
}

fn bench_collection(c: &mut Criterion) {
    let mut group = c.benchmark_group("collection");

    group.bench_function("decode_1000_products", |b| {
        let json = serde_json::to_string(&stock(1000)).unwrap();
        b.iter(|| serde_json::from_str::<Collection<Product>>(black_box(&json)).unwrap())
    });

    group.bench_function("remove_by_id", |b| {
        let products: Collection<Product> = stock(1000).into();
        let target = products.records()[500].id;
        b.iter(|| {
            let mut copy = products.clone();
            copy.remove(black_box(target))
        })
    });

    group.bench_function("remove_absent_id", |b| {
        let products: Collection<Product> = stock(1000).into();
        b.iter(|| {
            let mut copy = products.clone();
            copy.remove(black_box(RecordId::new(0)))
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_stock_summary,
    bench_sales_report,
    bench_collection
);
criterion_main!(benches);
