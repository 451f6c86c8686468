use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{distributions::Alphanumeric, Rng};
use scaling_bloom_rs::BloomChain;

// Helper function to generate random string data
fn generate_random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn generate_test_data(count: usize) -> Vec<String> {
    (0..count).map(|_| generate_random_string(32)).collect()
}

fn seeded_chain(count: usize) -> BloomChain {
    let mut chain = BloomChain::new();
    for item in generate_test_data(count) {
        chain.add(item.as_bytes());
    }
    chain
}

fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_operations");

    for count in [1_000, 10_000, 100_000] {
        let test_data = generate_test_data(count);

        group.bench_with_input(
            BenchmarkId::new("chain", count),
            &test_data,
            |b, data| {
                b.iter_batched(
                    BloomChain::new,
                    |mut chain| {
                        for item in data.iter() {
                            chain.add(item.as_bytes());
                        }
                    },
                    criterion::BatchSize::SmallInput,
                )
            },
        );
    }

    group.finish();
}

fn bench_exists(c: &mut Criterion) {
    let mut group = c.benchmark_group("exists_operations");

    for count in [1_000, 10_000, 100_000] {
        let chain = seeded_chain(count);
        let probes = generate_test_data(1_000);

        group.bench_with_input(
            BenchmarkId::new("chain", count),
            &(chain, probes),
            |b, (chain, probes)| {
                b.iter(|| {
                    for probe in probes.iter() {
                        std::hint::black_box(chain.contains(probe.as_bytes()));
                    }
                })
            },
        );
    }

    group.finish();
}

fn bench_cardinality(c: &mut Criterion) {
    let mut group = c.benchmark_group("cardinality_operations");

    for count in [10_000, 100_000] {
        let chain = seeded_chain(count);

        group.bench_with_input(
            BenchmarkId::new("chain", count),
            &chain,
            |b, chain| {
                b.iter(|| std::hint::black_box(chain.estimate_cardinality()))
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_add, bench_exists, bench_cardinality);
criterion_main!(benches);
