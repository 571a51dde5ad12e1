//! Benchmarks for the layout simulation
//!
//! The tick is all-pairs, so cost grows with the square of the graph size.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use muza_core::{AssociativeMemory, MemoryConfig};
use rand::Rng;

fn generate_memory(concepts: usize) -> AssociativeMemory {
	let mut rng = rand::thread_rng();
	let words: Vec<String> = (0..concepts)
		.map(|i| {
			let suffix: String = (0..4).map(|_| rng.gen_range(b'a'..=b'z') as char).collect();
			format!("{suffix}{i}")
		})
		.collect();

	let mut memory = AssociativeMemory::with_seed(MemoryConfig::default(), 7);
	memory.learn(&words.join(" "), None);
	memory
}

fn bench_tick(c: &mut Criterion) {
	let mut group = c.benchmark_group("physics_tick");
	let _ = group.sample_size(20);

	for concepts in &[100, 250, 500, 1000] {
		let mut memory = generate_memory(*concepts);

		let pairs = (*concepts as u64) * (*concepts as u64 - 1);
		let _ = group.throughput(Throughput::Elements(pairs));
		let _ = group.bench_with_input(
			BenchmarkId::new("concepts", concepts),
			concepts,
			|bench, _| {
				bench.iter(|| black_box(&mut memory).tick());
			},
		);
	}

	group.finish();
}

fn bench_learn(c: &mut Criterion) {
	let sentence = "the quick brown fox jumps over the lazy dog while the memory engine listens";
	let _ = c.bench_function("learn_sentence", |bench| {
		let mut memory = AssociativeMemory::with_seed(MemoryConfig::default(), 7);
		bench.iter(|| memory.learn(black_box(sentence), None));
	});
}

criterion_group!(benches, bench_tick, bench_learn);
criterion_main!(benches);
