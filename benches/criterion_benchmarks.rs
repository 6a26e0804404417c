use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use smcodec::compare;
use smcodec::huffman::{self, EncodeOptions, FrequencyTable, ReservedPrefix, tree};
use std::fs;
use std::path::Path;

const ALPHABET: &[u8] = b"etaoin shrdlucmfwypvbgkjqxzETAOIN.,;:!?0123456789\n";

/// English-like text: a skewed draw from `ALPHABET` (earlier letters are
/// more frequent).
fn gen_text(size: usize, seed: u64) -> Vec<u8> {
    let mut s = seed;
    let mut out = Vec::with_capacity(size);
    for _ in 0..size {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        let r = ((s >> 33) % 1000) as usize;
        // r^2 / 1000^2 biases toward the front of the alphabet.
        let idx = r * r * ALPHABET.len() / 1_000_000;
        out.push(ALPHABET[idx]);
    }
    out
}

fn gen_bytes(size: usize, seed: u64) -> Vec<u8> {
    let mut s = seed;
    let mut out = Vec::with_capacity(size);
    for _ in 0..size {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        out.push((s >> 33) as u8);
    }
    out
}

fn write_ratio_snapshot() {
    let mut csv = String::from("workload,bytes,huffman_ratio,gzip_ratio,lzma_ratio,zstd_ratio\n");
    for (name, data) in [
        ("text_4k", gen_text(4 * 1024, 1)),
        ("text_64k", gen_text(64 * 1024, 2)),
        ("random_64k", gen_bytes(64 * 1024, 3)),
    ] {
        let report = compare::compare_message(&data).unwrap();
        let fmt = |r: Option<f64>| r.map_or_else(String::new, |r| format!("{r:.4}"));
        csv.push_str(&format!(
            "{name},{},{:.4},{},{},{}\n",
            data.len(),
            report.huffman_ratio,
            fmt(report.gzip_ratio),
            fmt(report.lzma_ratio),
            fmt(report.zstd_ratio)
        ));
    }
    let out_dir = Path::new("target/criterion/custom_reports");
    let _ = fs::create_dir_all(out_dir);
    let _ = fs::write(out_dir.join("ratio_snapshot.csv"), csv);
}

fn bench_encoding_speed(c: &mut Criterion) {
    let mut g = c.benchmark_group("encoding_speed_mb_s");
    for size in [64 * 1024usize, 1024 * 1024, 8 * 1024 * 1024] {
        let text = gen_text(size, 1);
        g.throughput(Throughput::Bytes(size as u64));
        g.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let stream = huffman::encode(black_box(&text), &EncodeOptions::default()).unwrap();
                black_box(stream);
            });
        });
    }
    g.finish();
}

fn bench_decoding_speed(c: &mut Criterion) {
    let mut g = c.benchmark_group("decoding_speed_mb_s");
    for size in [64 * 1024usize, 1024 * 1024, 8 * 1024 * 1024] {
        let text = gen_text(size, 2);
        let bytes = huffman::encode(&text, &EncodeOptions::byte_framed())
            .unwrap()
            .to_bytes();
        g.throughput(Throughput::Bytes(size as u64));
        g.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let out = huffman::decode_bytes(black_box(&bytes)).unwrap();
                black_box(out);
            });
        });
    }
    g.finish();
}

fn bench_tree_build(c: &mut Criterion) {
    let mut g = c.benchmark_group("tree_build_vs_alphabet");
    let reserved: ReservedPrefix = "110".parse().unwrap();
    for (name, data) in [
        ("text", gen_text(256 * 1024, 4)),
        ("random_bytes", gen_bytes(256 * 1024, 5)),
    ] {
        let freq = FrequencyTable::from_bytes(&data);
        g.bench_function(BenchmarkId::new("plain", name), |b| {
            b.iter(|| black_box(tree::build(black_box(&freq), None).unwrap()));
        });
        g.bench_function(BenchmarkId::new("reserved", name), |b| {
            b.iter(|| black_box(tree::build(black_box(&freq), Some(&reserved)).unwrap()));
        });
    }
    g.finish();
}

fn bench_ratio_vs_baselines(c: &mut Criterion) {
    write_ratio_snapshot();
    let mut g = c.benchmark_group("compare_lines");
    let text = String::from_utf8(gen_text(256 * 1024, 6)).unwrap();
    g.throughput(Throughput::Bytes(text.len() as u64));
    g.bench_function("compare_lines", |b| {
        b.iter(|| {
            let reports = compare::compare_lines(black_box(&text)).unwrap();
            black_box(compare::summarize(&reports));
        });
    });
    g.finish();
}

fn bench_framing_overhead(c: &mut Criterion) {
    let mut g = c.benchmark_group("framing_overhead");
    let text = gen_text(1024 * 1024, 7);
    for (name, opts) in [
        ("default", EncodeOptions::default()),
        ("byte_framed", EncodeOptions::byte_framed()),
        (
            "reserved_11",
            EncodeOptions {
                reserved_prefix: Some("11".parse().unwrap()),
                ..Default::default()
            },
        ),
    ] {
        g.bench_function(name, |b| {
            b.iter(|| {
                let stream = huffman::encode(&text, &opts).unwrap();
                black_box(stream.bit_len());
            });
        });
    }
    g.finish();
}

criterion_group!(
    benches,
    bench_encoding_speed,
    bench_decoding_speed,
    bench_tree_build,
    bench_ratio_vs_baselines,
    bench_framing_overhead
);
criterion_main!(benches);
