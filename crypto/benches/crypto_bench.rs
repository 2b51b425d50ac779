use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ethers::signers::LocalWallet;

fn keccak_bench(c: &mut Criterion) {
    let data = [0xABu8; 256];

    c.bench_function("keccak256_256B", |b| {
        b.iter(|| quill_crypto::keccak256(black_box(&data)))
    });
}

fn base36_digest_bench(c: &mut Criterion) {
    let digest = quill_crypto::keccak256(b"digest");

    c.bench_function("base36_32B", |b| {
        b.iter(|| quill_crypto::encode_base36(black_box(&digest)))
    });
}

fn article_dna_bench(c: &mut Criterion) {
    let signature_hex = "ab".repeat(65);

    c.bench_function("article_dna", |b| {
        b.iter(|| quill_crypto::article_dna(black_box(&signature_hex), black_box("0x01")))
    });
}

fn recover_signer_bench(c: &mut Criterion) {
    let wallet: LocalWallet = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318"
        .parse()
        .unwrap();
    let sig = quill_crypto::sign_personal(&wallet, "A1G1").unwrap();

    c.bench_function("recover_signer", |b| {
        b.iter(|| quill_crypto::recover_signer(black_box("A1G1"), black_box(&sig)))
    });
}

criterion_group!(
    benches,
    keccak_bench,
    base36_digest_bench,
    article_dna_bench,
    recover_signer_bench
);
criterion_main!(benches);
