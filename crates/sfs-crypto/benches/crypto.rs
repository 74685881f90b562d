use sfs_core::RecordId;
use sfs_crypto::{Layout, MacKey, Seal, SealedRecord, SigningIdentity, SymmetricKey, Unseal};

fn make_data(size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| (i.wrapping_mul(7) ^ (i >> 3)) as u8)
        .collect()
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_seal_block(bencher: divan::Bencher, size: usize) {
    let id = RecordId::random();
    let key = SymmetricKey::generate();
    let mac = MacKey::generate();
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            SealedRecord::seal(
                divan::black_box(&id),
                divan::black_box(&data),
                divan::black_box(&key),
                Seal::Mac(&mac),
            )
            .unwrap()
        });
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_open_block(bencher: divan::Bencher, size: usize) {
    let id = RecordId::random();
    let key = SymmetricKey::generate();
    let mac = MacKey::generate();
    let data = make_data(size);
    let stored = SealedRecord::seal(&id, &data, &key, Seal::Mac(&mac))
        .unwrap()
        .to_bytes();
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            SealedRecord::parse(divan::black_box(&stored), Layout::Mac)
                .and_then(|r| r.open(&id, Unseal::Mac(&mac), &key))
                .unwrap()
        });
}

#[divan::bench(args = [256, 4096])]
fn bench_seal_signed(bencher: divan::Bencher, size: usize) {
    let id = RecordId::random();
    let key = SymmetricKey::generate();
    let identity = SigningIdentity::generate();
    let data = make_data(size);
    bencher.bench(|| {
        SealedRecord::seal(&id, divan::black_box(&data), &key, Seal::Signature(&identity)).unwrap()
    });
}

fn main() {
    divan::main();
}
