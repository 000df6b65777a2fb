use bitlayout::{
    schema::{array, bit, bitfield, byte, field, nibble, padding, sequence},
    Node,
};
use criterion::{Criterion, criterion_group, criterion_main};

fn gen_schema(record_count: usize) -> Node {
    let record = sequence([
        field("flag", bit()),
        field("mode", bitfield(3).unwrap()),
        field("level", nibble()),
        field("delay", bitfield(12).unwrap()),
        padding(4).into(),
        field("id", byte()),
    ])
    .unwrap();

    sequence([field("records", array(record_count, record))]).unwrap()
}

fn gen_packet(record_count: usize) -> Vec<u8> {
    let total_bytes = record_count * 4;
    let mut data = Vec::with_capacity(total_bytes);

    // Deterministic but non-trivial pattern
    for i in 0..total_bytes {
        data.push((i * 31 % 256) as u8);
    }

    data
}

fn bench_decode(c: &mut Criterion) {
    for &record_count in &[1usize, 10, 100, 1000] {
        let schema = gen_schema(record_count);
        let packet = gen_packet(record_count);

        c.bench_function(&format!("decode_{}_records", record_count), |b| {
            b.iter(|| {
                let _ = bitlayout::decode(&schema, &packet).unwrap();
            })
        });
    }
}

fn bench_encode(c: &mut Criterion) {
    for &record_count in &[1usize, 10, 100, 1000] {
        let schema = gen_schema(record_count);
        let value = bitlayout::decode(&schema, &gen_packet(record_count)).unwrap();

        c.bench_function(&format!("encode_{}_records", record_count), |b| {
            b.iter(|| {
                let _ = bitlayout::encode(&schema, &value).unwrap();
            })
        });
    }
}

criterion_group!(benches, bench_decode, bench_encode);
criterion_main!(benches);
