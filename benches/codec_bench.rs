use criterion::{black_box, criterion_group, criterion_main, Criterion};

use flyweight::field::{ArrayField, Field};
use flyweight::{Block, BlockMut, ByteOrder, MessageFlyweight, Template};

const TEMPLATE: Template = Template::new(1, 1, 0, 40);
const SERIAL: Field<u64> = Field::new(0, ByteOrder::LittleEndian);
const PRICE: Field<f64> = Field::new(8, ByteOrder::BigEndian);
const QTY: Field<i32> = Field::new(16, ByteOrder::LittleEndian);
const VIN: ArrayField<u8, 17> = ArrayField::chars(20, 0, 0, "US-ASCII");

fn encode_bench(c: &mut Criterion) {
    let mut buf = vec![0u8; 64];
    c.bench_function("root_block_encode", |b| {
        b.iter(|| {
            let mut msg = MessageFlyweight::new(TEMPLATE, &mut buf[..]);
            let msg = msg.wrap_for_encode(0).unwrap();
            msg.put(&SERIAL, black_box(1234)).unwrap();
            msg.put(&PRICE, black_box(99.5)).unwrap();
            msg.put(&QTY, black_box(-7)).unwrap();
            msg.put_bytes(&VIN, black_box(b"abcdefghijklmnopq")).unwrap();
        })
    });
}

fn decode_bench(c: &mut Criterion) {
    let mut buf = vec![0u8; 64];
    {
        let mut msg = MessageFlyweight::new(TEMPLATE, &mut buf[..]);
        let msg = msg.wrap_for_encode(0).unwrap();
        msg.put(&SERIAL, 1234).unwrap();
        msg.put(&PRICE, 99.5).unwrap();
        msg.put(&QTY, -7).unwrap();
    }
    c.bench_function("root_block_decode", |b| {
        b.iter(|| {
            let mut msg = MessageFlyweight::new(TEMPLATE, &buf[..]);
            let msg = msg.wrap_for_decode(0, 40, 0).unwrap();
            let mut vin = [0u8; 17];
            black_box((
                msg.get(&SERIAL).unwrap(),
                msg.get(&PRICE).unwrap(),
                msg.get(&QTY).unwrap(),
                msg.get_bytes(&VIN, &mut vin).unwrap(),
            ))
        })
    });
}

criterion_group! {
    name = codec_benches;
    config = Criterion::default();
    targets = encode_bench, decode_bench
}

criterion_main!(codec_benches);
