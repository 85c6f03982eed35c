use flyweight::field::Field;
use flyweight::header::HeaderLayout;
use flyweight::vardata::VarDataField;
use flyweight::{
    Block, BlockMut, ByteOrder, FlyweightResult, GroupLayout, MessageFlyweight, Template, Traverse,
};

const SAMPLE: Template = Template::new(1, 1, 0, 8);
const A: Field<u32> = Field::new(0, ByteOrder::LittleEndian);
const B: Field<i32> = Field::new(4, ByteOrder::LittleEndian);
const G: GroupLayout = GroupLayout::new(4, 0);
const G_VALUE: Field<u32> = Field::new(0, ByteOrder::LittleEndian);
const D: VarDataField = VarDataField::STANDARD;

fn encode(buf: &mut [u8]) -> FlyweightResult<usize> {
    let mut msg = MessageFlyweight::new(SAMPLE, buf);
    let root = msg.wrap_header_for_encode(0, &HeaderLayout::STANDARD)?;
    root.put(&A, 1)?;
    root.put(&B, 2)?;
    let mut g = msg.group_for_encode(&G, 3)?;
    for v in [10, 20, 30] {
        g.next()?.put(&G_VALUE, v)?;
    }
    msg.put_var_data(&D, b"hello")?;
    Ok(HeaderLayout::STANDARD.size + msg.size())
}

fn decode(buf: &[u8]) -> FlyweightResult<()> {
    let mut msg = MessageFlyweight::new(SAMPLE, buf);
    let header = msg.wrap_header_for_decode(0, &HeaderLayout::STANDARD)?;
    println!("{header:?}");
    println!("a = {}, b = {}", msg.get(&A)?, msg.get(&B)?);
    let mut g = msg.group(&G)?;
    while g.has_next() {
        let element = g.next()?;
        println!("g[{:?}] = {}", element.index(), element.get(&G_VALUE)?);
    }
    let d = msg.var_data(&D)?;
    println!("d = {:?}", String::from_utf8_lossy(d));
    println!("size = {}", msg.size());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut buf = [0u8; 64];
    let len = encode(&mut buf)?;
    let hex: String = buf[..len].iter().map(|b| format!("{b:02x}")).collect();
    println!("{hex}");
    decode(&buf[..len])?;
    Ok(())
}
