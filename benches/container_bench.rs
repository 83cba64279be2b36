use criterion::{black_box, criterion_group, criterion_main, Criterion};
use stunres::codec::{BitmapResource, Resource, TextResource};
use stunres::io_stream::{to_bytes, ResourceReader};
use stunres::{ResourceId, ResourceSet, TypeMap};

fn build_set(records: usize) -> (ResourceSet, TypeMap) {
    let mut set = ResourceSet::new();
    let mut types = TypeMap::new();
    for i in 0..records {
        let id = ResourceId::new(&format!("{i:04}"));
        let resource = if i % 4 == 0 {
            let bmp = BitmapResource::new(64, 48, vec![(i % 256) as u8; 64 * 48]).unwrap();
            Resource::Bitmap(bmp)
        } else {
            Resource::Text(TextResource::from(format!("record number {i}").as_str()))
        };
        types.insert(id, resource.type_tag().name());
        set.push(id, resource).unwrap();
    }
    (set, types)
}

fn bench_write(c: &mut Criterion) {
    let (set, _) = build_set(500);
    c.bench_function("write_500_records", |b| b.iter(|| to_bytes(black_box(&set)).unwrap()));
}

fn bench_parse(c: &mut Criterion) {
    let (set, types) = build_set(500);
    let bytes = to_bytes(&set).unwrap();
    let reader = ResourceReader::new(&types);
    c.bench_function("parse_500_records", |b| {
        b.iter(|| reader.read_bytes(black_box(&bytes)).unwrap())
    });
}

criterion_group!(benches, bench_write, bench_parse);
criterion_main!(benches);
