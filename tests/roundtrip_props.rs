use proptest::collection::{btree_map, vec};
use proptest::prelude::*;

use stunres::codec::{BitmapResource, Resource, TextResource};
use stunres::io_stream::{to_bytes, ResourceReader};
use stunres::{ResourceId, ResourceSet, TypeMap};

fn resource() -> impl Strategy<Value = Resource> {
    prop_oneof![
        vec(1u8..=255, 0..64).prop_map(|b| Resource::Text(TextResource::new(b))),
        (0u16..12, 0u16..12, any::<[u8; 4]>(), any::<u16>(), any::<u16>()).prop_flat_map(
            |(w, h, unknown1, x, y)| {
                vec(any::<u8>(), w as usize * h as usize).prop_map(move |pixels| {
                    let mut bmp = BitmapResource::new(w, h, pixels).unwrap();
                    bmp.unknown1 = unknown1;
                    bmp.x = x;
                    bmp.y = y;
                    Resource::Bitmap(bmp)
                })
            }
        ),
    ]
}

fn resource_set() -> impl Strategy<Value = ResourceSet> {
    btree_map(any::<[u8; 4]>(), resource(), 0..12).prop_map(|records| {
        let mut set = ResourceSet::new();
        for (id, resource) in records {
            // Distinct raw keys can name the same id once cut at the first NUL.
            let id = ResourceId::from_bytes(id);
            if !set.contains(&id) {
                set.push(id, resource).unwrap();
            }
        }
        set
    })
}

fn registry_for(set: &ResourceSet) -> TypeMap {
    set.iter()
        .map(|(id, r)| (*id, r.type_tag().name().to_owned()))
        .collect()
}

proptest! {
    #[test]
    fn written_sets_parse_back_identically(set in resource_set()) {
        let bytes = to_bytes(&set).unwrap();
        prop_assert_eq!(bytes.len() as u32, u32::from_le_bytes(bytes[0..4].try_into().unwrap()));

        let types = registry_for(&set);
        let parsed = ResourceReader::new(&types).read_bytes(&bytes).unwrap();
        prop_assert_eq!(parsed.ids(), set.ids());
        prop_assert_eq!(&parsed, &set);
        prop_assert_eq!(to_bytes(&parsed).unwrap(), bytes);
    }

    #[test]
    fn arbitrary_bytes_never_panic(bytes in vec(any::<u8>(), 0..128)) {
        let types: TypeMap = [(ResourceId::new("text"), "text".to_owned())].into_iter().collect();
        let _ = ResourceReader::new(&types).read_bytes(&bytes);
    }
}
