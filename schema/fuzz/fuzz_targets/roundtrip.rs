#![no_main]

use arbitrary::Arbitrary;
use commonware_schema::{builtins, Codec, ObjectBuilder, Value};
use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;

#[derive(Arbitrary, Debug)]
enum Tag {
    Small(u8),
    Text(String),
    Missing,
}

#[derive(Arbitrary, Debug)]
struct Input {
    id: u32,
    name: String,
    scores: Vec<i16>,
    tag: Tag,
    big: u128,
    extra: Option<u16>,
}

fn codec() -> &'static Codec {
    static CODEC: OnceLock<Codec> = OnceLock::new();
    CODEC.get_or_init(|| {
        let b = builtins();
        ObjectBuilder::new()
            .field("id", &b.u32)
            .field("name", &b.string16)
            .field("scores", &b.i16.array())
            .field("tag", &Codec::union(vec![b.u8.clone(), b.string32.clone()]).nullable())
            .field("big", &b.ubi)
            .field("extra", &b.u16.default(7))
            .build()
    })
}

fuzz_target!(|input: Input| {
    let tag = match input.tag {
        Tag::Small(n) => Value::from(n),
        Tag::Text(s) => Value::from(s),
        Tag::Missing => Value::Null,
    };
    let mut fields = vec![
        ("id", Value::from(input.id)),
        ("name", Value::from(input.name)),
        (
            "scores",
            Value::Array(input.scores.into_iter().map(Value::from).collect()),
        ),
        ("tag", tag),
        ("big", Value::BigInt(input.big.into())),
    ];
    if let Some(extra) = input.extra {
        fields.push(("extra", Value::from(extra)));
    }
    let value = Value::object(fields);

    let codec = codec();
    let Ok(encoded) = codec.encode(&value) else {
        // Only names longer than a u16 prefix can hold are rejected
        return;
    };
    assert_eq!(codec.encode_size(&value).unwrap(), encoded.len());
    let decoded = codec
        .decode(&encoded)
        .expect("Failed to decode a successfully encoded input!");
    assert_eq!(decoded.get("id"), value.get("id"));
    assert_eq!(decoded.get("scores"), value.get("scores"));
    assert_eq!(decoded.get("big"), value.get("big"));
    assert!(decoded.get("extra").is_some());
});
