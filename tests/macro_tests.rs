use recon_codec::{recon, Item, Number, Record, Value};

#[test]
fn test_recon_macro_extant() {
    let value = recon!(extant);
    assert_eq!(value, Value::Extant);
    assert_eq!(value.to_string(), "");
}

#[test]
fn test_recon_macro_booleans() {
    assert_eq!(recon!(true), Value::Boolean(true));
    assert_eq!(recon!(false), Value::Boolean(false));
}

#[test]
fn test_recon_macro_numbers() {
    assert_eq!(recon!(42), Value::Number(Number::Int32(42)));
    assert_eq!(recon!(3.5), Value::Number(Number::Float64(3.5)));
    assert_eq!(recon!(-123), Value::Number(Number::Int32(-123)));
    assert_eq!(recon!(1i64 << 40), Value::Number(Number::Int64(1 << 40)));
}

#[test]
fn test_recon_macro_text() {
    assert_eq!(recon!("hello world"), Value::Text("hello world".to_string()));
    assert_eq!(recon!(""), Value::Text(String::new()));

    let name = String::from("Ada");
    assert_eq!(recon!(name), Value::from("Ada"));
}

#[test]
fn test_recon_macro_items() {
    assert_eq!(recon!([]), Value::Record(Record::new()));

    let mixed = recon!([1, "hello", true, extant]);
    assert_eq!(
        mixed,
        Value::from_items([
            Value::from(1),
            Value::from("hello"),
            Value::Boolean(true),
            Value::Extant,
        ])
    );
    assert_eq!(mixed.to_string(), "{1,hello,true,}");
}

#[test]
fn test_recon_macro_slots() {
    assert_eq!(recon!({}), Value::Record(Record::new()));

    let value = recon!({
        "name": "Alice",
        "age": 30
    });
    let record = value.as_record().unwrap();
    assert_eq!(record.len(), 2);
    assert_eq!(record.get("name"), Some(&Value::from("Alice")));
    assert_eq!(record.get("age"), Some(&Value::from(30)));
}

#[test]
fn test_recon_macro_non_text_keys() {
    let value = recon!({ 1: "one", true: extant, extant: "anything" });
    let record = value.as_record().unwrap();
    assert_eq!(record.items[0], Item::slot(1, "one"));
    assert_eq!(record.items[1], Item::slot(true, Value::Extant));
    assert_eq!(record.items[2], Item::slot(Value::Extant, "anything"));
    assert_eq!(value.to_string(), "{1:one,true:,:anything}");
}

#[test]
fn test_recon_macro_nested() {
    let nested = recon!({
        "user": {
            "id": 123,
            "name": "Bob",
            "active": true
        },
        "tags": ["admin", "developer"],
        "count": 42
    });

    let record = nested.as_record().unwrap();
    assert_eq!(record.len(), 3);

    let user = record.get("user").and_then(Value::as_record).unwrap();
    assert_eq!(user.get("id"), Some(&Value::from(123)));
    assert_eq!(user.get("name"), Some(&Value::from("Bob")));
    assert_eq!(user.get("active"), Some(&Value::Boolean(true)));

    let tags = record.get("tags").and_then(Value::as_record).unwrap();
    assert_eq!(tags.items, vec![Item::value("admin"), Item::value("developer")]);

    assert_eq!(record.get("count").and_then(Value::as_i64), Some(42));
    assert_eq!(
        nested.to_string(),
        "{user:{id:123,name:Bob,active:true},tags:{admin,developer},count:42}"
    );
}

#[test]
fn test_recon_macro_matches_parsed_text() {
    let built = recon!({ "a": [1, 2], "b": { "c": "two words" } });
    let parsed: Value = "{a:{1,2},b:{c:\"two words\"}}".parse().unwrap();
    assert_eq!(built, parsed);
}

#[test]
fn test_value_accessors() {
    let text = recon!("hello");
    assert_eq!(text.as_str(), Some("hello"));
    assert_eq!(text.as_bool(), None);
    assert_eq!(text.kind(), "text");

    let flag = recon!(true);
    assert_eq!(flag.as_bool(), Some(true));
    assert_eq!(flag.kind(), "boolean");

    let items = recon!([1, 2, 3]);
    assert_eq!(items.as_record().map(Record::len), Some(3));
    assert_eq!(items.kind(), "record");

    assert_eq!(recon!(extant).kind(), "extant");
    assert_eq!(recon!(2.5).as_f64(), Some(2.5));
}
