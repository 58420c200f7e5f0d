use recon_codec::{
    parse_value, to_string, to_string_with_options, Error, Number, Record, ReconOptions,
    Separator, Value,
};

fn parse(text: &str) -> Value {
    parse_value(text).unwrap_or_else(|e| panic!("{:?} failed to parse: {}", text, e))
}

fn number(text: &str) -> Number {
    match parse(text) {
        Value::Number(n) => n,
        other => panic!("{:?} is not a number: {:?}", text, other),
    }
}

#[test]
fn test_integer_widths() {
    assert!(matches!(number("2147483647"), Number::Int32(_)));
    assert!(matches!(number("-2147483648"), Number::Int32(_)));
    assert!(matches!(number("2147483648"), Number::Int64(_)));
    assert!(matches!(number("-9223372036854775808"), Number::Int64(_)));
    assert!(matches!(number("9223372036854775808"), Number::BigInt(_)));
    assert!(matches!(number("0x7F"), Number::Int32(127)));
}

#[test]
fn test_floats() {
    assert!(matches!(number("1.5"), Number::Float64(_)));
    assert!(matches!(number("1e3"), Number::Float64(_)));
    assert!(matches!(number("-0.25e-2"), Number::Float64(_)));
    assert!(matches!(number("3.14159265358979323846"), Number::BigDecimal(_)));
    assert!(matches!(number("nan"), Number::Float64(n) if n.is_nan()));
    assert!(matches!(number("inf"), Number::Float64(n) if n == f64::INFINITY));

    // Whole floats keep a fraction so they read back as floats.
    assert_eq!(to_string(&2.0f64).unwrap(), "2.0");
    assert!(matches!(number(&to_string(&2.0f64).unwrap()), Number::Float64(_)));
}

#[test]
fn test_text_forms() {
    assert_eq!(parse("hello_world-2"), Value::from("hello_world-2"));
    assert_eq!(parse("\"two words\""), Value::from("two words"));
    assert_eq!(parse(r#""q\"b\\s\/n\nt\tuA""#), Value::from("q\"b\\s/n\nt\tuA"));

    assert_eq!(to_string("plain").unwrap(), "plain");
    assert_eq!(to_string("false").unwrap(), "\"false\"");
    assert_eq!(to_string("nan").unwrap(), "\"nan\"");
    assert_eq!(to_string("1st").unwrap(), "\"1st\"");
    assert_eq!(to_string("a\"b").unwrap(), "\"a\\\"b\"");
}

#[test]
fn test_blobs() {
    assert_eq!(parse("%AQID"), Value::Blob(vec![1, 2, 3]));
    assert_eq!(parse("%AAA="), Value::Blob(vec![0, 0]));
    assert_eq!(to_string(&Value::Blob(vec![1, 2, 3])).unwrap(), "%AQID");
    assert!(parse_value("%AAB=").is_err());
    assert!(parse_value("%AQI").is_err());
}

#[test]
fn test_attribute_values() {
    let record = match parse("@a @b() @c(1) @d(1,2) @e(k:v) @f({1})") {
        Value::Record(record) => record,
        other => panic!("expected a record, got {:?}", other),
    };
    let values: Vec<&Value> = record.attrs.iter().map(|attr| &attr.value).collect();
    assert_eq!(values[0], &Value::Extant);
    assert_eq!(values[1], &Value::Extant);
    assert_eq!(values[2], &Value::from(1));
    assert_eq!(values[3], &Value::from_items([1, 2]));
    assert_eq!(values[4], &Value::from_slots([("k", "v")]));
    assert_eq!(values[5], &Value::from_items([1]));
    assert!(record.items.is_empty());
}

#[test]
fn test_empty_items() {
    assert_eq!(parse("{1,,2}"), Value::from_items([Value::from(1), Value::Extant, Value::from(2)]));
    assert_eq!(parse("{1,}"), Value::from_items([Value::from(1), Value::Extant]));
    assert_eq!(parse("{a:}"), Value::from_slots([("a", Value::Extant)]));
    assert_eq!(parse("{:b}"), Value::from_slots([(Value::Extant, Value::from("b"))]));
    assert_eq!(parse("{\n1\n\n2\n}"), Value::from_items([1, 2]));
}

#[test]
fn test_single_extant_item_has_no_text_form() {
    let value = Value::from_items([Value::Extant]);
    assert!(matches!(to_string(&value), Err(Error::Encode(_))));
}

#[test]
fn test_documents() {
    assert_eq!(parse(""), Value::Extant);
    assert_eq!(parse("  \n\t "), Value::Extant);
    assert_eq!(parse("\n  42  \n"), Value::from(42));
    assert!(matches!(parse_value("1 2"), Err(Error::Syntax(_))));
    assert!(matches!(parse_value("{1}}"), Err(Error::Syntax(_))));
}

#[test]
fn test_syntax_error_locations() {
    let err = parse_value("{a: 1,\n b: \"open").unwrap_err();
    assert!(matches!(err, Error::Syntax(_)));
    assert_eq!(err.location().map(|l| l.line), Some(2));

    let err = parse_value("{\n\n  1 2}").unwrap_err();
    assert_eq!(err.location().map(|l| l.line), Some(3));
}

#[test]
fn test_nesting_limit() {
    let options = ReconOptions::new().with_max_depth(3);
    assert!(recon_codec::parse_value_with_options("{{{1}}}", &options).is_ok());
    assert!(recon_codec::parse_value_with_options("{{{{1}}}}", &options).is_err());
}

#[test]
fn test_canonical_text_round_trips() {
    for text in [
        "",
        "0",
        "-12",
        "2.5",
        "abc",
        "\"a b\"",
        "%AQID",
        "{}",
        "{1,2,3}",
        "{a:1,b:{c:true}}",
        "@tag",
        "@tag(1)",
        "@tag(a:1,b:2){x}",
        "@a(@b(1){2}){@c{3}}",
        "{1,,2}",
        "{a:,:b}",
        "{nan,inf,-inf}",
    ] {
        let value = parse(text);
        assert_eq!(to_string(&value).unwrap(), text, "printing {:?}", text);
        assert_eq!(value.to_string(), text);
    }
}

#[test]
fn test_slot_records_reprint() {
    for text in ["@point{x:1,y:2}", "{a:1}", "@update(key:a,value:1)", "{x:1,2}"] {
        let value = parse(text);
        let printed = to_string(&value).unwrap();
        assert_eq!(printed, text);
        assert_eq!(parse(&printed), value);
    }
}

#[test]
fn test_newline_separator_round_trips() {
    let options = ReconOptions::new().with_separator(Separator::Newline);
    let value = parse("{a:1,b:{2,3},,4}");
    let text = to_string_with_options(&value, &options).unwrap();
    assert!(text.contains('\n'));
    assert_eq!(parse(&text), value);
}

#[test]
fn test_records_keep_order() {
    let value = parse("@first @second {z:1,a:2,m:3}");
    let record: &Record = value.as_record().unwrap();
    let names: Vec<&str> = record.attrs.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["first", "second"]);
    let keys: Vec<String> = record
        .items
        .iter()
        .map(|item| match item {
            recon_codec::Item::Slot(key, _) => key.to_string(),
            recon_codec::Item::ValueItem(value) => value.to_string(),
        })
        .collect();
    assert_eq!(keys, ["z", "a", "m"]);
}
