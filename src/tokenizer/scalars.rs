//! Sub-parsers for scalar tokens: identifiers, quoted strings, numbers and
//! blobs.

use crate::error::SyntaxError;
use crate::event::ReadEvent;
use crate::input::{Cursor, Empty};
use crate::parser::{
    alt, literal, stateful, take_while0, take_while1, Alt, AndThen, Either, Literal, Parse,
    Parser, Stateful, TakeWhile, TryMap,
};
use crate::value::Number;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use std::str::FromStr;

/// Floats with more significant digits than this are read as big decimals.
pub const MAX_FLOAT_DIGITS: usize = 17;

type CharClass = fn(char) -> bool;

pub fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

pub fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn is_hex_digit(c: char) -> bool {
    c.is_ascii_hexdigit()
}

fn is_blob_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '='
}

/// Bare words that read as something other than text.
#[must_use]
pub fn is_keyword(text: &str) -> bool {
    matches!(text, "true" | "false" | "nan" | "inf")
}

/// Whether `text` can be written as a bare identifier.
///
/// ```rust
/// use recon_codec::tokenizer::is_identifier;
///
/// assert!(is_identifier("hello_world"));
/// assert!(is_identifier("a-b"));
/// assert!(!is_identifier("1a"));
/// assert!(!is_identifier(""));
/// ```
#[must_use]
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => is_ident_start(first) && chars.all(is_ident_char),
        None => false,
    }
}

pub type IdentParser = TakeWhile<CharClass>;

pub fn ident() -> IdentParser {
    take_while1(is_ident_char as CharClass, "an identifier")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum StringStage {
    #[default]
    Open,
    Body,
    Escape,
    Unicode {
        code: u32,
        digits: u8,
    },
}

#[derive(Debug, Clone, Default)]
pub struct StringState {
    text: String,
    stage: StringStage,
}

pub type StringParser =
    Stateful<StringState, fn(StringState, &mut Cursor<'_>) -> Parse<StringState, String>>;

/// A double-quoted string with backslash escapes.
pub fn quoted_string() -> StringParser {
    stateful(
        StringState::default(),
        string_step as fn(StringState, &mut Cursor<'_>) -> Parse<StringState, String>,
    )
}

fn string_step(mut state: StringState, input: &mut Cursor<'_>) -> Parse<StringState, String> {
    loop {
        let c = match input.head() {
            Ok(c) => c,
            Err(Empty::Pending) => return Parse::Continue(state),
            Err(Empty::Done) => {
                return Parse::Error(SyntaxError::new("unterminated string", input.location()))
            }
            Err(Empty::Malformed) => {
                return Parse::Error(SyntaxError::new("invalid UTF-8", input.location()))
            }
        };
        match state.stage {
            StringStage::Open => {
                if c != '"' {
                    return Parse::Error(SyntaxError::new(
                        format!("expected '\"', found '{}'", c),
                        input.location(),
                    ));
                }
                state.stage = StringStage::Body;
            }
            StringStage::Body => match c {
                '"' => {
                    input.step();
                    return Parse::Done(state.text);
                }
                '\\' => state.stage = StringStage::Escape,
                c => state.text.push(c),
            },
            StringStage::Escape => {
                state.stage = StringStage::Body;
                match c {
                    '"' | '\\' | '/' => state.text.push(c),
                    'n' => state.text.push('\n'),
                    'r' => state.text.push('\r'),
                    't' => state.text.push('\t'),
                    'b' => state.text.push('\u{8}'),
                    'f' => state.text.push('\u{c}'),
                    'u' => state.stage = StringStage::Unicode { code: 0, digits: 0 },
                    other => {
                        return Parse::Error(SyntaxError::new(
                            format!("invalid escape '\\{}'", other),
                            input.location(),
                        ))
                    }
                }
            }
            StringStage::Unicode { code, digits } => {
                let Some(digit) = c.to_digit(16) else {
                    return Parse::Error(SyntaxError::new(
                        format!("expected hex digit in unicode escape, found '{}'", c),
                        input.location(),
                    ));
                };
                let code = code * 16 + digit;
                if digits == 3 {
                    match char::from_u32(code) {
                        Some(decoded) => {
                            state.text.push(decoded);
                            state.stage = StringStage::Body;
                        }
                        None => {
                            return Parse::Error(SyntaxError::new(
                                format!("invalid unicode escape '\\u{:04x}'", code),
                                input.location(),
                            ))
                        }
                    }
                } else {
                    state.stage = StringStage::Unicode {
                        code,
                        digits: digits + 1,
                    };
                }
            }
        }
        input.step();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum DecimalStage {
    #[default]
    Start,
    AfterSign,
    Integer,
    Dot,
    Fraction,
    ExponentStart,
    ExponentSign,
    Exponent,
    Infinity(u8),
}

#[derive(Debug, Clone, Default)]
pub struct DecimalState {
    text: String,
    stage: DecimalStage,
}

pub type DecimalParser =
    Stateful<DecimalState, fn(DecimalState, &mut Cursor<'_>) -> Parse<DecimalState, Number>>;

pub fn decimal() -> DecimalParser {
    stateful(
        DecimalState::default(),
        decimal_step as fn(DecimalState, &mut Cursor<'_>) -> Parse<DecimalState, Number>,
    )
}

fn decimal_step(mut state: DecimalState, input: &mut Cursor<'_>) -> Parse<DecimalState, Number> {
    use DecimalStage as D;
    const INF: [char; 3] = ['i', 'n', 'f'];
    loop {
        let head = match input.head() {
            Ok(c) => Some(c),
            Err(Empty::Pending) => return Parse::Continue(state),
            Err(Empty::Done) => None,
            Err(Empty::Malformed) => {
                return Parse::Error(SyntaxError::new("invalid UTF-8", input.location()))
            }
        };
        let next = match (state.stage, head) {
            (D::Start, Some('-')) => D::AfterSign,
            (D::Start | D::AfterSign | D::Integer, Some(c)) if c.is_ascii_digit() => D::Integer,
            (D::AfterSign, Some('i')) => D::Infinity(1),
            (D::Integer, Some('x' | 'X')) => {
                return Parse::Error(SyntaxError::new(
                    "hexadecimal digits in decimal number",
                    input.location(),
                ))
            }
            (D::Integer, Some('.')) => D::Dot,
            (D::Integer | D::Fraction, Some('e' | 'E')) => D::ExponentStart,
            (D::Dot | D::Fraction, Some(c)) if c.is_ascii_digit() => D::Fraction,
            (D::ExponentStart, Some('+' | '-')) => D::ExponentSign,
            (D::ExponentStart | D::ExponentSign | D::Exponent, Some(c)) if c.is_ascii_digit() => {
                D::Exponent
            }
            (D::Integer | D::Fraction | D::Exponent, _) => {
                return match decimal_number(&state.text) {
                    Ok(number) => Parse::Done(number),
                    Err(cause) => Parse::Error(SyntaxError::new(cause, input.location())),
                }
            }
            (D::Infinity(n), Some(c)) if n < 3 && c == INF[usize::from(n)] => D::Infinity(n + 1),
            (D::Infinity(3), Some(c)) if is_ident_char(c) => {
                return Parse::Error(SyntaxError::new(
                    format!("unexpected '{}' after '-inf'", c),
                    input.location(),
                ))
            }
            (D::Infinity(3), _) => return Parse::Done(Number::Float64(f64::NEG_INFINITY)),
            (_, Some(c)) => {
                return Parse::Error(SyntaxError::new(
                    format!("unexpected '{}' in number", c),
                    input.location(),
                ))
            }
            (_, None) => {
                return Parse::Error(SyntaxError::new(
                    "unexpected end of input in number",
                    input.location(),
                ))
            }
        };
        if let Some(c) = head {
            state.text.push(c);
        }
        state.stage = next;
        input.step();
    }
}

fn significant_digits(text: &str) -> usize {
    let mantissa = text.split(['e', 'E']).next().unwrap_or(text);
    mantissa
        .chars()
        .filter(char::is_ascii_digit)
        .skip_while(|c| *c == '0')
        .count()
}

/// Reads decimal text as the narrowest fitting number.
pub(crate) fn decimal_number(text: &str) -> Result<Number, String> {
    if !text.contains(['.', 'e', 'E']) {
        if let Ok(n) = text.parse::<i32>() {
            return Ok(Number::Int32(n));
        }
        if let Ok(n) = text.parse::<i64>() {
            return Ok(Number::Int64(n));
        }
        return BigInt::from_str(text)
            .map(Number::BigInt)
            .map_err(|err| format!("invalid integer '{}': {}", text, err));
    }
    if significant_digits(text) > MAX_FLOAT_DIGITS {
        BigDecimal::from_str(text)
            .map(Number::BigDecimal)
            .map_err(|err| format!("invalid decimal '{}': {}", text, err))
    } else {
        text.parse::<f64>()
            .map(Number::Float64)
            .map_err(|err| format!("invalid float '{}': {}", text, err))
    }
}

type DigitsAfterPrefix = AndThen<Literal, fn(&'static str) -> TakeWhile<CharClass>, TakeWhile<CharClass>>;

pub type HexParser = TryMap<DigitsAfterPrefix, fn(String) -> Result<Number, String>>;

fn hex_digits(_prefix: &'static str) -> TakeWhile<CharClass> {
    take_while1(is_hex_digit as CharClass, "hexadecimal digits")
}

fn hex_number(digits: String) -> Result<Number, String> {
    match u64::from_str_radix(&digits, 16) {
        Ok(n) => Ok(match i32::try_from(n) {
            Ok(small) => Number::Int32(small),
            Err(_) => Number::from(n),
        }),
        Err(_) => BigInt::parse_bytes(digits.as_bytes(), 16)
            .map(Number::BigInt)
            .ok_or_else(|| format!("invalid hexadecimal number '{}'", digits)),
    }
}

/// `0x` followed by hexadecimal digits.
pub fn hex() -> HexParser {
    literal("0x")
        .and_then(hex_digits as fn(&'static str) -> TakeWhile<CharClass>)
        .try_map(hex_number as fn(String) -> Result<Number, String>)
}

pub type NumberParser = Alt<Either<HexParser, DecimalParser>>;

/// Hexadecimal or decimal numbers, decided by alternation.
pub fn number() -> NumberParser {
    alt([Either::Left(hex()), Either::Right(decimal())])
}

pub type BlobParser = TryMap<DigitsAfterPrefix, fn(String) -> Result<Vec<u8>, String>>;

fn blob_chars(_prefix: &'static str) -> TakeWhile<CharClass> {
    take_while0(is_blob_char as CharClass)
}

fn decode_blob(text: String) -> Result<Vec<u8>, String> {
    STANDARD
        .decode(text.as_bytes())
        .map_err(|err| format!("invalid blob: {}", err))
}

/// `%` followed by standard padded base64.
pub fn blob() -> BlobParser {
    literal("%")
        .and_then(blob_chars as fn(&'static str) -> TakeWhile<CharClass>)
        .try_map(decode_blob as fn(String) -> Result<Vec<u8>, String>)
}

/// A scalar token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Quoted(String),
    Number(Number),
    Blob(Vec<u8>),
}

impl Token {
    pub fn into_event(self) -> ReadEvent {
        match self {
            Token::Ident(word) => match word.as_str() {
                "true" => ReadEvent::Boolean(true),
                "false" => ReadEvent::Boolean(false),
                "nan" => ReadEvent::Number(Number::Float64(f64::NAN)),
                "inf" => ReadEvent::Number(Number::Float64(f64::INFINITY)),
                _ => ReadEvent::Text(word),
            },
            Token::Quoted(text) => ReadEvent::Text(text),
            Token::Number(n) => ReadEvent::Number(n),
            Token::Blob(bytes) => ReadEvent::Blob(bytes),
        }
    }

    /// The token as an attribute name, if it is text.
    pub fn into_name(self) -> Option<String> {
        match self {
            Token::Ident(name) | Token::Quoted(name) => Some(name),
            _ => None,
        }
    }
}

/// A scalar parser chosen by the token's first character.
#[derive(Clone)]
pub enum Scalar {
    Ident(IdentParser),
    Quoted(StringParser),
    Number(NumberParser),
    Blob(BlobParser),
}

impl Scalar {
    /// Selects the parser for a token starting with `c`.
    pub fn start(c: char) -> Option<Scalar> {
        match c {
            '"' => Some(Scalar::Quoted(quoted_string())),
            '%' => Some(Scalar::Blob(blob())),
            '-' | '0'..='9' => Some(Scalar::Number(number())),
            c if is_ident_start(c) => Some(Scalar::Ident(ident())),
            _ => None,
        }
    }

    /// Selects the parser for an attribute name starting with `c`.
    pub fn start_name(c: char) -> Option<Scalar> {
        match c {
            '"' => Some(Scalar::Quoted(quoted_string())),
            c if is_ident_start(c) => Some(Scalar::Ident(ident())),
            _ => None,
        }
    }
}

fn lift<P: Parser>(
    parse: Parse<P, P::Output>,
    wrap: fn(P) -> Scalar,
    token: fn(P::Output) -> Token,
) -> Parse<Scalar, Token> {
    match parse {
        Parse::Continue(parser) => Parse::Continue(wrap(parser)),
        Parse::Done(output) => Parse::Done(token(output)),
        Parse::Error(err) => Parse::Error(err),
    }
}

impl Parser for Scalar {
    type Output = Token;

    fn feed(self, input: &mut Cursor<'_>) -> Parse<Self, Token> {
        match self {
            Scalar::Ident(p) => lift(p.feed(input), Scalar::Ident, Token::Ident),
            Scalar::Quoted(p) => lift(p.feed(input), Scalar::Quoted, Token::Quoted),
            Scalar::Number(p) => lift(p.feed(input), Scalar::Number, Token::Number),
            Scalar::Blob(p) => lift(p.feed(input), Scalar::Blob, Token::Blob),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_complete;

    fn read_number(text: &str) -> Number {
        parse_complete(number(), text).unwrap()
    }

    #[test]
    fn test_integers_take_narrowest_width() {
        assert!(matches!(read_number("42"), Number::Int32(42)));
        assert!(matches!(read_number("-7"), Number::Int32(-7)));
        assert!(matches!(read_number("4294967296"), Number::Int64(4_294_967_296)));
        assert!(matches!(
            read_number("123456789012345678901234567890"),
            Number::BigInt(_)
        ));
    }

    #[test]
    fn test_floats_and_big_decimals() {
        assert!(matches!(read_number("1.5"), Number::Float64(f) if f == 1.5));
        assert!(matches!(read_number("-2e3"), Number::Float64(f) if f == -2000.0));
        assert!(matches!(read_number("1.25E-2"), Number::Float64(f) if f == 0.0125));
        assert!(matches!(
            read_number("3.14159265358979323846"),
            Number::BigDecimal(_)
        ));
        assert!(matches!(read_number("0.000000000000000001"), Number::Float64(_)));
        assert!(matches!(read_number("-inf"), Number::Float64(f) if f == f64::NEG_INFINITY));
    }

    #[test]
    fn test_hexadecimal() {
        assert!(matches!(read_number("0xff"), Number::Int32(255)));
        assert!(matches!(read_number("0xFFFFFFFF"), Number::Int64(4_294_967_295)));
        assert!(matches!(
            read_number("0x1FFFFFFFFFFFFFFFF"),
            Number::BigInt(_)
        ));
        assert!(parse_complete(number(), "0x").is_err());
    }

    #[test]
    fn test_malformed_numbers() {
        assert!(parse_complete(number(), "1.").is_err());
        assert!(parse_complete(number(), "1e").is_err());
        assert!(parse_complete(number(), "-").is_err());
        assert!(parse_complete(number(), "-infinity").is_err());
    }

    #[test]
    fn test_number_split_after_leading_zero() {
        let mut first = Cursor::new(b"0", false);
        let parser = match number().feed(&mut first) {
            Parse::Continue(parser) => parser,
            _ => panic!("expected continue"),
        };
        assert_eq!(first.offset(), 0);

        let mut second = Cursor::new(b"0x10,", true);
        match parser.feed(&mut second) {
            Parse::Done(n) => assert_eq!(n, Number::Int32(16)),
            _ => panic!("expected done"),
        }
        assert_eq!(second.offset(), 4);
    }

    #[test]
    fn test_quoted_string_escapes() {
        let text = parse_complete(quoted_string(), r#""a\"b\\c\/d\né""#).unwrap();
        assert_eq!(text, "a\"b\\c/d\né");
        assert!(parse_complete(quoted_string(), r#""open"#).is_err());
        assert!(parse_complete(quoted_string(), r#""bad\q""#).is_err());
        assert!(parse_complete(quoted_string(), r#""\ud800""#).is_err());
    }

    #[test]
    fn test_quoted_string_across_chunks() {
        let mut first = Cursor::new(br#""ab\u00"#, false);
        let parser = match quoted_string().feed(&mut first) {
            Parse::Continue(parser) => parser,
            _ => panic!("expected continue"),
        };
        let mut second = Cursor::new(br#"41c""#, true);
        match parser.feed(&mut second) {
            Parse::Done(text) => assert_eq!(text, "abAc"),
            _ => panic!("expected done"),
        }
    }

    #[test]
    fn test_blob_decoding() {
        assert_eq!(parse_complete(blob(), "%AAA=").unwrap(), vec![0, 0]);
        assert_eq!(parse_complete(blob(), "%aGk=").unwrap(), b"hi".to_vec());
        assert!(parse_complete(blob(), "%").unwrap().is_empty());
        assert!(parse_complete(blob(), "%AAB=").is_err());
        assert!(parse_complete(blob(), "%AAA").is_err());
    }

    #[test]
    fn test_keywords_become_events() {
        assert_eq!(
            Token::Ident("true".into()).into_event(),
            ReadEvent::Boolean(true)
        );
        assert_eq!(
            Token::Ident("truth".into()).into_event(),
            ReadEvent::Text("truth".into())
        );
        assert!(matches!(
            Token::Ident("nan".into()).into_event(),
            ReadEvent::Number(Number::Float64(f)) if f.is_nan()
        ));
    }
}
