/// Builds a [`Value`](crate::Value) from a Recon-like literal.
///
/// `[..]` is a record of value items and `{..}` a record of slots; keys may
/// be any literal. Anything else goes through `Value::from`.
///
/// ```rust
/// use recon_codec::{recon, Value};
///
/// let value = recon!({ "name": "Ada", "tags": ["math", "code"], 1: extant });
/// assert_eq!(value.to_string(), "{name:Ada,tags:{math,code},1:}");
/// ```
#[macro_export]
macro_rules! recon {
    (extant) => {
        $crate::Value::Extant
    };

    (true) => {
        $crate::Value::Boolean(true)
    };

    (false) => {
        $crate::Value::Boolean(false)
    };

    ([]) => {
        $crate::Value::Record($crate::Record::new())
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Record($crate::Record {
            attrs: ::std::vec::Vec::new(),
            items: vec![$($crate::Item::ValueItem($crate::recon!($elem))),*],
        })
    };

    ({}) => {
        $crate::Value::Record($crate::Record::new())
    };

    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::Value::Record($crate::Record {
            attrs: ::std::vec::Vec::new(),
            items: vec![$($crate::Item::Slot($crate::recon!($key), $crate::recon!($value))),*],
        })
    };

    ($other:expr) => {
        $crate::Value::from($other)
    };
}
