//! A concurrent registry of codecs keyed by runtime type.
//!
//! Statically typed code never needs the registry: [`Writable`] and
//! [`Recognizable`] are resolved at compile time. The registry serves data
//! whose element types are only known at run time, such as a sequence of
//! boxed [`Any`] values, and code that must decode a type chosen by a
//! [`TypeId`].
//!
//! A [`CodecRegistry`] is a cheap handle: clones share the same tables, and
//! lookups and first-use registrations may run on any number of threads at
//! once.
//!
//! ## Examples
//!
//! ```rust
//! use recon_codec::registry::{CodecRegistry, DynamicSeq};
//!
//! let registry = CodecRegistry::with_defaults();
//! let seq = DynamicSeq::new(&registry)
//!     .with(1i32)
//!     .with("two".to_string())
//!     .with(3i32);
//! assert_eq!(recon_codec::to_string(&seq).unwrap(), "{1,two,3}");
//!
//! let n: i64 = registry.decode("42").unwrap();
//! assert_eq!(n, 42);
//! ```

use crate::error::{Error, ReadError, Result, WriteError};
use crate::event::ReadEvent;
use crate::recognizer::{recognize_events, Recognizable, Recognizer};
use crate::tokenizer::tokenize;
use crate::value::Value;
use crate::writer::{
    write_value, BodyWriter, HeaderWriter, RecordBodyKind, StructuralWriter, Writable,
};
use bytes::Bytes;
use dashmap::DashMap;
use num_bigint::BigInt;
use std::any::{type_name, Any, TypeId};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// A dynamically typed value.
pub type DynValue = Box<dyn Any + Send + Sync>;

/// A recognizer producing a dynamically typed value.
pub type BoxedRecognizer = Box<dyn Recognizer<Target = Box<dyn Any + Send>> + Send>;

type RecognizerFactory = Arc<dyn Fn() -> BoxedRecognizer + Send + Sync>;

/// A type-erased writer for one concrete type.
pub trait DynWritable: Send + Sync {
    /// Name of the type this writer accepts.
    fn type_name(&self) -> &'static str;

    /// Writes `value`, which must be of the accepted type.
    fn write_dyn(&self, value: &dyn Any) -> std::result::Result<Value, WriteError>;
}

struct TypedWriter<T>(PhantomData<fn(&T)>);

impl<T: Writable + Any> DynWritable for TypedWriter<T> {
    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn write_dyn(&self, value: &dyn Any) -> std::result::Result<Value, WriteError> {
        match value.downcast_ref::<T>() {
            Some(value) => write_value(value),
            None => Err(WriteError::Message(format!(
                "writer for {} given a value of another type",
                type_name::<T>()
            ))),
        }
    }
}

struct ErasedRecognizer<R>(R);

impl<R> Recognizer for ErasedRecognizer<R>
where
    R: Recognizer,
    R::Target: Send + 'static,
{
    type Target = Box<dyn Any + Send>;

    fn feed_event(
        &mut self,
        event: ReadEvent,
    ) -> Option<std::result::Result<Box<dyn Any + Send>, ReadError>> {
        self.0
            .feed_event(event)
            .map(|result| result.map(|value| Box::new(value) as Box<dyn Any + Send>))
    }

    fn reset(&mut self) {
        self.0.reset();
    }
}

/// Writers and recognizer factories keyed by [`TypeId`].
#[derive(Clone, Default)]
pub struct CodecRegistry {
    writers: Arc<DashMap<TypeId, Arc<dyn DynWritable>>>,
    recognizers: Arc<DashMap<TypeId, RecognizerFactory>>,
}

impl CodecRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        CodecRegistry::default()
    }

    /// A registry holding codecs for the scalar types, `String`, `Bytes`
    /// and [`Value`].
    #[must_use]
    pub fn with_defaults() -> Self {
        let registry = CodecRegistry::new();
        registry.register::<i32>();
        registry.register::<i64>();
        registry.register::<u32>();
        registry.register::<u64>();
        registry.register::<f32>();
        registry.register::<f64>();
        registry.register::<bool>();
        registry.register::<String>();
        registry.register::<Bytes>();
        registry.register::<BigInt>();
        registry.register::<Value>();
        registry
    }

    /// Registers the writer of `T`. Returns `false` if one was present.
    pub fn register_writer<T>(&self) -> bool
    where
        T: Writable + Any + Send + Sync,
    {
        let id = TypeId::of::<T>();
        if self.writers.contains_key(&id) {
            return false;
        }
        let inserted = self
            .writers
            .insert(id, Arc::new(TypedWriter::<T>(PhantomData)))
            .is_none();
        if inserted {
            debug!(type_name = type_name::<T>(), "registered writer");
        }
        inserted
    }

    /// Registers the recognizer of `T`. Returns `false` if one was present.
    pub fn register_recognizer<T>(&self) -> bool
    where
        T: Recognizable + Send + 'static,
        T::Rec: Send + 'static,
    {
        let id = TypeId::of::<T>();
        if self.recognizers.contains_key(&id) {
            return false;
        }
        let factory: RecognizerFactory =
            Arc::new(|| Box::new(ErasedRecognizer(T::make_recognizer())) as BoxedRecognizer);
        let inserted = self.recognizers.insert(id, factory).is_none();
        if inserted {
            debug!(type_name = type_name::<T>(), "registered recognizer");
        }
        inserted
    }

    /// Registers both halves of the codec of `T`.
    pub fn register<T>(&self)
    where
        T: Writable + Recognizable + Any + Send + Sync,
        T::Rec: Send + 'static,
    {
        self.register_writer::<T>();
        self.register_recognizer::<T>();
    }

    /// The writer of `T`, registering it on first use.
    pub fn writer_of<T>(&self) -> Arc<dyn DynWritable>
    where
        T: Writable + Any + Send + Sync,
    {
        self.writers
            .entry(TypeId::of::<T>())
            .or_insert_with(|| {
                debug!(type_name = type_name::<T>(), "registered writer on first use");
                Arc::new(TypedWriter::<T>(PhantomData))
            })
            .value()
            .clone()
    }

    #[must_use]
    pub fn writer_for(&self, id: TypeId) -> Option<Arc<dyn DynWritable>> {
        self.writers.get(&id).map(|entry| entry.value().clone())
    }

    #[must_use]
    pub fn has_writer(&self, id: TypeId) -> bool {
        self.writers.contains_key(&id)
    }

    /// A fresh recognizer for the type identified by `id`.
    #[must_use]
    pub fn recognizer_for(&self, id: TypeId) -> Option<BoxedRecognizer> {
        let factory = self.recognizers.get(&id).map(|entry| entry.value().clone())?;
        Some(factory())
    }

    /// Recognizes `events` as a `T` through the registered recognizer.
    pub fn recognize<T, I>(&self, events: I) -> Result<T>
    where
        T: Any,
        I: IntoIterator<Item = ReadEvent>,
    {
        let mut recognizer = self.recognizer_for(TypeId::of::<T>()).ok_or_else(|| {
            Error::Decode(ReadError::Message(format!(
                "no recognizer registered for {}",
                type_name::<T>()
            )))
        })?;
        let value = recognize_events(&mut recognizer, events)?;
        value.downcast::<T>().map(|value| *value).map_err(|_| {
            Error::Decode(ReadError::Message(format!(
                "registered recognizer did not produce a {}",
                type_name::<T>()
            )))
        })
    }

    /// Parses `input` as a `T` through the registered recognizer.
    pub fn decode<T: Any>(&self, input: &str) -> Result<T> {
        self.recognize(tokenize(input)?)
    }
}

/// Resolves writers for a run of dynamically typed values, looking up the
/// registry only when the runtime type changes.
struct WriterCache<'r> {
    registry: &'r CodecRegistry,
    current: Option<(TypeId, Arc<dyn DynWritable>)>,
}

impl<'r> WriterCache<'r> {
    fn new(registry: &'r CodecRegistry) -> Self {
        WriterCache {
            registry,
            current: None,
        }
    }

    fn write(&mut self, item: &DynValue) -> std::result::Result<Value, WriteError> {
        let id = (**item).type_id();
        let writer = match &self.current {
            Some((current, writer)) if *current == id => writer.clone(),
            _ => {
                let writer = self.registry.writer_for(id).ok_or_else(|| {
                    debug!(?id, "no writer registered");
                    WriteError::NoWriter(format!("{:?}", id))
                })?;
                debug!(type_name = writer.type_name(), "resolved writer");
                self.current = Some((id, writer.clone()));
                writer
            }
        };
        writer.write_dyn(&**item)
    }
}

/// A sequence of dynamically typed values, written through a registry.
pub struct DynamicSeq<'r> {
    registry: &'r CodecRegistry,
    items: Vec<DynValue>,
}

impl<'r> DynamicSeq<'r> {
    pub fn new(registry: &'r CodecRegistry) -> Self {
        DynamicSeq {
            registry,
            items: Vec::new(),
        }
    }

    #[must_use]
    pub fn with<T: Any + Send + Sync>(mut self, item: T) -> Self {
        self.items.push(Box::new(item));
        self
    }

    pub fn push(&mut self, item: DynValue) {
        self.items.push(item);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Writable for DynamicSeq<'_> {
    fn write_with<W: StructuralWriter>(
        &self,
        writer: W,
    ) -> std::result::Result<W::Repr, W::Error> {
        let mut cache = WriterCache::new(self.registry);
        let mut body = writer
            .record(0)?
            .complete_header(RecordBodyKind::ArrayLike, self.items.len())?;
        for item in &self.items {
            let value = cache.write(item)?;
            body = body.write_value(&value)?;
        }
        body.done()
    }
}

/// A map of dynamically typed keys and values, written through a registry.
pub struct DynamicMap<'r> {
    registry: &'r CodecRegistry,
    entries: Vec<(DynValue, DynValue)>,
}

impl<'r> DynamicMap<'r> {
    pub fn new(registry: &'r CodecRegistry) -> Self {
        DynamicMap {
            registry,
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Any + Send + Sync,
        V: Any + Send + Sync,
    {
        self.entries.push((Box::new(key), Box::new(value)));
        self
    }

    pub fn insert(&mut self, key: DynValue, value: DynValue) {
        self.entries.push((key, value));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Writable for DynamicMap<'_> {
    fn write_with<W: StructuralWriter>(
        &self,
        writer: W,
    ) -> std::result::Result<W::Repr, W::Error> {
        let mut keys = WriterCache::new(self.registry);
        let mut values = WriterCache::new(self.registry);
        let mut body = writer
            .record(0)?
            .complete_header(RecordBodyKind::MapLike, self.entries.len())?;
        for (key, value) in &self.entries {
            let key = keys.write(key)?;
            let value = values.write(value)?;
            body = body.write_slot(&key, &value)?;
        }
        body.done()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::print;
    use std::thread;

    #[derive(Debug, PartialEq)]
    struct Celsius(f64);

    impl Writable for Celsius {
        fn write_with<W: StructuralWriter>(
            &self,
            writer: W,
        ) -> std::result::Result<W::Repr, W::Error> {
            writer
                .record(1)?
                .write_attr_with("celsius", &self.0)?
                .complete_header(RecordBodyKind::ArrayLike, 0)?
                .done()
        }
    }

    #[test]
    fn test_heterogeneous_seq() {
        let registry = CodecRegistry::with_defaults();
        registry.register_writer::<Celsius>();
        let seq = DynamicSeq::new(&registry)
            .with(1i32)
            .with(2i32)
            .with(Celsius(21.5))
            .with(true);
        assert_eq!(print(&seq).unwrap(), "{1,2,@celsius(21.5),true}");
    }

    #[test]
    fn test_missing_writer() {
        let registry = CodecRegistry::new();
        let seq = DynamicSeq::new(&registry).with(Celsius(0.0));
        assert!(matches!(print(&seq), Err(WriteError::NoWriter(_))));

        registry.writer_of::<Celsius>();
        assert_eq!(print(&seq).unwrap(), "{@celsius(0.0)}");
    }

    #[test]
    fn test_dynamic_map() {
        let registry = CodecRegistry::with_defaults();
        let map = DynamicMap::new(&registry)
            .with("a".to_string(), 1i64)
            .with(2i32, Value::from_items([1, 2]));
        assert_eq!(print(&map).unwrap(), "{a:1,2:{1,2}}");
    }

    #[test]
    fn test_decode_by_type() {
        let registry = CodecRegistry::with_defaults();
        assert_eq!(registry.decode::<String>("\"hi\"").unwrap(), "hi");
        assert!(registry.decode::<i32>("4294967296").is_err());
        assert!(registry.decode::<Vec<i32>>("{1}").is_err());

        registry.register_recognizer::<Vec<i32>>();
        assert_eq!(registry.decode::<Vec<i32>>("{1}").unwrap(), vec![1]);
    }

    #[test]
    fn test_registration_is_idempotent() {
        let registry = CodecRegistry::new();
        assert!(registry.register_writer::<i32>());
        assert!(!registry.register_writer::<i32>());
        assert!(registry.has_writer(TypeId::of::<i32>()));
    }

    #[test]
    fn test_concurrent_registration_and_lookup() {
        let registry = CodecRegistry::new();
        thread::scope(|scope| {
            for _ in 0..8 {
                let registry = registry.clone();
                scope.spawn(move || {
                    registry.writer_of::<i32>();
                    registry.register_writer::<String>();
                    registry.register_recognizer::<i64>();
                    let seq = DynamicSeq::new(&registry).with(1i32).with("x".to_string());
                    assert_eq!(print(&seq).unwrap(), "{1,x}");
                    assert_eq!(registry.decode::<i64>("5").unwrap(), 5);
                });
            }
        });
        assert_eq!(registry.writers.len(), 2);
    }
}
