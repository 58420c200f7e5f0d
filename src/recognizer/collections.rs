//! Recognizers for sequences and maps.
//!
//! A sequence is a record body of value items, `{1,2,3}`; a map is a record
//! body of slots, `{a:1,b:2}`. Element recognizers are reset and reused for
//! every element.

use super::{Recognizable, Recognizer};
use crate::error::ReadError;
use crate::event::ReadEvent;
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::mem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeqStage {
    Init,
    Between,
    InElement,
}

/// Recognizes a body of value items into a `Vec`.
pub struct SeqRecognizer<R: Recognizer> {
    element: R,
    items: Vec<R::Target>,
    stage: SeqStage,
}

impl<R: Recognizer> SeqRecognizer<R> {
    pub fn new(element: R) -> Self {
        SeqRecognizer {
            element,
            items: Vec::new(),
            stage: SeqStage::Init,
        }
    }

    fn feed_element(&mut self, event: ReadEvent) -> Option<Result<Vec<R::Target>, ReadError>> {
        match self.element.feed_event(event) {
            None => {
                self.stage = SeqStage::InElement;
                None
            }
            Some(Ok(item)) => {
                self.items.push(item);
                self.element.reset();
                self.stage = SeqStage::Between;
                None
            }
            Some(Err(err)) => Some(Err(err)),
        }
    }
}

impl<R: Recognizer> Recognizer for SeqRecognizer<R> {
    type Target = Vec<R::Target>;

    fn feed_event(&mut self, event: ReadEvent) -> Option<Result<Self::Target, ReadError>> {
        match self.stage {
            SeqStage::Init => match event {
                ReadEvent::StartBody => {
                    self.stage = SeqStage::Between;
                    None
                }
                other => Some(Err(ReadError::unexpected("a record body", other))),
            },
            SeqStage::Between => match event {
                ReadEvent::EndRecord => Some(Ok(mem::take(&mut self.items))),
                ReadEvent::Slot => Some(Err(ReadError::unexpected("a value item", "slot"))),
                event => self.feed_element(event),
            },
            SeqStage::InElement => self.feed_element(event),
        }
    }

    fn reset(&mut self) {
        self.element.reset();
        self.items.clear();
        self.stage = SeqStage::Init;
    }
}

impl<T: Recognizable> Recognizable for Vec<T> {
    type Rec = SeqRecognizer<T::Rec>;

    fn make_recognizer() -> Self::Rec {
        SeqRecognizer::new(T::make_recognizer())
    }
}

/// Maps that a [`MapRecognizer`] can fill. Later duplicate keys replace
/// earlier ones.
pub trait MapLike<K, V>: Default {
    fn insert_entry(&mut self, key: K, value: V);
}

impl<K: Eq + Hash, V, S: BuildHasher + Default> MapLike<K, V> for HashMap<K, V, S> {
    fn insert_entry(&mut self, key: K, value: V) {
        self.insert(key, value);
    }
}

impl<K: Ord, V> MapLike<K, V> for BTreeMap<K, V> {
    fn insert_entry(&mut self, key: K, value: V) {
        self.insert(key, value);
    }
}

impl<K: Eq + Hash, V, S: BuildHasher + Default> MapLike<K, V> for IndexMap<K, V, S> {
    fn insert_entry(&mut self, key: K, value: V) {
        self.insert(key, value);
    }
}

enum MapStage<K> {
    Init,
    Between,
    InKey,
    AfterKey(K),
    AwaitValue(K),
    InValue(K),
}

/// Recognizes a body of `key:value` slots into a map.
pub struct MapRecognizer<KR: Recognizer, VR: Recognizer, M> {
    key: KR,
    value: VR,
    map: M,
    stage: MapStage<KR::Target>,
}

impl<KR, VR, M> MapRecognizer<KR, VR, M>
where
    KR: Recognizer,
    VR: Recognizer,
    M: MapLike<KR::Target, VR::Target>,
{
    pub fn new(key: KR, value: VR) -> Self {
        MapRecognizer {
            key,
            value,
            map: M::default(),
            stage: MapStage::Init,
        }
    }

    fn feed_key(&mut self, event: ReadEvent) -> Option<Result<M, ReadError>> {
        match self.key.feed_event(event) {
            None => {
                self.stage = MapStage::InKey;
                None
            }
            Some(Ok(key)) => {
                self.key.reset();
                self.stage = MapStage::AfterKey(key);
                None
            }
            Some(Err(err)) => Some(Err(err)),
        }
    }

    fn feed_value(&mut self, key: KR::Target, event: ReadEvent) -> Option<Result<M, ReadError>> {
        match self.value.feed_event(event) {
            None => {
                self.stage = MapStage::InValue(key);
                None
            }
            Some(Ok(value)) => {
                self.value.reset();
                self.map.insert_entry(key, value);
                self.stage = MapStage::Between;
                None
            }
            Some(Err(err)) => Some(Err(err)),
        }
    }
}

impl<KR, VR, M> Recognizer for MapRecognizer<KR, VR, M>
where
    KR: Recognizer,
    VR: Recognizer,
    M: MapLike<KR::Target, VR::Target>,
{
    type Target = M;

    fn feed_event(&mut self, event: ReadEvent) -> Option<Result<M, ReadError>> {
        match mem::replace(&mut self.stage, MapStage::Init) {
            MapStage::Init => match event {
                ReadEvent::StartBody => {
                    self.stage = MapStage::Between;
                    None
                }
                other => Some(Err(ReadError::unexpected("a record body", other))),
            },
            MapStage::Between => match event {
                ReadEvent::EndRecord => Some(Ok(mem::take(&mut self.map))),
                ReadEvent::Slot => Some(Err(ReadError::unexpected("a map key", "slot"))),
                event => self.feed_key(event),
            },
            MapStage::InKey => self.feed_key(event),
            MapStage::AfterKey(key) => match event {
                ReadEvent::Slot => {
                    self.stage = MapStage::AwaitValue(key);
                    None
                }
                other => Some(Err(ReadError::unexpected("a slot", other))),
            },
            MapStage::AwaitValue(key) | MapStage::InValue(key) => self.feed_value(key, event),
        }
    }

    fn reset(&mut self) {
        self.key.reset();
        self.value.reset();
        self.map = M::default();
        self.stage = MapStage::Init;
    }
}

impl<K, V, S> Recognizable for HashMap<K, V, S>
where
    K: Recognizable + Eq + Hash,
    V: Recognizable,
    S: BuildHasher + Default,
{
    type Rec = MapRecognizer<K::Rec, V::Rec, Self>;

    fn make_recognizer() -> Self::Rec {
        MapRecognizer::new(K::make_recognizer(), V::make_recognizer())
    }
}

impl<K, V> Recognizable for BTreeMap<K, V>
where
    K: Recognizable + Ord,
    V: Recognizable,
{
    type Rec = MapRecognizer<K::Rec, V::Rec, Self>;

    fn make_recognizer() -> Self::Rec {
        MapRecognizer::new(K::make_recognizer(), V::make_recognizer())
    }
}

impl<K, V, S> Recognizable for IndexMap<K, V, S>
where
    K: Recognizable + Eq + Hash,
    V: Recognizable,
    S: BuildHasher + Default,
{
    type Rec = MapRecognizer<K::Rec, V::Rec, Self>;

    fn make_recognizer() -> Self::Rec {
        MapRecognizer::new(K::make_recognizer(), V::make_recognizer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::recognize_events;
    use crate::tokenizer::tokenize;

    fn recognize<T: Recognizable>(text: &str) -> Result<T, ReadError> {
        recognize_events(&mut T::make_recognizer(), tokenize(text).unwrap())
    }

    #[test]
    fn test_vec() {
        assert_eq!(recognize::<Vec<i32>>("{1,2,3}").unwrap(), vec![1, 2, 3]);
        assert_eq!(recognize::<Vec<i32>>("{}").unwrap(), Vec::<i32>::new());
        assert!(recognize::<Vec<i32>>("{1,a}").is_err());
        assert!(recognize::<Vec<i32>>("{a:1}").is_err());
        assert!(recognize::<Vec<i32>>("7").is_err());
    }

    #[test]
    fn test_nested_vec() {
        assert_eq!(
            recognize::<Vec<Vec<i32>>>("{{1,2},{},{3}}").unwrap(),
            vec![vec![1, 2], vec![], vec![3]]
        );
    }

    #[test]
    fn test_vec_of_options_with_empty_items() {
        assert_eq!(
            recognize::<Vec<Option<i32>>>("{1,,2}").unwrap(),
            vec![Some(1), None, Some(2)]
        );
    }

    #[test]
    fn test_maps() {
        let map = recognize::<IndexMap<String, i32>>("{b:2,a:1}").unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a"]);

        let map = recognize::<BTreeMap<i32, Vec<i32>>>("{1:{2,3},4:{}}").unwrap();
        assert_eq!(map[&1], vec![2, 3]);
        assert!(map[&4].is_empty());

        let map = recognize::<HashMap<String, bool>>("{x:true,x:false}").unwrap();
        assert_eq!(map.len(), 1);
        assert!(!map["x"]);

        assert!(recognize::<HashMap<String, i32>>("{a,b}").is_err());
    }

    #[test]
    fn test_reset_reuses_recognizer() {
        let mut recognizer = <Vec<i32>>::make_recognizer();
        assert_eq!(
            recognize_events(&mut recognizer, tokenize("{1,2}").unwrap()).unwrap(),
            vec![1, 2]
        );
        recognizer.reset();
        assert_eq!(
            recognize_events(&mut recognizer, tokenize("{3}").unwrap()).unwrap(),
            vec![3]
        );
    }
}
