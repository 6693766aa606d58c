//! A [`SmallMap`] should only be used for a small number of entries,
//! such as the event handlers bound to one view. Lookups are linear
//! scans; entries live on the stack until the inline capacity is
//! exceeded, after which the map spills to the heap.

const INLINE: usize = 4;

#[derive(Debug, Default)]
enum Entry<K, V> {
    Occupied(K, V),
    #[default]
    Empty,
}

#[derive(Debug)]
enum Store<K, V> {
    Empty,
    Inline { data: [Entry<K, V>; INLINE], len: u8 },
    Heap(Vec<(K, V)>),
}

/// A mutable map backed by inline storage for up to four entries.
///
/// Keys are de-duplicated: inserting an existing key replaces the value.
#[derive(Debug)]
pub struct SmallMap<K, V>(Store<K, V>);

impl<K, V> Default for SmallMap<K, V> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<K, V> SmallMap<K, V> {
    pub const fn empty() -> Self {
        Self(Store::Empty)
    }

    pub fn len(&self) -> usize {
        match &self.0 {
            Store::Empty => 0,
            Store::Inline { len, .. } => *len as usize,
            Store::Heap(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: PartialEq, V> SmallMap<K, V> {
    /// Insert a value, returning the previous value for the key if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(existing) = self.get_mut(&key) {
            return Some(std::mem::replace(existing, value));
        }

        match &mut self.0 {
            Store::Empty => {
                let mut data: [Entry<K, V>; INLINE] = std::array::from_fn(|_| Entry::Empty);
                data[0] = Entry::Occupied(key, value);
                self.0 = Store::Inline { data, len: 1 };
            }
            Store::Inline { data, len } if (*len as usize) < INLINE => {
                data[*len as usize] = Entry::Occupied(key, value);
                *len += 1;
            }
            Store::Inline { data, len } => {
                let mut entries = Vec::with_capacity(INLINE + 1);
                for entry in data.iter_mut().take(*len as usize) {
                    match std::mem::take(entry) {
                        Entry::Occupied(k, v) => entries.push((k, v)),
                        Entry::Empty => unreachable!("the length tracks occupied entries"),
                    }
                }
                entries.push((key, value));
                self.0 = Store::Heap(entries);
            }
            Store::Heap(entries) => entries.push((key, value)),
        }

        None
    }

    /// Remove the value for a key.
    /// A heap backed map stays on the heap even if it shrinks below
    /// the inline capacity.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: std::borrow::Borrow<Q>,
        Q: ?Sized + PartialEq,
    {
        let (removed, now_empty) = match &mut self.0 {
            Store::Empty => (None, false),
            Store::Inline { data, len } => {
                let pos = data[..*len as usize]
                    .iter()
                    .position(|e| matches!(e, Entry::Occupied(k, _) if k.borrow() == key));

                match pos {
                    None => (None, false),
                    Some(pos) => {
                        data[pos..*len as usize].rotate_left(1);
                        *len -= 1;
                        match std::mem::take(&mut data[*len as usize]) {
                            Entry::Occupied(_, val) => (Some(val), *len == 0),
                            Entry::Empty => unreachable!("the length tracks occupied entries"),
                        }
                    }
                }
            }
            Store::Heap(entries) => match entries.iter().position(|(k, _)| k.borrow() == key) {
                None => (None, false),
                Some(pos) => {
                    let (_, val) = entries.remove(pos);
                    (Some(val), false)
                }
            },
        };

        if now_empty {
            self.0 = Store::Empty;
        }
        removed
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: std::borrow::Borrow<Q>,
        Q: ?Sized + PartialEq,
    {
        self.iter().find_map(|(k, v)| (k.borrow() == key).then_some(v))
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: std::borrow::Borrow<Q>,
        Q: ?Sized + PartialEq,
    {
        match &mut self.0 {
            Store::Empty => None,
            Store::Inline { data, len } => data[..*len as usize].iter_mut().find_map(|e| match e {
                Entry::Occupied(k, v) if k.borrow() == key => Some(v),
                _ => None,
            }),
            Store::Heap(entries) => entries
                .iter_mut()
                .find_map(|(k, v)| (k.borrow() == key).then_some(v)),
        }
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: ?Sized + PartialEq,
    {
        self.get(key).is_some()
    }

    /// Iterate over the key-value pairs of the map.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        let mut inline = None;
        let mut heap = None;

        match &self.0 {
            Store::Empty => {}
            Store::Inline { data, len } => {
                inline = Some(data[..*len as usize].iter().filter_map(|e| match e {
                    Entry::Occupied(k, v) => Some((k, v)),
                    Entry::Empty => None,
                }))
            }
            Store::Heap(entries) => heap = Some(entries.iter().map(|(k, v)| (k, v))),
        }

        std::iter::from_fn(move || match &self.0 {
            Store::Empty => None,
            Store::Inline { .. } => inline.as_mut()?.next(),
            Store::Heap(_) => heap.as_mut()?.next(),
        })
    }

}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn insert_replaces_existing_key() {
        let mut map = SmallMap::empty();
        assert!(map.insert("a", 1).is_none());
        assert_eq!(map.insert("a", 2), Some(1));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn spill_to_heap() {
        let mut map = SmallMap::empty();
        for (i, key) in ["a", "b", "c", "d", "e"].into_iter().enumerate() {
            map.insert(key, i);
        }

        assert_eq!(map.len(), 5);
        assert_eq!(map.get("e"), Some(&4));
        assert_eq!(map.get("a"), Some(&0));
    }

    #[test]
    fn remove_from_inline() {
        let mut map = SmallMap::empty();
        map.insert("a", 1);
        map.insert("b", 2);
        map.insert("c", 3);

        assert_eq!(map.remove("b"), Some(2));
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a"), Some(&1));
        assert_eq!(map.get("c"), Some(&3));
        assert!(map.get("b").is_none());
    }

    #[test]
    fn remove_last_empties_the_map() {
        let mut map = SmallMap::empty();
        map.insert("a", 1);
        assert_eq!(map.remove("a"), Some(1));
        assert!(map.is_empty());
    }
}
