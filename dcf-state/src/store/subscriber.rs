use super::Subscriber;

const INLINE: usize = 3;

/// Zero, one or more subscribers associated with a store cell.
///
/// Most cells have a single subscriber, so the set only reaches
/// for the heap once more than three components listen to one value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Subscribers {
    Empty,
    One(Subscriber),
    Arr([Option<Subscriber>; INLINE], u8),
    Heap(Vec<Subscriber>),
}

impl Subscribers {
    pub(crate) fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    // Insert a new subscriber.
    // Duplicates are ignored.
    pub(crate) fn insert(&mut self, sub: Subscriber) {
        if self.iter().any(|s| s == sub) {
            return;
        }

        match self {
            Self::Empty => *self = Self::One(sub),
            Self::One(first) => *self = Self::Arr([Some(*first), Some(sub), None], 2),
            Self::Arr(subs, len) if (*len as usize) == INLINE => {
                let mut heap = Vec::with_capacity(INLINE + 1);
                heap.extend(subs.iter().flatten());
                heap.push(sub);
                *self = Self::Heap(heap);
            }
            Self::Arr(subs, len) => {
                subs[*len as usize] = Some(sub);
                *len += 1;
            }
            Self::Heap(subs) => subs.push(sub),
        }
    }

    // Remove a subscriber.
    // A heap backed set keeps its allocation until it empties out.
    pub(crate) fn remove(&mut self, sub: Subscriber) {
        match self {
            Self::Empty => (),
            Self::One(first) if *first == sub => *self = Self::Empty,
            Self::One(_) => (),
            Self::Arr(subs, len) => {
                let Some(pos) = subs[..*len as usize].iter().position(|s| *s == Some(sub)) else {
                    return;
                };
                subs[pos..*len as usize].rotate_left(1);
                *len -= 1;
                subs[*len as usize] = None;
                if *len == 0 {
                    *self = Self::Empty;
                }
            }
            Self::Heap(subs) => {
                if let Some(pos) = subs.iter().position(|s| *s == sub) {
                    subs.remove(pos);
                }
                if subs.is_empty() {
                    *self = Self::Empty;
                }
            }
        }
    }

    /// Produce an iterator over the subscribers
    pub(crate) fn iter(&self) -> impl Iterator<Item = Subscriber> + '_ {
        let mut one = None;
        let mut arr = None;
        let mut heap = None;

        match self {
            Subscribers::Empty => {}
            Subscribers::One(sub) => one = Some(std::iter::once(*sub)),
            Subscribers::Arr(subs, len) => arr = Some(subs[..*len as usize].iter().flatten().copied()),
            Subscribers::Heap(subs) => heap = Some(subs.iter().copied()),
        };

        std::iter::from_fn(move || match self {
            Subscribers::Empty => None,
            Subscribers::One(_) => one.as_mut()?.next(),
            Subscribers::Arr(..) => arr.as_mut()?.next(),
            Subscribers::Heap(_) => heap.as_mut()?.next(),
        })
    }
}
