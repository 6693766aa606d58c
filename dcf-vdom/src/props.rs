use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::{Map, Number, Value};

/// A color as it travels over the bridge: a string with a `dcf:`
/// prefix so the native side can tell colors from ordinary strings.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Color {
    Transparent,
    Black,
    Rgb(u8, u8, u8),
    Argb(u8, u8, u8, u8),
}

impl Color {
    pub fn encode(&self) -> String {
        match self {
            Color::Transparent => "dcf:transparent".to_string(),
            Color::Black => "dcf:black".to_string(),
            Color::Rgb(r, g, b) => format!("dcf:#{r:02X}{g:02X}{b:02X}"),
            Color::Argb(a, r, g, b) => format!("dcf:#{a:02X}{r:02X}{g:02X}{b:02X}"),
        }
    }

    pub fn decode(encoded: &str) -> Option<Self> {
        let body = encoded.strip_prefix("dcf:")?;

        match body {
            "transparent" => return Some(Color::Transparent),
            "black" => return Some(Color::Black),
            _ => (),
        }

        let hex = body.strip_prefix('#')?;
        match hex.len() {
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Color::Rgb(r, g, b))
            }
            8 => {
                let a = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let r = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let g = u8::from_str_radix(&hex[4..6], 16).ok()?;
                let b = u8::from_str_radix(&hex[6..8], 16).ok()?;
                Some(Color::Argb(a, r, g, b))
            }
            _ => None,
        }
    }
}

/// An event handler attached to an element prop.
///
/// Handlers never cross the bridge; the engine keeps them in a
/// per-view table and the native side only learns about presence.
/// Two handlers are equal only if they are the same allocation.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&Value)>);

impl Handler {
    pub fn new(f: impl Fn(&Value) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn invoke(&self, payload: &Value) {
        (self.0)(payload)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handler(..)")
    }
}

/// A prop value.
///
/// Everything except [`PropValue::Handler`] serializes to its JSON
/// counterpart. Layout values are ordinary props, siblings of style;
/// there is no special channel for them.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Color(Color),
    List(Vec<PropValue>),
    Map(BTreeMap<String, PropValue>),
    Handler(Handler),
}

impl PropValue {
    pub fn is_handler(&self) -> bool {
        matches!(self, PropValue::Handler(_))
    }

    pub(crate) fn to_json(&self) -> Value {
        match self {
            PropValue::Null => Value::Null,
            PropValue::Bool(b) => Value::Bool(*b),
            PropValue::Int(n) => Value::Number((*n).into()),
            PropValue::Float(n) => Number::from_f64(*n).map(Value::Number).unwrap_or(Value::Null),
            PropValue::Str(s) => Value::String(s.clone()),
            PropValue::Color(c) => Value::String(c.encode()),
            PropValue::List(items) => Value::Array(items.iter().map(PropValue::to_json).collect()),
            PropValue::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<Map<_, _>>(),
            ),
            PropValue::Handler(_) => Value::Null,
        }
    }

    pub(crate) fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => PropValue::Null,
            Value::Bool(b) => PropValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => PropValue::Int(i),
                None => PropValue::Float(n.as_f64().unwrap_or(0.0)),
            },
            Value::String(s) => match Color::decode(s) {
                Some(color) => PropValue::Color(color),
                None => PropValue::Str(s.clone()),
            },
            Value::Array(items) => PropValue::List(items.iter().map(PropValue::from_json).collect()),
            Value::Object(entries) => PropValue::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), PropValue::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        Self::Int(value as i64)
    }
}

impl From<u64> for PropValue {
    fn from(value: u64) -> Self {
        Self::Int(value as i64)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Color> for PropValue {
    fn from(value: Color) -> Self {
        Self::Color(value)
    }
}

impl From<Handler> for PropValue {
    fn from(value: Handler) -> Self {
        Self::Handler(value)
    }
}

impl<T: Into<PropValue>> From<Vec<T>> for PropValue {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

/// `true` for keys naming event handler props: `on` followed by an
/// uppercase letter (`onPress`, `onScrollEnd`, ...).
pub fn is_event_prop(key: &str) -> bool {
    key.strip_prefix("on")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_uppercase())
}

/// The event name a handler prop binds: `onPress` binds `press`,
/// `onScrollEnd` binds `scrollEnd`.
pub fn event_name(key: &str) -> Option<String> {
    if !is_event_prop(key) {
        return None;
    }
    let rest = &key[2..];
    let mut chars = rest.chars();
    let first = chars.next()?;
    Some(first.to_ascii_lowercase().to_string() + chars.as_str())
}

/// An element's prop map. Ordered so serialization is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props {
    inner: BTreeMap<String, PropValue>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<PropValue>) {
        self.inner.insert(key.into(), value.into());
    }

    /// Chainable [`Props::set`]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.inner.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<PropValue> {
        self.inner.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropValue)> + '_ {
        self.inner.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> + '_ {
        self.inner.keys()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// The handler props: `(event name, handler)` pairs.
    pub fn handlers(&self) -> impl Iterator<Item = (String, &Handler)> + '_ {
        self.inner.iter().filter_map(|(key, value)| match value {
            PropValue::Handler(handler) => event_name(key).map(|name| (name, handler)),
            _ => None,
        })
    }

    /// Serialize to the wire format.
    /// Handler props are skipped; their presence is shipped as
    /// `BindEvent`/`UnbindEvent` ops instead.
    pub fn to_json(&self) -> String {
        let map = self
            .inner
            .iter()
            .filter(|(_, v)| !v.is_handler())
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect::<Map<_, _>>();
        Value::Object(map).to_string()
    }

    /// Parse props back from the wire format.
    pub fn from_json(json: &str) -> Option<Self> {
        let Value::Object(map) = serde_json::from_str(json).ok()? else {
            return None;
        };

        let inner = map
            .iter()
            .map(|(k, v)| (k.clone(), PropValue::from_json(v)))
            .collect();
        Some(Self { inner })
    }
}

impl FromIterator<(String, PropValue)> for Props {
    fn from_iter<I: IntoIterator<Item = (String, PropValue)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn color_encoding() {
        assert_eq!(Color::Transparent.encode(), "dcf:transparent");
        assert_eq!(Color::Black.encode(), "dcf:black");
        assert_eq!(Color::Rgb(0xAA, 0xBB, 0xCC).encode(), "dcf:#AABBCC");
        assert_eq!(Color::Argb(0x80, 0xAA, 0xBB, 0xCC).encode(), "dcf:#80AABBCC");
    }

    #[test]
    fn color_round_trip() {
        for color in [
            Color::Transparent,
            Color::Black,
            Color::Rgb(1, 2, 3),
            Color::Argb(4, 5, 6, 7),
        ] {
            assert_eq!(Color::decode(&color.encode()), Some(color));
        }

        assert_eq!(Color::decode("red"), None);
        assert_eq!(Color::decode("dcf:#12"), None);
    }

    #[test]
    fn props_round_trip() {
        let mut props = Props::new();
        props.set("count", 3);
        props.set("ratio", 0.5);
        props.set("label", "hello");
        props.set("visible", true);
        props.set("tint", Color::Rgb(0, 0, 255));
        props.set("sizes", vec![1, 2, 3]);

        let mut style = BTreeMap::new();
        style.insert("margin".to_string(), PropValue::Int(8));
        style.insert(
            "background".to_string(),
            PropValue::Color(Color::Transparent),
        );
        props.set("style", PropValue::Map(style));

        let decoded = Props::from_json(&props.to_json()).unwrap();
        assert_eq!(decoded, props);
    }

    #[test]
    fn handlers_are_not_serialized() {
        let mut props = Props::new();
        props.set("onPress", Handler::new(|_| {}));
        props.set("label", "go");

        let json = props.to_json();
        assert!(!json.contains("onPress"));
        assert!(json.contains("label"));
    }

    #[test]
    fn event_prop_detection() {
        assert!(is_event_prop("onPress"));
        assert!(is_event_prop("onScrollEnd"));
        assert!(!is_event_prop("once"));
        assert!(!is_event_prop("on"));
        assert!(!is_event_prop("content"));

        assert_eq!(event_name("onPress").as_deref(), Some("press"));
        assert_eq!(event_name("onScrollEnd").as_deref(), Some("scrollEnd"));
        assert_eq!(event_name("once"), None);
    }

    #[test]
    fn handler_equality_is_by_allocation() {
        let a = Handler::new(|_| {});
        let b = a.clone();
        let c = Handler::new(|_| {});

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
