use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Map, Value};

/// The shapes list endpoints are known to answer with.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListEnvelope {
    Bare(Vec<Value>),
    Wrapped(Map<String, Value>),
    Null(()),
}

/// Normalise a list payload into a `Vec`.
///
/// Accepts a bare array, an object wrapping the array under `key`
/// (`{"employees": [...]}`), an object without that key, or `null`. The last
/// two yield an empty list.
pub fn decode_list<T: DeserializeOwned>(value: Value, key: &str) -> serde_json::Result<Vec<T>> {
    let items = match serde_json::from_value::<ListEnvelope>(value)? {
        ListEnvelope::Bare(items) => items,
        ListEnvelope::Wrapped(mut map) => match map.remove(key) {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => Vec::new(),
            Some(other) => return serde_json::from_value(other),
        },
        ListEnvelope::Null(()) => Vec::new(),
    };
    items.into_iter().map(serde_json::from_value).collect()
}
