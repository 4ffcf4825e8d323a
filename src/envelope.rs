use serde_json::Value;

use crate::models::Pagination;

/// unwrap_data
///
/// Most backend revisions wrap payloads as `{ "data": ... }`, some do not.
/// Returns the `data` field when present and non-null, else the body itself.
pub fn unwrap_data(body: &Value) -> &Value {
    match body.get("data") {
        Some(data) if !data.is_null() => data,
        _ => body,
    }
}

/// Extractor
///
/// One guess at where a list lives inside a response value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extractor {
    /// `{ "data": [...] }`
    DataField,
    /// `{ "items": [...] }`
    Items,
    /// `{ "<name>": [...] }`, e.g. `vacancies`, `companies`, `profiles`.
    Named(String),
    /// `{ "results": [...] }`
    Results,
    /// `[...]`
    BareArray,
}

impl Extractor {
    pub fn apply<'a>(&self, value: &'a Value) -> Option<&'a Vec<Value>> {
        match self {
            Extractor::DataField => value.get("data").and_then(Value::as_array),
            Extractor::Items => value.get("items").and_then(Value::as_array),
            Extractor::Named(key) => value.get(key.as_str()).and_then(Value::as_array),
            Extractor::Results => value.get("results").and_then(Value::as_array),
            Extractor::BareArray => value.as_array(),
        }
    }
}

/// ListShape
///
/// An ordered chain of extractors; the first one that finds an array wins.
/// The chain runs against the `data`-unwrapped payload first, then against a
/// second `data` layer (some endpoints double-wrap), then against the raw body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListShape {
    extractors: Vec<Extractor>,
}

impl ListShape {
    pub fn new(extractors: Vec<Extractor>) -> Self {
        Self { extractors }
    }

    /// `items`, then each domain key in order, then `results`, a bare array and
    /// finally a `data` array.
    pub fn named(keys: &[&str]) -> Self {
        let mut extractors = vec![Extractor::Items];
        extractors.extend(keys.iter().map(|key| Extractor::Named(key.to_string())));
        extractors.push(Extractor::Results);
        extractors.push(Extractor::BareArray);
        extractors.push(Extractor::DataField);
        Self { extractors }
    }

    pub fn extractors(&self) -> &[Extractor] {
        &self.extractors
    }

    pub fn extract(&self, body: &Value) -> Option<Vec<Value>> {
        layers(body).into_iter().find_map(|layer| {
            self.extractors
                .iter()
                .find_map(|extractor| extractor.apply(layer))
                .cloned()
        })
    }
}

/// pagination_of
///
/// Reads a `pagination` object from the same layers `ListShape` looks at.
/// Unparseable pagination is treated as absent.
pub fn pagination_of(body: &Value) -> Option<Pagination> {
    layers(body)
        .into_iter()
        .filter_map(|layer| layer.get("pagination"))
        .find(|value| value.is_object())
        .and_then(|value| serde_json::from_value(value.clone()).ok())
}

fn layers(body: &Value) -> Vec<&Value> {
    let first = unwrap_data(body);
    let second = unwrap_data(first);
    let mut layers: Vec<&Value> = vec![first];
    for candidate in [second, body] {
        if !layers.iter().any(|seen| std::ptr::eq(*seen, candidate)) {
            layers.push(candidate);
        }
    }
    layers
}
