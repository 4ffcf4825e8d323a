//! API Facade Index
//!
//! Typed front doors for the backend operations the UI performs. Every facade
//! goes through the `EndpointResolver`, so route fallbacks, bearer tokens and
//! envelope unwrapping behave the same everywhere.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;

/// Vacancy listing, positions, the HR's own vacancies and publishing.
pub mod vacancies;

/// Company search, directory listing and company records.
pub mod companies;

/// Student/developer profile directory.
pub mod users;

/// The viewer's resume file.
pub mod resume;

/// The signed-in account's own profile records.
pub mod profile;

pub use companies::CompaniesApi;
pub use profile::ProfileApi;
pub use resume::ResumeApi;
pub use users::UsersApi;
pub use vacancies::VacanciesApi;

/// Decodes list items one by one. Records that do not fit the schema are
/// logged and skipped rather than failing the whole page.
pub(crate) fn decode_items<T: DeserializeOwned>(operation: &str, items: Vec<Value>) -> Vec<T> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(operation, index, error = %e, "skipping undecodable item");
                None
            }
        })
        .collect()
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Returns `value[key]` when it is an object, else `value` itself. Single-record
/// endpoints answer either `{ "company": {...} }` or the record directly.
pub(crate) fn unwrap_record(value: Value, key: &str) -> Value {
    match value {
        Value::Object(mut map) if map.get(key).is_some_and(Value::is_object) => {
            map.remove(key).unwrap_or(Value::Null)
        }
        other => other,
    }
}
