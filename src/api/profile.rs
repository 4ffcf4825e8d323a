use serde_json::Value;

use crate::{
    api::{decode, unwrap_record},
    auth::validate_email,
    error::ApiError,
    gateway::ApiRequest,
    models::{HrProfile, HrProfileUpdate, UserListItem},
    resolver::EndpointResolver,
};

// Avatar ids with this prefix only exist in the browser's local storage.
const LOCAL_AVATAR_PREFIX: &str = "user_avatar_";

/// ProfileApi
///
/// The signed-in account's own profile: the student record and the HR record.
#[derive(Clone)]
pub struct ProfileApi {
    resolver: EndpointResolver,
}

impl ProfileApi {
    pub fn new(resolver: EndpointResolver) -> Self {
        Self { resolver }
    }

    /// `GET /users/me`.
    pub async fn me(&self) -> Result<UserListItem, ApiError> {
        let body = self
            .resolver
            .fetch("get own profile", ApiRequest::get("/users/me"))
            .await?;
        decode_profile(body, "user", "profile")
    }

    /// `GET /hr/me`.
    pub async fn hr_me(&self) -> Result<HrProfile, ApiError> {
        let body = self
            .resolver
            .fetch("get hr profile", ApiRequest::get("/hr/me"))
            .await?;
        decode_profile(body, "hr", "hr profile")
    }

    /// update_hr
    ///
    /// Validates the edit form and sends it as `PATCH /hr/edit`. Names, email,
    /// category and a positive age are required; the Telegram handle is sent
    /// as `@username`.
    pub async fn update_hr(&self, update: &HrProfileUpdate) -> Result<(), ApiError> {
        let payload = normalize_hr_update(update)?;
        let body = serde_json::to_value(&payload).map_err(|e| ApiError::Decode(e.to_string()))?;

        self.resolver
            .fetch("update hr profile", ApiRequest::patch("/hr/edit", body))
            .await
            .inspect_err(|e| tracing::error!(error = %e, "failed to save hr profile"))?;
        Ok(())
    }
}

fn decode_profile<T>(body: Value, key: &str, what: &'static str) -> Result<T, ApiError>
where
    T: serde::de::DeserializeOwned,
{
    match unwrap_record(body, key) {
        Value::Null => Err(ApiError::MissingField(what)),
        record => decode(record),
    }
}

fn required(value: &str, field: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::Validation(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Accepts `@name`, `name` or a `t.me` link and returns `@name`.
pub fn normalize_telegram(raw: &str) -> Option<String> {
    let value = raw.trim();
    let lower = value.to_ascii_lowercase();
    let link = ["https://t.me/", "http://t.me/"]
        .into_iter()
        .find(|prefix| lower.starts_with(prefix));
    let value = match link {
        Some(prefix) => &value[prefix.len()..],
        None => value,
    };

    let username = value.strip_prefix('@').unwrap_or(value).trim();
    if username.is_empty() {
        None
    } else {
        Some(format!("@{}", username))
    }
}

fn normalize_hr_update(update: &HrProfileUpdate) -> Result<HrProfileUpdate, ApiError> {
    if update.age == 0 {
        return Err(ApiError::Validation("age must be a positive number".to_string()));
    }

    Ok(HrProfileUpdate {
        first_name: required(&update.first_name, "first name")?,
        last_name: required(&update.last_name, "last name")?,
        age: update.age,
        email: validate_email(&update.email)?,
        telegram: update.telegram.as_deref().and_then(normalize_telegram),
        profession_category: required(&update.profession_category, "profession category")?,
        description: optional(&update.description),
        avatar_id: optional(&update.avatar_id).filter(|id| !id.starts_with(LOCAL_AVATAR_PREFIX)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> HrProfileUpdate {
        HrProfileUpdate {
            first_name: " Olga ".to_string(),
            last_name: "Smirnova".to_string(),
            age: 30,
            email: "olga@mospolytech.ru".to_string(),
            telegram: Some("https://t.me/olga_hr".to_string()),
            profession_category: "IT".to_string(),
            description: Some("  ".to_string()),
            avatar_id: Some("user_avatar_123".to_string()),
        }
    }

    #[test]
    fn telegram_forms() {
        assert_eq!(normalize_telegram("@anna").as_deref(), Some("@anna"));
        assert_eq!(normalize_telegram("anna").as_deref(), Some("@anna"));
        assert_eq!(normalize_telegram("HTTPS://t.me/anna").as_deref(), Some("@anna"));
        assert_eq!(normalize_telegram("  @ "), None);
    }

    #[test]
    fn hr_update_is_cleaned() {
        let cleaned = normalize_hr_update(&filled()).unwrap();
        assert_eq!(cleaned.first_name, "Olga");
        assert_eq!(cleaned.telegram.as_deref(), Some("@olga_hr"));
        assert_eq!(cleaned.description, None);
        // Local-only avatars never reach the backend
        assert_eq!(cleaned.avatar_id, None);
    }

    #[test]
    fn hr_update_requires_fields() {
        let no_age = HrProfileUpdate {
            age: 0,
            ..filled()
        };
        assert!(matches!(normalize_hr_update(&no_age), Err(ApiError::Validation(_))));

        let no_category = HrProfileUpdate {
            profession_category: " ".to_string(),
            ..filled()
        };
        assert!(matches!(normalize_hr_update(&no_category), Err(ApiError::Validation(_))));

        let bad_email = HrProfileUpdate {
            email: "olga".to_string(),
            ..filled()
        };
        assert!(matches!(normalize_hr_update(&bad_email), Err(ApiError::Validation(_))));
    }
}
