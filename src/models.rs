use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

// --- Lenient Field Decoding ---

/// Backend revisions disagree on scalar types: ids come as strings or numbers,
/// salaries and ages sometimes as numeric strings. These decoders accept either
/// form and turn anything else into `None`, so one odd field never costs the
/// whole record.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;
    use std::str::FromStr;

    pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(text) => Some(text),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
    }

    pub fn float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn unsigned<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<u64> + FromStr,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(number) => number.as_u64().and_then(|n| T::try_from(n).ok()),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        })
    }
}

// --- Shared List Schemas ---

/// Pagination
///
/// Pagination block some list endpoints send next to their items.
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default, PartialEq)]
#[ts(export)]
pub struct Pagination {
    #[serde(default, deserialize_with = "lenient::unsigned")]
    pub current_page: Option<u64>,
    #[serde(default, deserialize_with = "lenient::unsigned")]
    pub pages: Option<u64>,
    #[serde(default, deserialize_with = "lenient::unsigned")]
    pub total: Option<u64>,
}

/// Page
///
/// A normalised list response: the items plus pagination when the backend sent it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Option<Pagination>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pagination: None,
        }
    }
}

// --- Vacancy Schemas ---

/// VacancyItem
///
/// A vacancy as the listing endpoints return it. Every field is optional: the
/// record shape changed between backend revisions (`create_at` vs `created_at`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default, PartialEq)]
#[ts(export)]
pub struct VacancyItem {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: Option<String>,
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub salary: Option<f64>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub experience: Option<f64>,
    pub schedule: Option<String>,
    pub work_format: Option<String>,
    pub position_status: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub company_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub attachment_id: Option<String>,
    pub attachment_url: Option<String>,
    pub create_at: Option<String>,
    pub created_at: Option<String>,
}

impl VacancyItem {
    /// The owning company, ignoring the `"string"` placeholder the API docs'
    /// example payload left behind in some records.
    pub fn company_ref(&self) -> Option<&str> {
        self.company_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty() && *id != "string")
    }

    pub fn created(&self) -> Option<&str> {
        self.created_at.as_deref().or(self.create_at.as_deref())
    }
}

/// NewVacancy
///
/// Input payload for publishing a vacancy. Unset fields are omitted from the JSON.
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default, PartialEq)]
#[ts(export)]
pub struct NewVacancy {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
}

/// VacancyListParams
///
/// Query filters accepted by the vacancy listing.
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default, PartialEq)]
#[ts(export)]
pub struct VacancyListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub company_id: Option<String>,
    pub position_status: Option<String>,
    pub work_format: Option<String>,
    pub schedule: Option<String>,
    pub min_salary: Option<u64>,
    pub max_salary: Option<u64>,
    pub min_experience: Option<u32>,
    pub max_experience: Option<u32>,
    pub search_title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, Default, PartialEq)]
#[ts(export)]
pub struct VacancyPage {
    pub vacancies: Vec<VacancyItem>,
    pub pagination: Option<Pagination>,
}

/// PositionItem
///
/// An open position/category; different revisions label it differently.
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default, PartialEq)]
#[ts(export)]
pub struct PositionItem {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: Option<String>,
    pub title: Option<String>,
    pub name: Option<String>,
    pub value: Option<String>,
}

impl PositionItem {
    /// First non-blank of title, name, value, id.
    pub fn label(&self) -> String {
        [&self.title, &self.name, &self.value, &self.id]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string()
    }
}

// --- Company Schemas ---

/// CompanyType
///
/// The company type arrives either as a plain string or as `{ "value": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq)]
#[serde(untagged)]
#[ts(export)]
pub enum CompanyType {
    Plain(String),
    Tagged { value: Option<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, Default, PartialEq)]
#[ts(export)]
pub struct CompanyItem {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub city: Option<String>,
    pub site: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<CompanyType>,
    pub company_type: Option<String>,
    pub logo_url: Option<String>,
    pub image_url: Option<String>,
    pub avatar_url: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl CompanyItem {
    /// Type label from `type` (either form) or the flat `company_type` field.
    pub fn type_label(&self) -> String {
        let from_type = match &self.kind {
            Some(CompanyType::Plain(value)) => Some(value.trim()),
            Some(CompanyType::Tagged { value }) => value.as_deref().map(str::trim),
            None => None,
        }
        .filter(|s| !s.is_empty());

        from_type
            .or_else(|| non_blank(&self.company_type))
            .unwrap_or_default()
            .to_string()
    }

    /// A listable company has a name and at least one other detail. The
    /// directory hides placeholder records that have neither.
    pub fn is_listable(&self) -> bool {
        if non_blank(&self.name).is_none() {
            return false;
        }
        non_blank(&self.description).is_some()
            || non_blank(&self.city).is_some()
            || non_blank(&self.site).is_some()
            || !self.type_label().is_empty()
    }

    pub fn backend_logo_url(&self) -> Option<&str> {
        non_blank(&self.logo_url)
            .or_else(|| non_blank(&self.image_url))
            .or_else(|| non_blank(&self.avatar_url))
    }

    /// The company site as a clickable URL (`https://` added when missing).
    pub fn site_url(&self) -> Option<String> {
        let site = non_blank(&self.site)?;
        let lower = site.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Some(site.to_string())
        } else {
            Some(format!("https://{}", site))
        }
    }
}

/// CompanyFilter
///
/// Filters of the company directory. `search_name` is applied client-side.
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default, PartialEq)]
#[ts(export)]
pub struct CompanyFilter {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub city: Option<String>,
    pub company_type: Option<String>,
    pub search_name: Option<String>,
}

/// CompanyUpdate
///
/// Text fields of a company record as `PATCH /company` takes them. Missing
/// values are sent as empty strings and the type always in its `{ "value" }` form.
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default, PartialEq)]
#[ts(export)]
pub struct CompanyUpdate {
    pub id: String,
    pub name: String,
    pub city: String,
    pub site: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: TypeValue,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, Default, PartialEq)]
#[ts(export)]
pub struct TypeValue {
    pub value: String,
}

impl CompanyUpdate {
    /// The editable fields of `company`, blanks where it has none.
    pub fn from_item(company: &CompanyItem) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            id: text(&company.id),
            name: text(&company.name),
            city: text(&company.city),
            site: text(&company.site),
            description: text(&company.description),
            kind: TypeValue {
                value: company.type_label(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, Default, PartialEq)]
#[ts(export)]
pub struct CompanyPage {
    pub companies: Vec<CompanyItem>,
    pub pagination: Option<Pagination>,
}

// --- User Directory Schemas ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, Default, PartialEq)]
#[ts(export)]
pub struct UserListItem {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::unsigned")]
    pub age: Option<u32>,
    pub email: Option<String>,
    pub tg: Option<String>,
    pub telegram: Option<String>,
    pub description: Option<String>,
    pub profession_category: Option<String>,
    pub specialization: Option<String>,
    pub avatar_url: Option<String>,
    pub avatar_id: Option<String>,
    pub resume_url: Option<String>,
    pub resume_id: Option<String>,
    pub role: Option<String>,
}

impl UserListItem {
    pub fn telegram_handle(&self) -> Option<&str> {
        non_blank(&self.tg).or_else(|| non_blank(&self.telegram))
    }

    pub fn full_name(&self) -> String {
        [non_blank(&self.first_name), non_blank(&self.last_name)]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// A stub profile: no name and nothing useful, only an email or an age.
    pub fn is_stub(&self) -> bool {
        let has_useful = self.telegram_handle().is_some()
            || non_blank(&self.description).is_some()
            || non_blank(&self.profession_category).is_some();
        if has_useful {
            return false;
        }
        let no_real_name =
            non_blank(&self.first_name).is_none() && non_blank(&self.last_name).is_none();
        let has_only_noise = non_blank(&self.email).is_some() || self.age.is_some();
        no_real_name && has_only_noise
    }
}

/// HrProfile
///
/// The signed-in HR account as `GET /hr/me` returns it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default, PartialEq)]
#[ts(export)]
pub struct HrProfile {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub hr_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::unsigned")]
    pub age: Option<u32>,
    pub email: Option<String>,
    pub telegram: Option<String>,
    pub tg: Option<String>,
    pub profession_category: Option<String>,
    pub specialization: Option<String>,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
}

impl HrProfile {
    /// The account id; older revisions call it `hr_id`.
    pub fn profile_id(&self) -> Option<&str> {
        non_blank(&self.id).or_else(|| non_blank(&self.hr_id))
    }

    pub fn telegram_handle(&self) -> Option<&str> {
        non_blank(&self.telegram).or_else(|| non_blank(&self.tg))
    }

    pub fn category(&self) -> Option<&str> {
        non_blank(&self.profession_category).or_else(|| non_blank(&self.specialization))
    }
}

/// HrProfileUpdate
///
/// Input payload for `PATCH /hr/edit`. Optional fields left unset are omitted.
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default, PartialEq)]
#[ts(export)]
pub struct HrProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram: Option<String>,
    pub profession_category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, Default, PartialEq)]
#[ts(export)]
pub struct UsersListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<String>,
    /// Applied client-side to the returned page.
    pub search_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, Default, PartialEq)]
#[ts(export)]
pub struct UsersPage {
    pub profiles: Vec<UserListItem>,
    pub pagination: Option<Pagination>,
}

// --- Auth & Files ---

/// LoginRequest
///
/// Input payload for `POST /auth/login`. The role is the client's guess; the
/// backend's answer wins when it sends one.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// RegisterRequest
///
/// Input payload for `POST /auth/register`. The password is only passed through
/// to the backend and never logged.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: String,
    pub login: String,
}

/// AuthResponse
///
/// What login/registration answered, normalised. The token field name and the
/// place of the role differ between backend revisions.
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default, PartialEq)]
#[ts(export)]
pub struct AuthResponse {
    pub token: Option<String>,
    pub role: Option<String>,
}

impl AuthResponse {
    /// Token from `token`, `access_token`, `accessToken` or `jwt`; role from
    /// `role`, `user.role` or `data.role`. Blank strings count as absent.
    pub fn from_body(body: &Value) -> Self {
        let text = |value: Option<&Value>| {
            value
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let token = ["token", "access_token", "accessToken", "jwt"]
            .iter()
            .find_map(|key| text(body.get(*key)));
        let role = text(body.get("role"))
            .or_else(|| text(body.pointer("/user/role")))
            .or_else(|| text(body.pointer("/data/role")));

        Self { token, role }
    }
}

/// ResumeInfo
///
/// The viewer's uploaded resume file.
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default, PartialEq)]
#[ts(export)]
pub struct ResumeInfo {
    pub file_name: String,
    pub url: Option<String>,
}
