use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    error::StoreError,
    storage::{KeyValueStore, StoreState, read_json},
};

/// Largest logo kept locally, in bytes.
pub const MAX_LOGO_BYTES: u64 = 2 * 1024 * 1024;
/// Largest single company document kept locally, in bytes.
pub const MAX_DOCUMENT_BYTES: u64 = 2 * 1024 * 1024;
/// Most documents kept locally per company.
pub const MAX_DOCUMENTS: usize = 20;

/// BindingError
///
/// Why a local binding update was refused.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindingError {
    #[error("`{name}` is {size} bytes, the limit is {limit}")]
    TooLarge { name: String, size: u64, limit: u64 },

    #[error("at most {0} documents can be stored")]
    TooManyDocuments(usize),

    #[error("company id is required")]
    MissingCompanyId,

    #[error(transparent)]
    Store(#[from] StoreError),
}

fn write_json<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let encoded = serde_json::to_string(value).map_err(|e| StoreError::Encode {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    store.set(key, encoded)
}

// --- HR id lists ---

/// IdList
///
/// An ordered, de-duplicated id list kept as a JSON array under one key.
/// Newest first.
#[derive(Clone)]
struct IdList {
    store: StoreState,
    prefix: &'static str,
}

impl IdList {
    fn key(&self, owner_id: &str) -> String {
        format!("{}{}", self.prefix, owner_id.trim())
    }

    fn list(&self, owner_id: &str) -> Vec<String> {
        let ids: Vec<String> = read_json(self.store.as_ref(), &self.key(owner_id), Vec::new());
        ids.into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect()
    }

    fn add(&self, owner_id: &str, id: &str) -> Result<Vec<String>, StoreError> {
        let id = id.trim();
        let mut ids = self.list(owner_id);
        if id.is_empty() {
            return Ok(ids);
        }
        ids.retain(|existing| existing != id);
        ids.insert(0, id.to_string());
        write_json(self.store.as_ref(), &self.key(owner_id), &ids)?;
        Ok(ids)
    }

    fn remove(&self, owner_id: &str, id: &str) -> Result<Vec<String>, StoreError> {
        let id = id.trim();
        let mut ids = self.list(owner_id);
        ids.retain(|existing| existing != id);
        write_json(self.store.as_ref(), &self.key(owner_id), &ids)?;
        Ok(ids)
    }
}

/// HrCompanyBindings
///
/// Which companies an HR account works for. The backend has no such relation
/// yet, so it lives in the local store under `hr_companies_{hr_id}`.
#[derive(Clone)]
pub struct HrCompanyBindings {
    ids: IdList,
}

impl HrCompanyBindings {
    pub fn new(store: StoreState) -> Self {
        Self {
            ids: IdList {
                store,
                prefix: "hr_companies_",
            },
        }
    }

    pub fn list(&self, hr_id: &str) -> Vec<String> {
        self.ids.list(hr_id)
    }

    /// Moves `company_id` to the front. Blank ids are ignored.
    pub fn add(&self, hr_id: &str, company_id: &str) -> Result<Vec<String>, StoreError> {
        self.ids.add(hr_id, company_id)
    }

    pub fn remove(&self, hr_id: &str, company_id: &str) -> Result<Vec<String>, StoreError> {
        self.ids.remove(hr_id, company_id)
    }
}

/// HrVacancyBindings
///
/// Vacancies an HR account published, under `hr_vacancies_{hr_id}`. Used when
/// no "my vacancies" route answers.
#[derive(Clone)]
pub struct HrVacancyBindings {
    ids: IdList,
}

impl HrVacancyBindings {
    pub fn new(store: StoreState) -> Self {
        Self {
            ids: IdList {
                store,
                prefix: "hr_vacancies_",
            },
        }
    }

    pub fn list(&self, hr_id: &str) -> Vec<String> {
        self.ids.list(hr_id)
    }

    pub fn add(&self, hr_id: &str, vacancy_id: &str) -> Result<Vec<String>, StoreError> {
        self.ids.add(hr_id, vacancy_id)
    }

    pub fn remove(&self, hr_id: &str, vacancy_id: &str) -> Result<Vec<String>, StoreError> {
        self.ids.remove(hr_id, vacancy_id)
    }
}

// --- Company assets ---

/// StoredFile
///
/// A file kept inline as a data URL. Timestamps are epoch milliseconds on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredFile {
    #[serde(default)]
    pub id: String,
    pub original_name: String,
    pub mime: String,
    pub size: u64,
    #[serde(rename = "dataUrl")]
    pub data_url: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// FileUpload
///
/// A file picked by the user, already read as a data URL.
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub original_name: String,
    pub mime: String,
    pub size: u64,
    pub data_url: String,
}

impl FileUpload {
    fn into_stored(self) -> StoredFile {
        StoredFile {
            id: Uuid::new_v4().to_string(),
            original_name: self.original_name,
            mime: self.mime,
            size: self.size,
            data_url: self.data_url,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CompanyLocalData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<StoredFile>,
    #[serde(default)]
    pub documents: Vec<StoredFile>,
}

/// CompanyAssets
///
/// Company logo and documents kept locally under `company_local_{company_id}`.
/// Data URLs are large, so the store's quota is the usual failure here.
#[derive(Clone)]
pub struct CompanyAssets {
    store: StoreState,
}

impl CompanyAssets {
    pub fn new(store: StoreState) -> Self {
        Self { store }
    }

    fn key(company_id: &str) -> String {
        format!("company_local_{}", company_id.trim())
    }

    fn checked_id(company_id: &str) -> Result<&str, BindingError> {
        let id = company_id.trim();
        if id.is_empty() {
            return Err(BindingError::MissingCompanyId);
        }
        Ok(id)
    }

    pub fn load(&self, company_id: &str) -> CompanyLocalData {
        read_json(self.store.as_ref(), &Self::key(company_id), CompanyLocalData::default())
    }

    fn save(&self, company_id: &str, data: &CompanyLocalData) -> Result<(), BindingError> {
        write_json(self.store.as_ref(), &Self::key(company_id), data)?;
        Ok(())
    }

    /// The local logo, falling back to the older `company_logo_{id}` entry.
    pub fn logo_data_url(&self, company_id: &str) -> Option<String> {
        let id = company_id.trim();
        if id.is_empty() {
            return None;
        }
        self.load(id)
            .logo
            .map(|logo| logo.data_url)
            .filter(|url| !url.trim().is_empty())
            .or_else(|| {
                self.store
                    .get(&format!("company_logo_{}", id))
                    .filter(|url| !url.trim().is_empty())
            })
    }

    pub fn set_logo(
        &self,
        company_id: &str,
        upload: FileUpload,
    ) -> Result<StoredFile, BindingError> {
        let id = Self::checked_id(company_id)?;
        if upload.size > MAX_LOGO_BYTES {
            return Err(BindingError::TooLarge {
                name: upload.original_name,
                size: upload.size,
                limit: MAX_LOGO_BYTES,
            });
        }

        let mut data = self.load(id);
        let logo = upload.into_stored();
        data.logo = Some(logo.clone());
        self.save(id, &data)?;
        Ok(logo)
    }

    pub fn remove_logo(&self, company_id: &str) -> Result<(), BindingError> {
        let id = Self::checked_id(company_id)?;
        let mut data = self.load(id);
        data.logo = None;
        self.save(id, &data)
    }

    /// Appends a document. Refused when it is too large or the company is
    /// already at the document limit.
    pub fn add_document(
        &self,
        company_id: &str,
        upload: FileUpload,
    ) -> Result<StoredFile, BindingError> {
        let id = Self::checked_id(company_id)?;
        if upload.size > MAX_DOCUMENT_BYTES {
            return Err(BindingError::TooLarge {
                name: upload.original_name,
                size: upload.size,
                limit: MAX_DOCUMENT_BYTES,
            });
        }

        let mut data = self.load(id);
        if data.documents.len() >= MAX_DOCUMENTS {
            return Err(BindingError::TooManyDocuments(MAX_DOCUMENTS));
        }

        let document = upload.into_stored();
        data.documents.push(document.clone());
        self.save(id, &data)?;
        Ok(document)
    }

    /// Removes the document with `document_id`; unknown ids are a no-op.
    pub fn remove_document(&self, company_id: &str, document_id: &str) -> Result<(), BindingError> {
        let id = Self::checked_id(company_id)?;
        let mut data = self.load(id);
        let before = data.documents.len();
        data.documents.retain(|doc| doc.id != document_id);
        if data.documents.len() == before {
            return Ok(());
        }
        self.save(id, &data)
    }
}
