use serde_json::Value;

use crate::{
    api::{decode, decode_items, unwrap_record},
    envelope::ListShape,
    error::ApiError,
    gateway::ApiRequest,
    models::{CompanyFilter, CompanyItem, CompanyPage, CompanyUpdate},
    resolver::{CandidateList, EndpointResolver},
};

/// Page size of the company directory.
pub const DEFAULT_COMPANY_LIMIT: u32 = 9;

#[derive(Clone)]
pub struct CompaniesApi {
    resolver: EndpointResolver,
}

impl CompaniesApi {
    pub fn new(resolver: EndpointResolver) -> Self {
        Self { resolver }
    }

    /// search
    ///
    /// Company picker lookup. Tries `/company`, `/companies`, `/company/search`
    /// and `/company/list`, passing `q` only when the query is non-blank.
    pub async fn search(&self, query: &str) -> Result<Vec<CompanyItem>, ApiError> {
        let q = query.trim();
        let candidates = CandidateList::of(
            ApiRequest::get("/company").with_query("q", q),
            ["/companies", "/company/search", "/company/list"]
                .into_iter()
                .map(|path| ApiRequest::get(path).with_query("q", q)),
        );

        let items = self
            .resolver
            .resolve_list("search companies", &candidates, &ListShape::named(&["companies"]))
            .await?;
        Ok(decode_items("search companies", items))
    }

    /// list
    ///
    /// Company directory page. Placeholder companies are dropped and the
    /// `search_name` filter is applied to the names on this page only.
    pub async fn list(&self, filter: &CompanyFilter) -> Result<CompanyPage, ApiError> {
        let page = filter.page.unwrap_or(1).max(1);
        let limit = filter.limit.unwrap_or(DEFAULT_COMPANY_LIMIT);
        let request = ApiRequest::get("/company")
            .with_query("page", page)
            .with_query("limit", limit)
            .with_query_opt("city", filter.city.as_deref())
            .with_query_opt("type", filter.company_type.as_deref());

        let found = self
            .resolver
            .resolve_page(
                "list companies",
                &CandidateList::single(request),
                &ListShape::named(&["companies"]),
            )
            .await?;

        let needle = filter
            .search_name
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_default();

        let companies = decode_items::<CompanyItem>("list companies", found.items)
            .into_iter()
            .filter(CompanyItem::is_listable)
            .filter(|company| {
                needle.is_empty()
                    || company
                        .name
                        .as_deref()
                        .unwrap_or_default()
                        .to_lowercase()
                        .contains(&needle)
            })
            .collect();

        Ok(CompanyPage {
            companies,
            pagination: found.pagination,
        })
    }

    /// `GET /company/{id}`. Blank ids and the `"string"` placeholder are
    /// rejected without a request.
    pub async fn get(&self, id: &str) -> Result<CompanyItem, ApiError> {
        let id = id.trim();
        if id.is_empty() || id == "string" {
            return Err(ApiError::Validation(format!("invalid company id `{}`", id)));
        }
        let body = self
            .resolver
            .fetch("get company", ApiRequest::get(format!("/company/{}", id)))
            .await?;
        decode_company(body)
    }

    /// The company owned by the signed-in account.
    pub async fn me(&self) -> Result<CompanyItem, ApiError> {
        let body = self
            .resolver
            .fetch("get own company", ApiRequest::get("/company/me"))
            .await?;
        decode_company(body)
    }

    /// update
    ///
    /// Saves the company's text fields with `PATCH /company`. The id travels in
    /// the body and must be set.
    pub async fn update(&self, company: &CompanyUpdate) -> Result<(), ApiError> {
        if company.id.trim().is_empty() {
            return Err(ApiError::Validation("company id is required".to_string()));
        }
        let body = serde_json::to_value(company).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.resolver
            .fetch("update company", ApiRequest::patch("/company", body))
            .await?;
        Ok(())
    }

    /// Display name for a vacancy's company; lookup failures only get logged.
    pub async fn company_name(&self, id: &str) -> Option<String> {
        match self.get(id).await {
            Ok(company) => company
                .name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
            Err(e) => {
                tracing::debug!(company_id = id, error = %e, "company name lookup failed");
                None
            }
        }
    }
}

fn decode_company(body: Value) -> Result<CompanyItem, ApiError> {
    match unwrap_record(body, "company") {
        Value::Null => Err(ApiError::MissingField("company")),
        record => decode(record),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn company_record_is_found_with_or_without_wrapper() {
        let wrapped = decode_company(json!({ "company": { "id": "c1", "name": "Acme" } })).unwrap();
        let bare = decode_company(json!({ "id": "c1", "name": "Acme" })).unwrap();
        assert_eq!(wrapped, bare);
        assert_eq!(wrapped.name.as_deref(), Some("Acme"));
    }

    #[test]
    fn empty_record_is_missing() {
        assert_eq!(
            decode_company(Value::Null).unwrap_err(),
            ApiError::MissingField("company")
        );
    }
}
