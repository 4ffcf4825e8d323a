use crate::{
    api::decode_items,
    envelope::ListShape,
    error::ApiError,
    gateway::ApiRequest,
    models::{UserListItem, UsersListParams, UsersPage},
    resolver::{CandidateList, EndpointResolver},
    roles::is_employer_like,
};

#[derive(Clone)]
pub struct UsersApi {
    resolver: EndpointResolver,
}

impl UsersApi {
    pub fn new(resolver: EndpointResolver) -> Self {
        Self { resolver }
    }

    /// list
    ///
    /// `GET /users` for the profile directory. Employer accounts and stub
    /// profiles are hidden; `search_name` matches the full name client-side.
    pub async fn list(&self, params: &UsersListParams) -> Result<UsersPage, ApiError> {
        let request = ApiRequest::get("/users")
            .with_query_opt("page", params.page)
            .with_query_opt("limit", params.limit)
            .with_query_opt("category", params.category.as_deref());

        let found = self
            .resolver
            .resolve_page(
                "list users",
                &CandidateList::single(request),
                &ListShape::named(&["profiles", "users"]),
            )
            .await?;

        let needle = params
            .search_name
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_default();

        let profiles = decode_items::<UserListItem>("list users", found.items)
            .into_iter()
            .filter(|user| !user.role.as_deref().is_some_and(is_employer_like))
            .filter(|user| !user.is_stub())
            .filter(|user| needle.is_empty() || user.full_name().to_lowercase().contains(&needle))
            .collect();

        Ok(UsersPage {
            profiles,
            pagination: found.pagination,
        })
    }
}
