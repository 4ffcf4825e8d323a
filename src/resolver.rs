use serde_json::Value;

use crate::{
    envelope::{ListShape, pagination_of, unwrap_data},
    error::ApiError,
    gateway::{ApiRequest, TransportState},
    models::Page,
    session::SessionState,
};

/// CandidateList
///
/// Ordered, non-empty list of request shapes for one logical operation. The
/// first entry should be the shape the current backend most likely serves.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateList {
    candidates: Vec<ApiRequest>,
}

impl CandidateList {
    /// Fails with `ApiError::NoCandidates` when `candidates` is empty.
    pub fn new(operation: &str, candidates: Vec<ApiRequest>) -> Result<Self, ApiError> {
        if candidates.is_empty() {
            return Err(ApiError::NoCandidates(operation.to_string()));
        }
        Ok(Self { candidates })
    }

    pub fn of(first: ApiRequest, rest: impl IntoIterator<Item = ApiRequest>) -> Self {
        let mut candidates = vec![first];
        candidates.extend(rest);
        Self { candidates }
    }

    pub fn single(request: ApiRequest) -> Self {
        Self {
            candidates: vec![request],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ApiRequest> {
        self.candidates.iter()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// EndpointResolver
///
/// Runs a logical operation against a backend whose routes moved around during
/// development (`/vacancy` vs `/vacancies`, `/company` vs `/companies`, ...).
///
/// Candidates are tried strictly in order, each awaited before the next. The
/// first success wins and nothing after it is issued. When every candidate
/// fails, the error of the last one is returned and the earlier ones are only
/// logged. There is no retry, backoff, memo of the winning shape or
/// cancellation. Two concurrent calls are independent and may finish in either
/// order; discarding stale results is the caller's business.
#[derive(Clone)]
pub struct EndpointResolver {
    transport: TransportState,
    sessions: SessionState,
}

impl EndpointResolver {
    pub fn new(transport: TransportState, sessions: SessionState) -> Self {
        Self {
            transport,
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionState {
        &self.sessions
    }

    /// resolve
    ///
    /// Returns the first successful payload with its `data` envelope removed.
    pub async fn resolve(
        &self,
        operation: &str,
        candidates: &CandidateList,
    ) -> Result<Value, ApiError> {
        let body = self.first_success(operation, candidates).await?;
        Ok(unwrap_data(&body).clone())
    }

    /// resolve_list
    ///
    /// As `resolve`, then pulls the list out with `shape`. A successful response
    /// without any recognisable array is an empty list, not an error.
    pub async fn resolve_list(
        &self,
        operation: &str,
        candidates: &CandidateList,
        shape: &ListShape,
    ) -> Result<Vec<Value>, ApiError> {
        let body = self.first_success(operation, candidates).await?;
        Ok(extract_or_empty(operation, &body, shape))
    }

    /// resolve_page
    ///
    /// As `resolve_list`, keeping the backend's pagination block if it sent one.
    pub async fn resolve_page(
        &self,
        operation: &str,
        candidates: &CandidateList,
        shape: &ListShape,
    ) -> Result<Page<Value>, ApiError> {
        let body = self.first_success(operation, candidates).await?;
        Ok(Page {
            items: extract_or_empty(operation, &body, shape),
            pagination: pagination_of(&body),
        })
    }

    /// Single-shape call; the payload is still `data`-unwrapped.
    pub async fn fetch(&self, operation: &str, request: ApiRequest) -> Result<Value, ApiError> {
        self.resolve(operation, &CandidateList::single(request)).await
    }

    async fn first_success(
        &self,
        operation: &str,
        candidates: &CandidateList,
    ) -> Result<Value, ApiError> {
        let session = self.sessions.get();
        let bearer = session.bearer();
        let mut last_error = None;

        for (attempt, request) in candidates.iter().enumerate() {
            match self.transport.send(request, bearer).await {
                Ok(body) => {
                    tracing::debug!(
                        operation,
                        attempt,
                        request = %request.describe(),
                        "candidate succeeded"
                    );
                    return Ok(body);
                }
                Err(e) => {
                    tracing::warn!(
                        operation,
                        attempt,
                        request = %request.describe(),
                        error = %e,
                        "candidate failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ApiError::NoCandidates(operation.to_string())))
    }
}

fn extract_or_empty(operation: &str, body: &Value, shape: &ListShape) -> Vec<Value> {
    match shape.extract(body) {
        Some(items) => items,
        None => {
            tracing::debug!(operation, "no list in response, treating as empty");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_candidate_list_is_rejected() {
        let err = CandidateList::new("list vacancies", Vec::new()).unwrap_err();
        assert_eq!(err, ApiError::NoCandidates("list vacancies".to_string()));
    }

    #[test]
    fn candidate_order_is_preserved() {
        let list = CandidateList::of(
            ApiRequest::get("/vacancy"),
            [ApiRequest::get("/vacancies")],
        );
        let paths: Vec<&str> = list.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/vacancy", "/vacancies"]);
        assert_eq!(list.len(), 2);
    }
}
