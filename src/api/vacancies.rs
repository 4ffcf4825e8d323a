use serde_json::{Value, json};

use crate::{
    api::{decode, decode_items, unwrap_record},
    envelope::ListShape,
    error::ApiError,
    gateway::{ApiRequest, Method},
    models::{NewVacancy, PositionItem, VacancyItem, VacancyListParams, VacancyPage},
    resolver::{CandidateList, EndpointResolver},
};

/// Salary filter bounds offered by the vacancy search form.
pub const SALARY_MIN: u64 = 0;
pub const SALARY_MAX: u64 = 300_000;

/// VacanciesApi
///
/// Vacancy operations. Route candidates are listed most-likely-first.
#[derive(Clone)]
pub struct VacanciesApi {
    resolver: EndpointResolver,
}

impl VacanciesApi {
    pub fn new(resolver: EndpointResolver) -> Self {
        Self { resolver }
    }

    /// list
    ///
    /// `GET /vacancy`, falling back to `GET /vacancies`, with the filters as
    /// query parameters.
    pub async fn list(&self, params: &VacancyListParams) -> Result<VacancyPage, ApiError> {
        let params = normalize_params(params);
        let candidates = CandidateList::of(
            with_params(ApiRequest::get("/vacancy"), &params),
            [with_params(ApiRequest::get("/vacancies"), &params)],
        );

        let page = self
            .resolver
            .resolve_page("list vacancies", &candidates, &ListShape::named(&["vacancies"]))
            .await?;

        Ok(VacancyPage {
            vacancies: decode_items("list vacancies", page.items),
            pagination: page.pagination,
        })
    }

    /// Open positions/categories: `GET /positions`, then `GET /position`.
    pub async fn positions(&self) -> Result<Vec<PositionItem>, ApiError> {
        let candidates = CandidateList::of(
            ApiRequest::get("/positions"),
            [ApiRequest::get("/position")],
        );
        let items = self
            .resolver
            .resolve_list("list positions", &candidates, &ListShape::named(&["positions"]))
            .await?;
        Ok(decode_items("list positions", items))
    }

    /// The signed-in HR's own vacancies.
    pub async fn list_mine(&self) -> Result<Vec<VacancyItem>, ApiError> {
        let candidates = CandidateList::of(
            ApiRequest::get("/vacancies/my"),
            [
                ApiRequest::get("/vacancies/me"),
                ApiRequest::get("/hr/vacancies"),
                ApiRequest::get("/vacancies"),
            ],
        );
        let items = self
            .resolver
            .resolve_list("list own vacancies", &candidates, &ListShape::named(&["vacancies"]))
            .await?;
        Ok(decode_items("list own vacancies", items))
    }

    /// create
    ///
    /// Publishes a vacancy via `POST /hr/vacancy`, `/hr/vacancies` or
    /// `/vacancies`. A title is required. An empty success body yields the
    /// submitted fields without an id.
    pub async fn create(&self, vacancy: &NewVacancy) -> Result<VacancyItem, ApiError> {
        if vacancy.title.trim().is_empty() {
            return Err(ApiError::Validation("vacancy title is required".to_string()));
        }

        let body = serde_json::to_value(vacancy).map_err(|e| ApiError::Decode(e.to_string()))?;
        let candidates = CandidateList::of(
            ApiRequest::post("/hr/vacancy", body.clone()),
            [
                ApiRequest::post("/hr/vacancies", body.clone()),
                ApiRequest::post("/vacancies", body.clone()),
            ],
        );

        let created = self.resolver.resolve("create vacancy", &candidates).await?;
        match unwrap_record(created, "vacancy") {
            Value::Null => decode(body),
            record => decode(record),
        }
    }

    /// respond
    ///
    /// Sends the viewer's response to vacancy `id`. The backend has exposed this
    /// under several routes, with the id in the path or in the body, so every
    /// known shape is tried in turn.
    pub async fn respond(&self, id: &str) -> Result<(), ApiError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ApiError::Validation("vacancy id is required".to_string()));
        }

        let candidates = CandidateList::new("respond to vacancy", respond_routes(id))?;
        self.resolver.resolve("respond to vacancy", &candidates).await?;
        tracing::info!(vacancy_id = id, "vacancy response sent");
        Ok(())
    }
}

fn respond_routes(id: &str) -> Vec<ApiRequest> {
    let in_path = [
        "/vacancy/{}/respond",
        "/vacancy/{}/response",
        "/vacancy/{}/apply",
        "/vacancies/{}/respond",
        "/vacancies/{}/apply",
    ]
    .into_iter()
    .map(|template| ApiRequest::new(Method::Post, template.replace("{}", id)));
    let in_body = ["/vacancy/respond", "/vacancy/response", "/vacancy/apply"]
        .into_iter()
        .map(|path| ApiRequest::post(path, json!({ "vacancy_id": id })));
    in_path.chain(in_body).collect()
}

fn clamp_salary(value: u64) -> u64 {
    value.clamp(SALARY_MIN, SALARY_MAX)
}

/// Clamps salaries into the form's range and swaps inverted min/max pairs.
pub fn normalize_params(params: &VacancyListParams) -> VacancyListParams {
    let mut params = params.clone();
    params.min_salary = params.min_salary.map(clamp_salary);
    params.max_salary = params.max_salary.map(clamp_salary);

    if let (Some(min), Some(max)) = (params.min_salary, params.max_salary) {
        if min > max {
            params.min_salary = Some(max);
            params.max_salary = Some(min);
        }
    }
    if let (Some(min), Some(max)) = (params.min_experience, params.max_experience) {
        if min > max {
            params.min_experience = Some(max);
            params.max_experience = Some(min);
        }
    }
    params
}

fn with_params(request: ApiRequest, params: &VacancyListParams) -> ApiRequest {
    request
        .with_query_opt("page", params.page)
        .with_query_opt("limit", params.limit)
        .with_query_opt("company_id", params.company_id.as_deref())
        .with_query_opt("position_status", params.position_status.as_deref())
        .with_query_opt("work_format", params.work_format.as_deref())
        .with_query_opt("schedule", params.schedule.as_deref())
        .with_query_opt("min_salary", params.min_salary)
        .with_query_opt("max_salary", params.max_salary)
        .with_query_opt("min_experience", params.min_experience)
        .with_query_opt("max_experience", params.max_experience)
        .with_query_opt("search_title", params.search_title.as_deref())
}
