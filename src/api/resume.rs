use serde_json::Value;

use crate::{
    error::ApiError,
    gateway::{ApiRequest, FormFile},
    models::ResumeInfo,
    resolver::EndpointResolver,
};

const RESUME_PATH: &str = "/users/files/resume";
// Multipart field the backend reads the resume from.
const RESUME_FIELD: &str = "resume";

#[derive(Clone)]
pub struct ResumeApi {
    resolver: EndpointResolver,
}

impl ResumeApi {
    pub fn new(resolver: EndpointResolver) -> Self {
        Self { resolver }
    }

    /// get
    ///
    /// The viewer's resume, or `None` when none is uploaded (404).
    pub async fn get(&self) -> Result<Option<ResumeInfo>, ApiError> {
        match self.resolver.fetch("get resume", ApiRequest::get(RESUME_PATH)).await {
            Ok(body) => Ok(resume_from(&body)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => {
                tracing::error!(error = %e, "failed to load resume");
                Err(e)
            }
        }
    }

    /// upload
    ///
    /// Sends the file as multipart form data under the `resume` field,
    /// replacing any previous resume.
    pub async fn upload(
        &self,
        file_name: &str,
        mime: &str,
        bytes: Vec<u8>,
    ) -> Result<(), ApiError> {
        if bytes.is_empty() {
            return Err(ApiError::Validation("resume file is empty".to_string()));
        }

        let file = FormFile {
            field: RESUME_FIELD.to_string(),
            file_name: file_name.trim().to_string(),
            mime: mime.to_string(),
            bytes,
        };
        self.resolver
            .fetch("upload resume", ApiRequest::upload(RESUME_PATH, file))
            .await
            .inspect_err(|e| {
                tracing::error!(status = e.status(), error = %e, "failed to upload resume")
            })?;
        Ok(())
    }

    pub async fn remove(&self) -> Result<(), ApiError> {
        self.resolver
            .fetch("remove resume", ApiRequest::delete(RESUME_PATH))
            .await?;
        Ok(())
    }
}

fn resume_from(body: &Value) -> Option<ResumeInfo> {
    let info = ["file_info", "resume"]
        .iter()
        .filter_map(|key| body.get(*key))
        .find(|value| !value.is_null())
        .unwrap_or(body);

    if info.is_null() {
        return None;
    }

    let file_name = ["file_name", "filename"]
        .iter()
        .filter_map(|key| info.get(*key).and_then(Value::as_str))
        .next()
        .unwrap_or("resume")
        .to_string();
    let url = ["download_url", "url"]
        .iter()
        .filter_map(|key| info.get(*key).and_then(Value::as_str))
        .next()
        .map(str::to_string);

    Some(ResumeInfo { file_name, url })
}
