use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde_json::{Value, json};
use std::collections::HashMap;

use crate::{
    error::ApiError,
    gateway::ApiRequest,
    guard::SessionGuard,
    models::{AuthResponse, LoginRequest, RegisterRequest},
    resolver::EndpointResolver,
    roles::ROLE_STUDENT,
    session::Session,
    storage::{StoreState, read_json},
};

/// Local store key of the `email -> role` map remembered at registration.
pub const USER_ROLES_KEY: &str = "userRoles";

/// Shown instead of the backend's wording for a failed credential check.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Неверный email или пароль.";

const MIN_PASSWORD_LEN: usize = 6;

// Claim names the backend has used for the account role.
const ROLE_CLAIMS: [&str; 3] = ["role", "roles", "authorities"];

/// AuthApi
///
/// Login, registration and logout. These are the only flows that write the
/// session; everything else just reads it.
///
/// The session is written as two store operations (token first, then role),
/// so an interrupted write can leave a token without its role. The guard reads
/// that as "authenticated, no role".
#[derive(Clone)]
pub struct AuthApi {
    resolver: EndpointResolver,
    store: StoreState,
    guard: SessionGuard,
}

impl AuthApi {
    pub fn new(resolver: EndpointResolver, store: StoreState, guard: SessionGuard) -> Self {
        Self {
            resolver,
            store,
            guard,
        }
    }

    /// login
    ///
    /// Validates the form, posts to `/auth/login`, stores the session and
    /// returns the landing path for the resulting role.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let email = validate_email(email)?;
        let password = validate_password(password)?;
        let guessed_role = self.remembered_role(&email);

        let payload = LoginRequest {
            email: email.clone(),
            password,
            role: guessed_role.clone(),
        };
        let body = serde_json::to_value(&payload).map_err(|e| ApiError::Decode(e.to_string()))?;

        let response = self
            .resolver
            .fetch("login", ApiRequest::post("/auth/login", body))
            .await
            .map_err(friendly_login_error)?;

        let auth = AuthResponse::from_body(&response);
        let token = auth.token.ok_or(ApiError::MissingField("token"))?;
        let role = auth
            .role
            .or_else(|| role_from_token(&token))
            .or(guessed_role)
            .unwrap_or_else(|| ROLE_STUDENT.to_string());

        let session = Session::new(token, role);
        self.resolver.sessions().set(session.clone())?;

        let landing = self.guard.landing_path(&session);
        tracing::info!(landing = %landing, "signed in");
        Ok(landing)
    }

    /// register
    ///
    /// Posts to `/auth/register` and remembers the chosen role for this email,
    /// so a later login can send it along. Signs the viewer in straight away
    /// when the backend returns a token; returns whether it did.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        role: &str,
        login: &str,
    ) -> Result<bool, ApiError> {
        let email = validate_email(email)?;
        let password = validate_password(password)?;
        let role = role.trim().to_string();

        let payload = RegisterRequest {
            email: email.clone(),
            password,
            role: role.clone(),
            login: login.trim().to_string(),
        };
        let body = serde_json::to_value(&payload).map_err(|e| ApiError::Decode(e.to_string()))?;

        let response = self
            .resolver
            .fetch("register", ApiRequest::post("/auth/register", body))
            .await?;

        if let Err(e) = self.remember_role(&email, &role) {
            tracing::warn!(error = %e, "could not remember role for email");
        }

        let auth = AuthResponse::from_body(&response);
        match auth.token {
            Some(token) => {
                let role = auth.role.unwrap_or(role);
                self.resolver.sessions().set(Session::new(token, role))?;
                tracing::info!("registered and signed in");
                Ok(true)
            }
            None => {
                tracing::info!("registered, sign-in still required");
                Ok(false)
            }
        }
    }

    /// Tells the backend, then clears the session whatever it answered.
    pub async fn logout(&self) {
        if let Err(e) = self
            .resolver
            .fetch("logout", ApiRequest::post("/auth/logout", json!({})))
            .await
        {
            tracing::warn!(error = %e, "logout request failed, clearing session anyway");
        }
        self.resolver.sessions().clear();
    }

    fn remembered_role(&self, email: &str) -> Option<String> {
        let roles: HashMap<String, String> =
            read_json(self.store.as_ref(), USER_ROLES_KEY, HashMap::new());
        roles.get(email).cloned()
    }

    fn remember_role(&self, email: &str, role: &str) -> Result<(), ApiError> {
        if role.is_empty() {
            return Ok(());
        }
        let mut roles: HashMap<String, String> =
            read_json(self.store.as_ref(), USER_ROLES_KEY, HashMap::new());
        roles.insert(email.to_string(), role.to_string());
        let encoded = serde_json::to_string(&roles).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.store.set(USER_ROLES_KEY, encoded)?;
        Ok(())
    }
}

/// Trims and lower-cases the email after a loose `something@host.tld` check.
pub fn validate_email(email: &str) -> Result<String, ApiError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ApiError::Validation("email is required".to_string()));
    }

    let well_formed = !email.chars().any(char::is_whitespace)
        && email.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty()
                && domain
                    .rsplit_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        });
    if !well_formed {
        return Err(ApiError::Validation("email is not valid".to_string()));
    }
    Ok(email.to_lowercase())
}

pub fn validate_password(password: &str) -> Result<String, ApiError> {
    let password = password.trim();
    if password.is_empty() {
        return Err(ApiError::Validation("password is required".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(password.to_string())
}

/// role_from_token
///
/// Reads the role claim out of a JWT payload. The client holds no key, so the
/// signature and expiry are not checked; the value only picks a landing page
/// and the backend still authorises every call.
pub fn role_from_token(token: &str) -> Option<String> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let claims = match decode::<Value>(token, &DecodingKey::from_secret(&[]), &validation) {
        Ok(data) => data.claims,
        Err(e) => {
            tracing::debug!(error = %e, "token payload unreadable");
            return None;
        }
    };

    ROLE_CLAIMS
        .iter()
        .filter_map(|claim| claims.get(*claim))
        .find_map(first_text)
}

fn first_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Array(items) => items.iter().find_map(first_text),
        // Spring-style `{ "authority": "ROLE_X" }` entries.
        Value::Object(map) => map.get("authority").and_then(first_text),
        _ => None,
    }
}

/// Swaps the backend's "invalid email or password" for the fixed message.
fn friendly_login_error(error: ApiError) -> ApiError {
    let raw = error.user_message();
    if raw.to_lowercase().contains("invalid email or password") {
        return ApiError::Validation(INVALID_CREDENTIALS_MESSAGE.to_string());
    }
    error
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_checked_and_lowercased() {
        assert_eq!(validate_email("  Ivan@Mospolytech.RU ").unwrap(), "ivan@mospolytech.ru");
        assert!(validate_email("").is_err());
        assert!(validate_email("ivan@localhost").is_err());
        assert!(validate_email("iv an@mail.ru").is_err());
        assert!(validate_email("@mail.ru").is_err());
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("   ").is_err());
        assert_eq!(validate_password(" 123456 ").unwrap(), "123456");
    }

    #[test]
    fn invalid_credentials_get_fixed_wording() {
        let err = ApiError::from_status(401, json!({ "message": "Invalid email or password" }));
        assert_eq!(
            friendly_login_error(err),
            ApiError::Validation(INVALID_CREDENTIALS_MESSAGE.to_string())
        );

        let other = ApiError::from_status(500, json!({ "message": "db down" }));
        assert_eq!(friendly_login_error(other.clone()), other);
    }

    #[test]
    fn garbage_token_has_no_role() {
        assert_eq!(role_from_token("not-a-jwt"), None);
        assert_eq!(role_from_token(""), None);
    }

    #[test]
    fn role_claim_shapes() {
        assert_eq!(first_text(&json!(" ROLE_HR ")), Some("ROLE_HR".to_string()));
        assert_eq!(first_text(&json!(["", "ROLE_STUDENT"])), Some("ROLE_STUDENT".to_string()));
        assert_eq!(
            first_text(&json!([{ "authority": "ROLE_EMPLOYER" }])),
            Some("ROLE_EMPLOYER".to_string())
        );
        assert_eq!(first_text(&json!(3)), None);
    }
}
