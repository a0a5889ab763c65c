// Login, sign-up and login-id availability.

use crate::api_client::{ApiClient, ApiError, Method, RequestOptions};
use crate::models::{IdCheck, LoginRequest, LoginResponse, Role, SignUpRequest};
use crate::session_store::{Session, ROLE_KEY, USER_ID_KEY};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Logs in and stores the returned identity with the configured TTL.
pub async fn login(
    api: &ApiClient,
    login_id: &str,
    password: &str,
) -> Result<Session, AccountError> {
    let login_id = required("login_id", login_id)?;
    let password = required("password", password)?;

    let body = LoginRequest {
        login_id: login_id.to_string(),
        password: password.to_string(),
    };
    let response: LoginResponse = api
        .call(
            Method::POST,
            "/user/login",
            RequestOptions::default().with_body(&body)?,
        )
        .await?;

    api.session().set(
        &[
            (USER_ID_KEY, response.user_id.to_string()),
            (ROLE_KEY, response.role.as_str().to_string()),
        ],
        api.config().session_ttl_days,
    );
    info!(user_id = response.user_id, role = %response.role, "Logged in");

    Ok(Session {
        user_id: Some(response.user_id),
        role: Some(response.role),
    })
}

// Registration form as the user filled it in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpForm {
    pub username: String,
    pub login_id: String,
    pub password: String,
    pub phone_number: String,
    pub role: Role,
}

impl Default for SignUpForm {
    fn default() -> Self {
        Self {
            username: String::new(),
            login_id: String::new(),
            password: String::new(),
            phone_number: String::new(),
            role: Role::Host,
        }
    }
}

impl SignUpForm {
    // Every field is required; text is trimmed except the password
    pub fn validate(&self) -> Result<SignUpRequest, AccountError> {
        Ok(SignUpRequest {
            username: required("username", &self.username)?.to_string(),
            login_id: required("login_id", &self.login_id)?.to_string(),
            password: required("password", &self.password).map(|_| self.password.clone())?,
            role: self.role,
            phone_number: required("phone_number", &self.phone_number)?.to_string(),
        })
    }
}

pub async fn sign_up(api: &ApiClient, form: &SignUpForm) -> Result<(), AccountError> {
    let request = form.validate()?;
    api.request(
        Method::POST,
        "/user/sign-up",
        RequestOptions::default().with_body(&request)?,
    )
    .await?;
    info!(login_id = %request.login_id, role = %request.role, "Signed up");
    Ok(())
}

/// Asks the server whether `login_id` is still free. A blank id is refused
/// without a request.
pub async fn check_login_id(api: &ApiClient, login_id: &str) -> Result<bool, AccountError> {
    let login_id = required("login_id", login_id)?;
    let check: IdCheck = api
        .call(
            Method::GET,
            "/user/check-id",
            RequestOptions::default().with_query("login_id", login_id),
        )
        .await?;
    Ok(check.available)
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, AccountError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AccountError::MissingField(field));
    }
    Ok(trimmed)
}
