//! Thin REST client over the SafeAid API.

use reqwest::{Method, RequestBuilder, Response};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use safeaid_auth::{RegisterUser, UserView};
use safeaid_beneficiaries::{Beneficiary, BeneficiaryInput};
use safeaid_core::{BeneficiaryId, TrainingModuleId, UserId};
use safeaid_training::{TrainingInput, TrainingModule};

use crate::error::{ClientError, ClientResult};

/// Body of a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserView,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    user: UserView,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<FieldErrorBody>,
}

#[derive(Debug, Deserialize)]
struct FieldErrorBody {
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TrainingQuery<'a> {
    include_inactive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            token: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> ClientResult<T> {
        let res = req.send().await?;
        let res = check(res).await?;
        Ok(res.json().await?)
    }

    pub async fn health(&self) -> bool {
        self.http
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .is_ok_and(|r| r.status().is_success())
    }

    // -------------------------
    // Auth
    // -------------------------

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<LoginResponse> {
        let req = self
            .http
            .post(format!("{}/api/auth/login", self.base_url))
            .json(&json!({ "email": email, "password": password }));
        self.send(req).await
    }

    pub async fn me(&self) -> ClientResult<UserView> {
        self.send(self.request(Method::GET, "/api/auth/me")).await
    }

    pub async fn register(&self, user: &RegisterUser) -> ClientResult<UserView> {
        self.send(self.request(Method::POST, "/api/auth/register").json(user)).await
    }

    // -------------------------
    // Beneficiaries
    // -------------------------

    pub async fn list_beneficiaries(&self) -> ClientResult<Vec<Beneficiary>> {
        self.send(self.request(Method::GET, "/api/beneficiaries")).await
    }

    pub async fn get_beneficiary(&self, id: BeneficiaryId) -> ClientResult<Beneficiary> {
        self.send(self.request(Method::GET, &format!("/api/beneficiaries/{id}")))
            .await
    }

    pub async fn create_beneficiary(&self, input: &BeneficiaryInput) -> ClientResult<Beneficiary> {
        self.send(self.request(Method::POST, "/api/beneficiaries").json(input))
            .await
    }

    pub async fn update_beneficiary(&self, id: BeneficiaryId, input: &BeneficiaryInput) -> ClientResult<Beneficiary> {
        self.send(self.request(Method::PUT, &format!("/api/beneficiaries/{id}")).json(input))
            .await
    }

    pub async fn delete_beneficiary(&self, id: BeneficiaryId) -> ClientResult<()> {
        let _: IgnoredAny = self
            .send(self.request(Method::DELETE, &format!("/api/beneficiaries/{id}")))
            .await?;
        Ok(())
    }

    // -------------------------
    // Training
    // -------------------------

    pub async fn list_training(&self, include_inactive: bool, category: Option<&str>) -> ClientResult<Vec<TrainingModule>> {
        let query = TrainingQuery {
            include_inactive,
            category,
        };
        self.send(self.request(Method::GET, "/api/training").query(&query))
            .await
    }

    pub async fn get_training(&self, id: TrainingModuleId) -> ClientResult<TrainingModule> {
        self.send(self.request(Method::GET, &format!("/api/training/{id}")))
            .await
    }

    pub async fn create_training(&self, input: &TrainingInput) -> ClientResult<TrainingModule> {
        self.send(self.request(Method::POST, "/api/training").json(input))
            .await
    }

    pub async fn update_training(&self, id: TrainingModuleId, input: &TrainingInput) -> ClientResult<TrainingModule> {
        self.send(self.request(Method::PUT, &format!("/api/training/{id}")).json(input))
            .await
    }

    pub async fn delete_training(&self, id: TrainingModuleId) -> ClientResult<()> {
        let _: IgnoredAny = self
            .send(self.request(Method::DELETE, &format!("/api/training/{id}")))
            .await?;
        Ok(())
    }

    // -------------------------
    // Users
    // -------------------------

    pub async fn list_users(&self) -> ClientResult<Vec<UserView>> {
        self.send(self.request(Method::GET, "/api/users")).await
    }

    pub async fn set_user_status(&self, id: UserId, is_active: bool) -> ClientResult<UserView> {
        let res: StatusResponse = self
            .send(
                self.request(Method::PATCH, &format!("/api/users/status/{id}"))
                    .json(&json!({ "isActive": is_active })),
            )
            .await?;
        Ok(res.user)
    }

    pub async fn delete_user(&self, id: UserId) -> ClientResult<()> {
        let _: IgnoredAny = self
            .send(self.request(Method::DELETE, &format!("/api/users/{id}")))
            .await?;
        Ok(())
    }
}

/// Turn a non-success response into [`ClientError::Api`], keeping the
/// server's own wording.
async fn check(res: Response) -> ClientResult<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let text = res.text().await.unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
    let message = if body.errors.is_empty() {
        body.message.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        })
    } else {
        body.errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join(", ")
    };

    debug!(status = status.as_u16(), %message, "api request failed");
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}
