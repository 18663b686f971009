use std::future::Future;

use api_types::{
    envelope::ApiResponse,
    stats::TransactionStatistics,
    transaction::{
        Transaction, TransactionCreate, TransactionListResponse, TransactionPatch,
        TransactionQuery,
    },
};
use reqwest::{Response, StatusCode, Url};
use serde::de::{DeserializeOwned, IgnoredAny};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation error: {0}")]
    Validation(String),
    /// `message` is the server's own text, or `HTTP error! status: <code>`.
    #[error("{message}")]
    Server { status: StatusCode, message: String },
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The body did not carry the `{ success, data }` envelope.
    #[error("unexpected response: {0}")]
    Shape(String),
    #[error("invalid base_url: {0}")]
    Url(String),
}

/// Operations of the remote transaction API.
pub trait Remote: Send + Sync + 'static {
    fn list(
        &self,
        token: &str,
        query: &TransactionQuery,
    ) -> impl Future<Output = Result<TransactionListResponse, ClientError>> + Send;

    fn statistics(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<TransactionStatistics, ClientError>> + Send;

    fn create(
        &self,
        token: &str,
        body: &TransactionCreate,
    ) -> impl Future<Output = Result<Transaction, ClientError>> + Send;

    fn update(
        &self,
        token: &str,
        id: &str,
        patch: &TransactionPatch,
    ) -> impl Future<Output = Result<Transaction, ClientError>> + Send;

    fn delete(&self, token: &str, id: &str)
    -> impl Future<Output = Result<(), ClientError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpRemote {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpRemote {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: &str, http: reqwest::Client) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url).map_err(|err| ClientError::Url(err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Url(format!("{base_url} cannot be a base")));
        }
        Ok(Self { base_url, http })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Url(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl Remote for HttpRemote {
    async fn list(
        &self,
        token: &str,
        query: &TransactionQuery,
    ) -> Result<TransactionListResponse, ClientError> {
        let endpoint = self.endpoint(&["transactions"])?;
        let res = self
            .http
            .get(endpoint)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;
        read_envelope(res).await
    }

    async fn statistics(&self, token: &str) -> Result<TransactionStatistics, ClientError> {
        let endpoint = self.endpoint(&["transactions", "statistics"])?;
        let res = self.http.get(endpoint).bearer_auth(token).send().await?;
        read_envelope(res).await
    }

    async fn create(
        &self,
        token: &str,
        body: &TransactionCreate,
    ) -> Result<Transaction, ClientError> {
        let endpoint = self.endpoint(&["transactions"])?;
        let res = self
            .http
            .post(endpoint)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        read_envelope(res).await
    }

    async fn update(
        &self,
        token: &str,
        id: &str,
        patch: &TransactionPatch,
    ) -> Result<Transaction, ClientError> {
        let endpoint = self.endpoint(&["transactions", id])?;
        let res = self
            .http
            .patch(endpoint)
            .bearer_auth(token)
            .json(patch)
            .send()
            .await?;
        read_envelope(res).await
    }

    async fn delete(&self, token: &str, id: &str) -> Result<(), ClientError> {
        let endpoint = self.endpoint(&["transactions", id])?;
        let res = self.http.delete(endpoint).bearer_auth(token).send().await?;
        if res.status().is_success() {
            return Ok(());
        }
        Err(error_for_status(res).await)
    }
}

async fn read_envelope<T: DeserializeOwned>(res: Response) -> Result<T, ClientError> {
    if !res.status().is_success() {
        return Err(error_for_status(res).await);
    }

    let body = res.json::<ApiResponse<T>>().await.map_err(|err| {
        if err.is_decode() {
            ClientError::Shape(err.to_string())
        } else {
            ClientError::Transport(err)
        }
    })?;

    body.into_data()
        .ok_or_else(|| ClientError::Shape("missing success/data envelope".to_string()))
}

async fn error_for_status(res: Response) -> ClientError {
    let status = res.status();
    let message = res
        .json::<ApiResponse<IgnoredAny>>()
        .await
        .ok()
        .and_then(|body| body.message);
    classify(status, message)
}

fn classify(status: StatusCode, message: Option<String>) -> ClientError {
    let message = message.unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
    match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
        StatusCode::FORBIDDEN => ClientError::Forbidden,
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ClientError::Validation(message)
        }
        _ => ClientError::Server { status, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_keeps_base_path_and_escapes_ids() {
        let remote = HttpRemote::new("http://127.0.0.1:3000/api").unwrap();
        let url = remote.endpoint(&["transactions", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:3000/api/transactions/a%20b%2Fc");

        let remote = HttpRemote::new("http://127.0.0.1:3000/api/").unwrap();
        let url = remote.endpoint(&["transactions", "statistics"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:3000/api/transactions/statistics");
    }

    #[test]
    fn server_error_message_is_not_repeated() {
        let err = classify(StatusCode::INTERNAL_SERVER_ERROR, None);
        assert!(matches!(
            err,
            ClientError::Server {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                ..
            }
        ));
        assert_eq!(err.to_string(), "HTTP error! status: 500");

        let err = classify(StatusCode::BAD_GATEWAY, Some("upstream down".to_string()));
        assert_eq!(err.to_string(), "upstream down");

        let err = classify(StatusCode::NOT_FOUND, Some("Transaction not found".to_string()));
        assert_eq!(err.to_string(), "not found: Transaction not found");
    }

    #[test]
    fn rejects_unusable_base_url() {
        assert!(matches!(
            HttpRemote::new("not a url"),
            Err(ClientError::Url(_))
        ));
        assert!(matches!(
            HttpRemote::new("mailto:someone@example.com"),
            Err(ClientError::Url(_))
        ));
    }
}
