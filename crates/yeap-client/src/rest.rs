// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the admin REST API.
//!
//! Implements [`OrdersApi`] and [`ChatApi`] on top of one pooled
//! [`reqwest::Client`] with bearer authentication.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;
use tracing::debug;

use yeap_config::model::ServerConfig;
use yeap_core::{ChatApi, OrderId, OrderPage, OrderStatus, OrdersApi, StoreId, ThreadId, YeapError};

#[derive(Serialize)]
struct StatusBody {
    status: OrderStatus,
}

/// REST client for orders and chats.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
}

impl RestClient {
    /// Creates a client for `base_url`, sending `token` as a bearer token when set.
    pub fn new(
        base_url: impl Into<String>,
        token: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, YeapError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| YeapError::Config(format!("invalid API token header value: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| YeapError::Api {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, YeapError> {
        Self::new(
            config.api_base_url.clone(),
            config.api_token.as_deref(),
            config.request_timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, YeapError> {
        let response = request.send().await.map_err(|e| YeapError::Api {
            message: format!("HTTP request failed: {e}"),
            source: Some(Box::new(e)),
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(YeapError::api(format!("API returned {status}: {body}")))
    }

    async fn json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, YeapError> {
        response.json::<T>().await.map_err(|e| YeapError::Api {
            message: format!("failed to parse response body: {e}"),
            source: Some(Box::new(e)),
        })
    }
}

#[async_trait]
impl OrdersApi for RestClient {
    async fn list_by_status(
        &self,
        store: &StoreId,
        status: OrderStatus,
        page: u32,
        page_size: u32,
    ) -> Result<OrderPage, YeapError> {
        let url = format!(
            "{}/admin/stores/{store}/orders?status={status}&page={page}&pageSize={page_size}",
            self.base_url
        );
        debug!(store_id = %store, %status, page, page_size, "listing orders");
        let response = self.send(self.client.get(&url)).await?;
        Self::json(response).await
    }

    async fn update_status(&self, order: &OrderId, status: OrderStatus) -> Result<(), YeapError> {
        let url = format!("{}/admin/orders/{order}/status", self.base_url);
        debug!(order_id = %order, %status, "updating order status");
        self.send(self.client.patch(&url).json(&StatusBody { status }))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ChatApi for RestClient {
    async fn unread_threads(&self, store: &StoreId) -> Result<Vec<ThreadId>, YeapError> {
        let url = format!("{}/admin/stores/{store}/chats/unread", self.base_url);
        debug!(store_id = %store, "listing unread chats");
        let response = self.send(self.client.get(&url)).await?;
        Self::json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> RestClient {
        RestClient::new(server.uri(), Some("tok"), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn lists_pending_orders_with_paging() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/stores/S1/orders"))
            .and(query_param("status", "PENDING"))
            .and(query_param("page", "1"))
            .and(query_param("pageSize", "100"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "orders": [{
                    "id": "O1",
                    "orderNumber": 12,
                    "userName": "Ana",
                    "totalPrice": 30.5,
                    "status": "PENDING",
                    "createdAt": "2026-03-01T12:00:00Z"
                }],
                "total": 1
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = client(&server)
            .list_by_status(&StoreId::from("S1"), OrderStatus::Pending, 1, 100)
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.orders[0].id.as_str(), "O1");
    }

    #[tokio::test]
    async fn updates_status_with_patch() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/admin/orders/O7/status"))
            .and(body_json(json!({"status": "IN_PROGRESS"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .update_status(&OrderId::from("O7"), OrderStatus::InProgress)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn non_success_status_is_api_error_with_body() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(409).set_body_string("order already delivered"))
            .mount(&server)
            .await;

        let err = client(&server)
            .update_status(&OrderId::from("O7"), OrderStatus::Delivering)
            .await
            .unwrap_err();
        match err {
            YeapError::Api { message, .. } => {
                assert!(message.contains("409"));
                assert!(message.contains("order already delivered"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn unread_threads_are_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/stores/S1/chats/unread"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["T1", "T2"])))
            .mount(&server)
            .await;

        let threads = client(&server)
            .unread_threads(&StoreId::from("S1"))
            .await
            .unwrap();
        assert_eq!(threads, vec![ThreadId::from("T1"), ThreadId::from("T2")]);
    }

    #[tokio::test]
    async fn malformed_body_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client(&server)
            .unread_threads(&StoreId::from("S1"))
            .await
            .unwrap_err();
        assert!(matches!(err, YeapError::Api { .. }));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = RestClient::new("http://api.local/", None, Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://api.local");
    }
}
