//! REST client for the orders and products tables.
//!
//! Talks to a PostgREST-style API: rows are addressed with `column=eq.value`
//! filters and mutations ask for the stored row back with
//! `Prefer: return=representation`.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client as HttpClient, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use super::dto::{ApiErrorBody, NewOrderRow, ProductImageRow, StatusPatch};
use crate::domain::{NewOrder, Order, OrderId, OrderStatus, ProductId};
use crate::error::{Error, Result};
use crate::infrastructure::config::backend::BackendConfig;
use crate::port::{OrderRepository, ProductCatalog};

const PREFER_REPRESENTATION: &str = "return=representation";
const DEFAULT_SCHEMA: &str = "public";

/// HTTP client for the backend REST API.
pub struct RestClient {
    http: HttpClient,
    base_url: Url,
    orders_table: String,
    products_table: String,
}

impl RestClient {
    /// Build a client from the backend configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend URL is invalid.
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        let base_url = config.rest_url()?;
        let headers = default_headers(config);

        let http = HttpClient::builder()
            .timeout(config.http.timeout())
            .connect_timeout(config.http.connect_timeout())
            .default_headers(headers)
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });

        Ok(Self {
            http,
            base_url,
            orders_table: config.table.clone(),
            products_table: config.products_table.clone(),
        })
    }

    fn table_url(&self, table: &str) -> Result<Url> {
        Ok(self.base_url.join(table)?)
    }

    fn orders_url(&self, filters: &[(&str, String)]) -> Result<Url> {
        let mut url = self.table_url(&self.orders_table)?;
        if !filters.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in filters {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn send(request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let raw = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&raw)
            .map(|body| body.describe(&raw))
            .unwrap_or_else(|_| {
                if raw.is_empty() {
                    status.canonical_reason().unwrap_or_default().to_string()
                } else {
                    raw
                }
            });
        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn rows<T: DeserializeOwned>(request: RequestBuilder) -> Result<Vec<T>> {
        Ok(Self::send(request).await?.json::<Vec<T>>().await?)
    }

    /// First row of a representation response, or `NotFound`.
    async fn single(request: RequestBuilder, id: &OrderId) -> Result<Order> {
        Self::rows::<Order>(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }
}

fn default_headers(config: &BackendConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(key) = &config.api_key {
        match (
            HeaderValue::from_str(key),
            HeaderValue::from_str(&format!("Bearer {key}")),
        ) {
            (Ok(apikey), Ok(bearer)) => {
                headers.insert("apikey", apikey);
                headers.insert(AUTHORIZATION, bearer);
            }
            _ => warn!("API key contains invalid header characters; sending unauthenticated"),
        }
    }
    if config.schema != DEFAULT_SCHEMA {
        if let Ok(schema) = HeaderValue::from_str(&config.schema) {
            headers.insert("Accept-Profile", schema.clone());
            headers.insert("Content-Profile", schema);
        }
    }
    headers
}

fn eq(value: &str) -> String {
    format!("eq.{value}")
}

#[async_trait]
impl OrderRepository for RestClient {
    async fn fetch_all(&self) -> Result<Vec<Order>> {
        let url = self.orders_url(&[
            ("select", "*".into()),
            ("order", "created_at.desc".into()),
        ])?;
        debug!(table = %self.orders_table, "Fetching all orders");

        let orders: Vec<Order> = Self::rows(self.http.get(url)).await?;
        info!(count = orders.len(), "Fetched orders");
        Ok(orders)
    }

    async fn fetch(&self, id: &OrderId) -> Result<Option<Order>> {
        let url = self.orders_url(&[("select", "*".into()), ("id", eq(id.as_str()))])?;
        let orders: Vec<Order> = Self::rows(self.http.get(url)).await?;
        Ok(orders.into_iter().next())
    }

    async fn update_status(&self, id: &OrderId, status: OrderStatus) -> Result<Order> {
        let url = self.orders_url(&[("id", eq(id.as_str()))])?;
        let patch = StatusPatch {
            status,
            updated_at: Utc::now(),
        };
        debug!(order_id = id.short(), %status, "Updating order status");

        let request = self
            .http
            .patch(url)
            .header("Prefer", PREFER_REPRESENTATION)
            .json(&patch);
        Self::single(request, id).await
    }

    async fn delete(&self, id: &OrderId) -> Result<()> {
        let url = self.orders_url(&[("id", eq(id.as_str()))])?;
        debug!(order_id = id.short(), "Deleting order");

        Self::send(self.http.delete(url)).await?;
        Ok(())
    }

    async fn create(&self, order: &NewOrder) -> Result<Order> {
        order.validate()?;
        let url = self.orders_url(&[])?;

        let request = self
            .http
            .post(url)
            .header("Prefer", PREFER_REPRESENTATION)
            .json(&NewOrderRow::pending(order));
        let created: Vec<Order> = Self::rows(request).await?;
        let created = created
            .into_iter()
            .next()
            .ok_or_else(|| Error::Connection("insert returned no row".into()))?;
        info!(order_id = created.id.short(), "Order created");
        Ok(created)
    }
}

#[async_trait]
impl ProductCatalog for RestClient {
    async fn product_image(&self, id: &ProductId) -> Result<Option<String>> {
        let mut url = self.table_url(&self.products_table)?;
        url.query_pairs_mut()
            .append_pair("select", "image")
            .append_pair("id", &eq(id.as_str()));

        let rows: Vec<ProductImageRow> = Self::rows(self.http.get(url)).await?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.image)
            .filter(|image| !image.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;
    use crate::testkit::domain::item;

    const ORDER_ROW: &str = r#"[{"id":"A","customer_phone":"+36 30 123 4567","customer_residence":"Block A",
        "customer_apartment":"12","items":[{"id":"p-1","name":"Bread","quantity":2,"price":2.5}],
        "total":5.0,"delivery_method":"delivery","status":"in-progress",
        "created_at":"2024-05-01T10:00:00+00:00","updated_at":"2024-05-01T10:05:00+00:00"}]"#;

    /// Serve one canned response and return the raw request text.
    async fn serve(status: u16, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            while !complete(&request) {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status} Status\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{addr}"), task)
    }

    fn complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(end) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..end]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        request.len() >= end + 4 + length
    }

    fn client(url: &str) -> RestClient {
        let config = BackendConfig {
            url: url.to_string(),
            api_key: Some("secret".into()),
            ..BackendConfig::default()
        };
        RestClient::from_config(&config).unwrap()
    }

    #[test]
    fn headers_carry_key_and_schema() {
        let config = BackendConfig {
            url: "http://localhost".into(),
            schema: "shop".into(),
            api_key: Some("secret".into()),
            ..BackendConfig::default()
        };
        let headers = default_headers(&config);

        assert_eq!(headers["apikey"], "secret");
        assert_eq!(headers[AUTHORIZATION], "Bearer secret");
        assert_eq!(headers["Accept-Profile"], "shop");
    }

    #[test]
    fn public_schema_sends_no_profile() {
        let config = BackendConfig {
            url: "http://localhost".into(),
            ..BackendConfig::default()
        };
        let headers = default_headers(&config);
        assert!(headers.get("Accept-Profile").is_none());
        assert!(headers.get("apikey").is_none());
    }

    #[test]
    fn orders_url_encodes_filters() {
        let client = client("http://localhost:54321");
        let url = client.orders_url(&[("id", eq("a b"))]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:54321/rest/v1/orders?id=eq.a+b");
    }

    #[tokio::test]
    async fn fetch_all_requests_newest_first() {
        let (url, server) = serve(200, ORDER_ROW).await;
        let orders = client(&url).fetch_all().await.unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("GET /rest/v1/orders?select=*&order=created_at.desc "));
        assert!(request.to_lowercase().contains("apikey: secret"));
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].status, OrderStatus::InProgress);
    }

    #[tokio::test]
    async fn update_status_patches_with_representation() {
        let (url, server) = serve(200, ORDER_ROW).await;
        let order = client(&url)
            .update_status(&OrderId::new("A"), OrderStatus::InProgress)
            .await
            .unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("PATCH /rest/v1/orders?id=eq.A "));
        assert!(request.to_lowercase().contains("prefer: return=representation"));
        assert!(request.contains(r#""status":"in-progress""#));
        assert_eq!(order.id, OrderId::new("A"));
    }

    #[tokio::test]
    async fn update_status_of_missing_order_is_not_found() {
        let (url, _server) = serve(200, "[]").await;
        let err = client(&url)
            .update_status(&OrderId::new("ghost"), OrderStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn api_errors_carry_status_and_message() {
        let (url, _server) = serve(401, r#"{"message":"JWT expired","code":"PGRST301"}"#).await;
        let err = client(&url).delete(&OrderId::new("A")).await.unwrap_err();

        match err {
            Error::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "JWT expired [PGRST301]");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn create_validates_before_sending() {
        let order = NewOrder::pickup("", vec![item("p-1", "Milk", 1)], rust_decimal_macros::dec!(1));
        let err = client("http://127.0.0.1:9").create(&order).await.unwrap_err();
        assert!(matches!(err, Error::Domain(_)));
    }

    #[tokio::test]
    async fn create_posts_pending_row() {
        let (url, server) = serve(201, ORDER_ROW).await;
        let order = NewOrder::pickup("+36 1 234", vec![item("p-1", "Milk", 1)], rust_decimal_macros::dec!(2.5));
        client(&url).create(&order).await.unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("POST /rest/v1/orders "));
        assert!(request.contains(r#""status":"pending""#));
    }

    #[tokio::test]
    async fn product_image_reads_image_column() {
        let (url, server) = serve(200, r#"[{"image":"/img/bread.png"}]"#).await;
        let image = client(&url).product_image(&ProductId::new("p-1")).await.unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("GET /rest/v1/products?select=image&id=eq.p-1 "));
        assert_eq!(image.as_deref(), Some("/img/bread.png"));
    }

    #[tokio::test]
    async fn blank_product_image_is_none() {
        let (url, _server) = serve(200, r#"[{"image":""}]"#).await;
        let image = client(&url).product_image(&ProductId::new("p-1")).await.unwrap();
        assert!(image.is_none());
    }
}
