use crate::error::ScanError;
use crate::hex::{parse_block_number, to_hex};
use crate::models::{Block, RawBlock};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;

const JSONRPC_VERSION: &str = "2.0";
const METHOD_BLOCK_NUMBER: &str = "eth_blockNumber";
const METHOD_GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";
const API_KEY_HEADER: &str = "x-api-key";
const HTTP_OK: u16 = 200;

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Sends one JSON-RPC body to the node. Implementations own headers and the endpoint.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn post(&self, body: &Value) -> Result<TransportResponse, ScanError>;
}

#[async_trait]
impl<T: RpcTransport + ?Sized> RpcTransport for Arc<T> {
    async fn post(&self, body: &Value) -> Result<TransportResponse, ScanError> {
        (**self).post(body).await
    }
}

pub struct HttpTransport {
    client: reqwest::Client,
    url: reqwest::Url,
}

impl HttpTransport {
    pub fn new(rpc_url: &str, api_key: &str) -> Result<Self> {
        let url: reqwest::Url = rpc_url
            .parse()
            .with_context(|| format!("Invalid RPC URL: {rpc_url}"))?;

        let mut api_key =
            HeaderValue::from_str(api_key).context("API key is not a valid header value")?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, api_key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(HttpTransport { client, url })
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn post(&self, body: &Value) -> Result<TransportResponse, ScanError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(body)
            .send()
            .await
            .map_err(ScanError::transport)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(ScanError::transport)?;

        Ok(TransportResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse<R> {
    result: Option<R>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

pub struct LedgerClient<T> {
    transport: T,
    request_id: String,
}

impl<T: RpcTransport> LedgerClient<T> {
    pub fn new(transport: T, request_id: impl Into<String>) -> Self {
        LedgerClient {
            transport,
            request_id: request_id.into(),
        }
    }

    fn request_body(&self, method: &str, params: Value) -> Value {
        json!({
            "jsonrpc": JSONRPC_VERSION,
            "method": method,
            "params": params,
            "id": self.request_id,
        })
    }

    async fn call<R: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
    ) -> Result<R, ScanError> {
        let body = self.request_body(method, params);
        let response = self.transport.post(&body).await?;

        if response.status != HTTP_OK {
            return Err(ScanError::Protocol {
                method,
                status: response.status,
            });
        }

        let envelope: RpcResponse<R> =
            serde_json::from_slice(&response.body).map_err(|e| ScanError::decode(method, e))?;

        match envelope {
            RpcResponse {
                result: Some(result),
                ..
            } => Ok(result),
            RpcResponse {
                error: Some(error), ..
            } => Err(ScanError::decode(
                method,
                format!("node returned error {}: {}", error.code, error.message),
            )),
            _ => Err(ScanError::decode(method, "missing or null result field")),
        }
    }

    pub async fn get_latest_block_number(&self) -> Result<u64, ScanError> {
        let hex: String = self.call(METHOD_BLOCK_NUMBER, json!([])).await?;
        Ok(parse_block_number(&hex)?)
    }

    /// Fetch a block with full transaction objects.
    pub async fn get_block(&self, number: u64) -> Result<Block, ScanError> {
        let raw: RawBlock = self
            .call(METHOD_GET_BLOCK_BY_NUMBER, json!([to_hex(number), true]))
            .await?;
        let block = Block::try_from(raw)?;

        if block.number != number {
            return Err(ScanError::decode(
                METHOD_GET_BLOCK_BY_NUMBER,
                format!("requested block {number}, node returned {}", block.number),
            ));
        }

        debug!(
            "Fetched block {} ({}) with {} transactions",
            block.number,
            block.hash,
            block.transactions.len()
        );
        Ok(block)
    }
}
