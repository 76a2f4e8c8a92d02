#![allow(dead_code)]

use async_trait::async_trait;
use eth_balance_scanner::config::Config;
use eth_balance_scanner::error::ScanError;
use eth_balance_scanner::hex::parse_block_number;
use eth_balance_scanner::rpc::{RpcTransport, TransportResponse};
use eth_balance_scanner::SelectionStrategy;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::{Instant, sleep};

#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl Reply {
    pub fn result(result: Value) -> Self {
        Reply {
            status: 200,
            body: json!({ "id": "test", "jsonrpc": "2.0", "result": result }).to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16) -> Self {
        Reply {
            status,
            body: "Too Many Requests".to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn raw(body: &str) -> Self {
        Reply {
            status: 200,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// In-memory node answering `eth_blockNumber` and `eth_getBlockByNumber`.
pub struct MockNode {
    latest: Reply,
    blocks: HashMap<u64, Reply>,
    requests: Mutex<Vec<(Instant, Value)>>,
}

impl MockNode {
    pub fn new(latest: u64) -> Self {
        MockNode {
            latest: Reply::result(json!(format!("{latest:#x}"))),
            blocks: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_latest_reply(mut self, reply: Reply) -> Self {
        self.latest = reply;
        self
    }

    /// Register a block whose transactions are `(from, to, value)` triples.
    pub fn with_block(self, number: u64, transfers: &[(&str, &str, &str)]) -> Self {
        let transactions: Vec<Value> = transfers
            .iter()
            .map(|(from, to, value)| json!({ "from": from, "to": to, "value": value }))
            .collect();
        self.with_block_json(number, json!(transactions))
    }

    pub fn with_block_json(self, number: u64, transactions: Value) -> Self {
        let reply = Reply::result(json!({
            "hash": format!("0xhash{number}"),
            "number": format!("{number:#x}"),
            "transactions": transactions,
        }));
        self.with_block_reply(number, reply)
    }

    pub fn with_block_reply(mut self, number: u64, reply: Reply) -> Self {
        self.blocks.insert(number, reply);
        self
    }

    pub fn requested_blocks(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, body)| body["method"] == "eth_getBlockByNumber")
            .map(|(_, body)| body["params"][0].as_str().unwrap_or_default().to_string())
            .collect()
    }

    /// When each `eth_getBlockByNumber` request reached the node, in arrival order.
    pub fn block_request_times(&self) -> Vec<Instant> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, body)| body["method"] == "eth_getBlockByNumber")
            .map(|(at, _)| *at)
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl RpcTransport for MockNode {
    async fn post(&self, body: &Value) -> Result<TransportResponse, ScanError> {
        self.requests
            .lock()
            .unwrap()
            .push((Instant::now(), body.clone()));

        let reply = match body["method"].as_str() {
            Some("eth_blockNumber") => self.latest.clone(),
            Some("eth_getBlockByNumber") => {
                let number = body["params"][0]
                    .as_str()
                    .and_then(|hex| parse_block_number(hex).ok());
                number
                    .and_then(|n| self.blocks.get(&n).cloned())
                    .unwrap_or_else(|| Reply::result(Value::Null))
            }
            _ => Reply::status(404),
        };

        if !reply.delay.is_zero() {
            sleep(reply.delay).await;
        }

        Ok(TransportResponse {
            status: reply.status,
            body: reply.body.into_bytes(),
        })
    }
}

pub fn test_config(window_size: u64, interval: Duration) -> Config {
    Config {
        json_rpc_url: "http://mock".to_string(),
        api_key: "test".to_string(),
        window_size,
        rate_limit_interval: interval,
        request_id: "test".to_string(),
        selection: SelectionStrategy::Permissive,
    }
}
