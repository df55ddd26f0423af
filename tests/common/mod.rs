//! Mock CometBFT RPC node for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use lbc_client::prelude::*;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// What the mock does with one incoming request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Respond with a status and body
    Respond(u16, String),
    /// Accept the request and never answer
    Silent,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Reply::Respond(200, body.into())
    }
}

/// A request as seen by the mock.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    /// The envelope carried in `params.tx`.
    pub fn envelope_bytes(&self) -> Vec<u8> {
        let json = self.json();
        STANDARD.decode(json["params"]["tx"].as_str().unwrap()).unwrap()
    }

    pub fn envelope(&self) -> SignedTx {
        SignedTx::from_slice(&self.envelope_bytes()).unwrap()
    }

    /// The envelope body as a JSON value.
    pub fn body_json(&self) -> Value {
        let envelope: Value = serde_json::from_slice(&self.envelope_bytes()).unwrap();
        envelope["body"].clone()
    }
}

/// Running mock node.
pub struct MockRpc {
    pub url: String,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockRpc {
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> CapturedRequest {
        self.requests().pop().expect("no request received")
    }
}

/// Start a mock that answers the n-th request with `replies[n]`, repeating
/// the last reply once the list is exhausted.
pub async fn start_mock_rpc(replies: Vec<Reply>) -> MockRpc {
    assert!(!replies.is_empty());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let captured = requests.clone();

    tokio::spawn(async move {
        let mut served = 0usize;
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            let reply = replies[served.min(replies.len() - 1)].clone();
            served += 1;
            let captured = captured.clone();
            tokio::spawn(async move {
                handle(socket, reply, captured).await;
            });
        }
    });

    MockRpc {
        url: format!("http://{addr}"),
        requests,
    }
}

/// Start a mock that always answers 200 with `body`.
pub async fn start_fixed_rpc(body: impl Into<String>) -> MockRpc {
    start_mock_rpc(vec![Reply::ok(body)]).await
}

/// An address nothing listens on.
pub async fn unused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

async fn handle(mut socket: TcpStream, reply: Reply, captured: Arc<Mutex<Vec<CapturedRequest>>>) {
    let Some(request) = read_request(&mut socket).await else {
        return;
    };
    captured.lock().unwrap().push(request);

    match reply {
        Reply::Respond(status, body) => {
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                if status < 400 { "OK" } else { "Error" },
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
        Reply::Silent => {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
    }
}

async fn read_request(socket: &mut TcpStream) -> Option<CapturedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split(' ');
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(CapturedRequest {
        method,
        target,
        headers,
        body,
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

// ============================================================================
// Canned responses
// ============================================================================

pub fn commit_ok() -> String {
    r#"{"jsonrpc":"2.0","id":"x","result":{"check_tx":{"code":0,"log":""},"deliver_tx":{"code":0,"log":""},"hash":"A1B2C3","height":"17"}}"#.to_string()
}

pub fn commit_with_codes(check: u32, deliver: u32) -> String {
    format!(
        r#"{{"jsonrpc":"2.0","id":"x","result":{{"check_tx":{{"code":{check},"log":"check log"}},"deliver_tx":{{"code":{deliver},"log":"deliver log"}},"hash":"","height":"0"}}}}"#
    )
}

pub fn rpc_error(code: i64, message: &str, data: &str) -> String {
    format!(
        r#"{{"jsonrpc":"2.0","id":"x","error":{{"code":{code},"message":"{message}","data":"{data}"}}}}"#
    )
}

pub fn query_value(value: &[u8], code: u32) -> String {
    query_response(&format!("\"{}\"", STANDARD.encode(value)), code)
}

pub fn query_empty(code: u32) -> String {
    query_response("null", code)
}

fn query_response(value: &str, code: u32) -> String {
    format!(
        r#"{{"jsonrpc":"2.0","id":-1,"result":{{"response":{{"code":{code},"log":"","info":"","index":"0","key":null,"value":{value},"proofOps":null,"height":"5","codespace":""}}}}}}"#
    )
}

/// Client against `url` with keys in `key_dir`.
pub fn client_for(url: &str, key_dir: &std::path::Path) -> LbcClient {
    let rpc = LbcRpcClient::builder(url)
        .timeout(Duration::from_secs(5))
        .with_retry(RetryConfig::disabled())
        .build()
        .unwrap();
    LbcClient::new(rpc, KeyStore::new(key_dir))
}
