//! Classification of node responses into outcomes and errors.
//!
//! Precedence for broadcasts: unparseable body, JSON-RPC error object,
//! missing result, CheckTx rejection, DeliverTx rejection, success. Queries
//! stop after the missing-result check.

use serde::Deserialize;
use serde_json::Value;

use super::types::{AbciQueryResponse, BroadcastOutcome, BroadcastResult, RpcErrorObject};
use crate::error::{LbcError, LbcResult};

const BODY_SNIPPET_LEN: usize = 256;

/// Classify a `broadcast_tx_commit` response.
pub fn classify_broadcast(status: u16, body: &[u8]) -> LbcResult<BroadcastOutcome> {
    let mut value = parse_body(status, body)?;
    check_error(&value)?;
    let result: BroadcastResult =
        serde_json::from_value(take_result(&mut value)?).map_err(malformed)?;

    if !result.check_tx.is_ok() {
        return Err(LbcError::ValidationRejected {
            code: result.check_tx.code,
            log: result.check_tx.log,
        });
    }
    if !result.deliver_tx.is_ok() {
        return Err(LbcError::ExecutionRejected {
            code: result.deliver_tx.code,
            log: result.deliver_tx.log,
        });
    }
    Ok(result.into())
}

/// Classify an `abci_query` response.
///
/// A non-zero ABCI code is returned to the caller, not treated as an error.
pub fn classify_query(status: u16, body: &[u8]) -> LbcResult<AbciQueryResponse> {
    let value = parse_body(status, body)?;
    check_error(&value)?;
    if matches!(value.get("result"), None | Some(Value::Null)) {
        return Err(LbcError::EmptyResult);
    }
    serde_json::from_value(value).map_err(malformed)
}

fn parse_body(status: u16, body: &[u8]) -> LbcResult<Value> {
    match serde_json::from_slice(body) {
        Ok(value) => Ok(value),
        Err(e) if (200..300).contains(&status) => Err(malformed(e)),
        Err(_) => Err(LbcError::UnexpectedStatus(status, snippet(body))),
    }
}

/// Fail with [`LbcError::Rpc`] if the body carries an error object,
/// whatever else it contains.
fn check_error(value: &Value) -> LbcResult<()> {
    match value.get("error") {
        None | Some(Value::Null) => Ok(()),
        Some(error) => Err(rpc_error(error)),
    }
}

fn take_result(value: &mut Value) -> LbcResult<Value> {
    match value.get_mut("result").map(Value::take) {
        None | Some(Value::Null) => Err(LbcError::EmptyResult),
        Some(result) => Ok(result),
    }
}

fn rpc_error(error: &Value) -> LbcError {
    let error = RpcErrorObject::deserialize(error).unwrap_or_else(|_| RpcErrorObject {
        message: match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
        ..Default::default()
    });
    LbcError::Rpc {
        code: error.code,
        message: error.message,
        data: error.data,
    }
}

fn malformed(e: serde_json::Error) -> LbcError {
    LbcError::MalformedResponse(format!("decode json: {e}"))
}

fn snippet(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim();
    match trimmed.char_indices().nth(BODY_SNIPPET_LEN) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const OK_RESULT: &str = r#"{"check_tx":{"code":0,"log":""},"deliver_tx":{"code":0,"log":""},"hash":"ABCD","height":"42"}"#;

    fn envelope(inner: &str) -> Vec<u8> {
        format!(r#"{{"jsonrpc":"2.0","id":"1",{inner}}}"#).into_bytes()
    }

    mod broadcast {
        use super::*;

        #[test]
        fn test_success() {
            let body = envelope(&format!(r#""result":{OK_RESULT}"#));
            let outcome = classify_broadcast(200, &body).unwrap();
            assert_eq!(outcome.hash, "ABCD");
            assert_eq!(outcome.height, "42");
            assert!(outcome.check_tx.is_ok());
        }

        #[test]
        fn test_error_object_wins_over_result() {
            let body = envelope(&format!(
                r#""error":{{"code":-32603,"message":"Internal error","data":"timed out waiting for tx"}},"result":{OK_RESULT}"#
            ));
            let err = classify_broadcast(200, &body).unwrap_err();
            assert_eq!(
                err.to_string(),
                "RPC error: -32603 Internal error (timed out waiting for tx)"
            );
            assert_eq!(err.kind(), ErrorKind::Transport);
        }

        #[test]
        fn test_missing_result() {
            let err = classify_broadcast(200, &envelope(r#""result":null"#)).unwrap_err();
            assert!(matches!(err, LbcError::EmptyResult));
            let err = classify_broadcast(200, br#"{"jsonrpc":"2.0","id":"1"}"#).unwrap_err();
            assert!(matches!(err, LbcError::EmptyResult));
        }

        #[test]
        fn test_check_tx_rejection_wins_over_deliver_tx() {
            let body = envelope(
                r#""result":{"check_tx":{"code":4,"log":"bad signature"},"deliver_tx":{"code":0},"hash":"","height":"0"}"#,
            );
            match classify_broadcast(200, &body).unwrap_err() {
                LbcError::ValidationRejected { code, log } => {
                    assert_eq!(code, 4);
                    assert_eq!(log, "bad signature");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[test]
        fn test_deliver_tx_rejection() {
            let body = envelope(
                r#""result":{"check_tx":{"code":0},"deliver_tx":{"code":9,"log":"unknown beneficiary"},"hash":"","height":"3"}"#,
            );
            let err = classify_broadcast(200, &body).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ExecutionRejected);
            assert_eq!(err.to_string(), "DeliverTx failed (code 9): unknown beneficiary");
        }

        #[test]
        fn test_tx_result_alias() {
            let body = envelope(r#""result":{"check_tx":{"code":0},"tx_result":{"code":2,"log":"x"},"hash":"","height":"3"}"#);
            assert!(matches!(
                classify_broadcast(200, &body),
                Err(LbcError::ExecutionRejected { code: 2, .. })
            ));
        }

        #[test]
        fn test_non_json_body() {
            let err = classify_broadcast(502, b"<html>Bad Gateway</html>").unwrap_err();
            assert!(matches!(err, LbcError::UnexpectedStatus(502, ref s) if s.contains("Bad Gateway")));
            assert_eq!(err.kind(), ErrorKind::Transport);

            let err = classify_broadcast(200, b"").unwrap_err();
            assert!(matches!(err, LbcError::MalformedResponse(_)));
            assert_eq!(err.kind(), ErrorKind::EmptyResult);
        }

        #[test]
        fn test_json_error_with_error_status() {
            let body = envelope(r#""error":{"code":-32600,"message":"Invalid Request","data":{"why":"x"}}"#);
            match classify_broadcast(500, &body).unwrap_err() {
                LbcError::Rpc { code, data, .. } => {
                    assert_eq!(code, -32600);
                    assert_eq!(data, r#"{"why":"x"}"#);
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[test]
        fn test_error_object_wins_over_garbage_result() {
            let body = envelope(
                r#""error":{"code":-32603,"message":"Internal error","data":"boom"},"result":{"check_tx":"garbage"}"#,
            );
            assert!(matches!(
                classify_broadcast(200, &body),
                Err(LbcError::Rpc { code: -32603, .. })
            ));
        }

        #[test]
        fn test_error_object_without_code() {
            let body = envelope(r#""error":{"message":"Internal error","data":"boom"}"#);
            match classify_broadcast(200, &body).unwrap_err() {
                LbcError::Rpc { code, message, data } => {
                    assert_eq!(code, 0);
                    assert_eq!(message, "Internal error");
                    assert_eq!(data, "boom");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[test]
        fn test_error_as_bare_string() {
            let body = envelope(r#""error":"node is shutting down""#);
            match classify_broadcast(200, &body).unwrap_err() {
                LbcError::Rpc { message, .. } => assert_eq!(message, "node is shutting down"),
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[test]
        fn test_check_tx_rejection_with_null_log() {
            let body = envelope(
                r#""result":{"check_tx":{"code":5,"log":null,"codespace":null},"deliver_tx":{"code":0},"hash":"","height":"0"}"#,
            );
            match classify_broadcast(200, &body).unwrap_err() {
                LbcError::ValidationRejected { code, log } => {
                    assert_eq!(code, 5);
                    assert_eq!(log, "");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[test]
        fn test_null_error_is_ignored() {
            let body = envelope(&format!(r#""error":null,"result":{OK_RESULT}"#));
            assert!(classify_broadcast(200, &body).is_ok());
        }
    }

    mod query {
        use super::*;

        #[test]
        fn test_nonzero_code_is_not_an_error() {
            let body = envelope(r#""result":{"response":{"code":6,"log":"not found","value":null}}"#);
            let resp = classify_query(200, &body).unwrap();
            assert_eq!(resp.response().unwrap().code, 6);
        }

        #[test]
        fn test_error_object() {
            let body = envelope(r#""error":{"code":-32602,"message":"Invalid params","data":"bad height"}"#);
            assert!(matches!(
                classify_query(200, &body),
                Err(LbcError::Rpc { code: -32602, .. })
            ));
        }

        #[test]
        fn test_error_object_wins_over_garbage_result() {
            let body = envelope(r#""error":{"message":"Invalid params"},"result":[1,2]"#);
            assert!(matches!(classify_query(200, &body), Err(LbcError::Rpc { .. })));
        }

        #[test]
        fn test_null_log_fields() {
            let body = envelope(r#""result":{"response":{"code":2,"log":null,"info":null,"codespace":null}}"#);
            let resp = classify_query(200, &body).unwrap();
            assert_eq!(resp.response().unwrap().log, "");
        }

        #[test]
        fn test_missing_result() {
            assert!(matches!(
                classify_query(200, &envelope(r#""result":null"#)),
                Err(LbcError::EmptyResult)
            ));
        }
    }

    #[test]
    fn test_snippet_truncates_long_bodies() {
        let body = "x".repeat(1000);
        let s = snippet(body.as_bytes());
        assert!(s.ends_with("..."));
        assert_eq!(s.len(), BODY_SNIPPET_LEN + 3);
    }
}
