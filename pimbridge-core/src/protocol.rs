//! JSON envelope for command results.
//!
//! Every command prints exactly one envelope:
//! `{"status":"success","data":...}` or
//! `{"status":"error","error":{"kind":...,"code":...,"message":...}}`.

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success { data: T },
    Error { error: ErrorBody },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub code: String,
    pub message: String,
}

impl From<&BridgeError> for ErrorBody {
    fn from(err: &BridgeError) -> Self {
        ErrorBody {
            kind: err.kind().as_str().to_string(),
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl ErrorBody {
    /// A failure outside the bridge's own error taxonomy.
    pub fn internal(message: impl Into<String>) -> Self {
        ErrorBody {
            kind: "internal".into(),
            code: "E_INTERNAL".into(),
            message: message.into(),
        }
    }
}

impl<T: Serialize> Response<T> {
    pub fn success(data: T) -> BridgeResult<String> {
        Ok(serde_json::to_string(&Response::Success { data })?)
    }
}

impl Response<()> {
    pub fn error(body: ErrorBody) -> BridgeResult<String> {
        Ok(serde_json::to_string(&Response::<()>::Error { error: body })?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_success_envelope() {
        let out = Response::success(json!({"id": "abc"})).unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, json!({"status": "success", "data": {"id": "abc"}}));
    }

    #[test]
    fn test_error_envelope_carries_kind_and_code() {
        let err = BridgeError::UnknownField("color".into());
        let out = Response::error(ErrorBody::from(&err)).unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();

        assert_eq!(parsed["status"], "error");
        assert_eq!(parsed["error"]["kind"], "validation");
        assert_eq!(parsed["error"]["code"], "E_UNKNOWN_FIELD");
        assert_eq!(parsed["error"]["message"], "Unknown field 'color'");
    }

    #[test]
    fn test_envelope_parses_back() {
        let out = Response::error(ErrorBody::internal("boom")).unwrap();
        let parsed: Response<Value> = serde_json::from_str(&out).unwrap();
        assert!(matches!(parsed, Response::Error { error } if error.code == "E_INTERNAL"));
    }
}
