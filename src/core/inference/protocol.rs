//! IPC protocol types for server ↔ worker communication.
//!
//! Uses JSON Lines (one JSON object per line) over stdin/stdout pipes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::InferenceResult;

/// Request sent from server to worker via stdin.
#[derive(Serialize, Deserialize, Debug)]
pub struct WorkerRequest {
    /// Monotonic request ID for correlating responses. 0 = fire-and-forget.
    pub id: u64,
    pub command: WorkerCommand,
}

/// Commands the server can send to the worker.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerCommand {
    /// Parse the document at `path`.
    Parse {
        path: PathBuf,
        skip_cross_page_merge: bool,
        max_page_retries: u32,
    },
    /// Graceful shutdown.
    Shutdown,
}

/// Response sent from worker to server via stdout.
#[derive(Serialize, Deserialize, Debug)]
pub struct WorkerResponse {
    /// Matches the request ID. 0 for unsolicited messages.
    pub id: u64,
    pub payload: WorkerPayload,
}

/// Response payloads from the worker.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerPayload {
    /// Model loaded, worker accepts commands.
    Ready,
    /// Parse finished. `None` means the worker produced no result.
    Parsed {
        #[serde(default)]
        result: Option<InferenceResult>,
    },
    /// Something failed; for id 0 this is a startup failure.
    Error { message: String },
}

/// Worker response with the payload left undecoded.
///
/// Decoding the id separately lets a malformed payload still fail the request
/// waiting on it.
#[derive(Deserialize, Debug)]
pub struct ResponseEnvelope {
    pub id: u64,
    pub payload: serde_json::Value,
}

impl ResponseEnvelope {
    /// Decode the payload.
    pub fn into_payload(self) -> Result<WorkerPayload, serde_json::Error> {
        serde_json::from_value(self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_wire_format() {
        let request = WorkerRequest {
            id: 7,
            command: WorkerCommand::Parse {
                path: PathBuf::from("/tmp/ocrflux-a.pdf"),
                skip_cross_page_merge: true,
                max_page_retries: 3,
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": 7,
                "command": {
                    "type": "parse",
                    "path": "/tmp/ocrflux-a.pdf",
                    "skip_cross_page_merge": true,
                    "max_page_retries": 3
                }
            })
        );
    }

    #[test]
    fn test_null_and_missing_result_decode_as_none() {
        for line in [
            r#"{"id":3,"payload":{"type":"parsed","result":null}}"#,
            r#"{"id":3,"payload":{"type":"parsed"}}"#,
        ] {
            let response: WorkerResponse = serde_json::from_str(line).unwrap();
            assert_eq!(response.id, 3);
            assert_eq!(response.payload, WorkerPayload::Parsed { result: None });
        }
    }

    #[test]
    fn test_ready_and_error_payloads() {
        let ready: WorkerResponse =
            serde_json::from_str(r#"{"id":0,"payload":{"type":"ready"}}"#).unwrap();
        assert_eq!(ready.payload, WorkerPayload::Ready);

        let error: WorkerResponse = serde_json::from_str(
            r#"{"id":0,"payload":{"type":"error","message":"CUDA out of memory"}}"#,
        )
        .unwrap();
        assert_eq!(
            error.payload,
            WorkerPayload::Error {
                message: "CUDA out of memory".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_payload_keeps_id() {
        for line in [
            r#"{"id":4,"payload":{"type":"parsed","result":{"document_text":"x"}}}"#,
            r#"{"id":4,"payload":{"type":"parsed","result":{"document_text":"x","page_texts":["x"],"fallback_pages":[-1],"num_pages":1}}}"#,
            r#"{"id":4,"payload":{"type":"progress","page":2}}"#,
        ] {
            let envelope: ResponseEnvelope = serde_json::from_str(line).unwrap();
            assert_eq!(envelope.id, 4);
            assert!(envelope.into_payload().is_err(), "{line}");
        }
    }

    #[test]
    fn test_well_formed_envelope_decodes_payload() {
        let envelope: ResponseEnvelope =
            serde_json::from_str(r#"{"id":9,"payload":{"type":"parsed","result":null}}"#).unwrap();
        assert_eq!(
            envelope.into_payload().unwrap(),
            WorkerPayload::Parsed { result: None }
        );
    }
}
