//! Wire envelopes.
//!
//! A task travels as its kind tag plus its serialized parameters; a result
//! travels as an opaque payload plus the tag of its type. The caller
//! decodes the payload with the output type of the task it sent.

use serde::{Deserialize, Serialize};

use crate::{result_type, ComputeError, ErrorKind, RequestId, Result, Task};

/// A task on its way to the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEnvelope {
    /// Request id, echoed on the result
    pub request_id: RequestId,
    /// `Task::KIND` of the sealed task
    pub kind: String,
    /// Serialized task parameters
    pub payload: serde_json::Value,
}

impl TaskEnvelope {
    /// Seal a task for transmission.
    pub fn seal<T: Task>(task: &T) -> Result<Self> {
        Ok(Self {
            request_id: RequestId::new(),
            kind: T::KIND.to_string(),
            payload: serde_json::to_value(task)?,
        })
    }

    /// Recover the task, checking that the kind matches.
    pub fn open<T: Task>(&self) -> Result<T> {
        if self.kind != T::KIND {
            return Err(ComputeError::UnsupportedTask(format!(
                "envelope holds `{}`, not `{}`",
                self.kind,
                T::KIND
            )));
        }
        Ok(T::deserialize(&self.payload)?)
    }
}

/// The outcome of a successful execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultEnvelope {
    /// Id of the request this answers
    pub request_id: RequestId,
    /// Type tag of the payload, see [`result_type`]
    pub result_type: String,
    /// Serialized task output
    pub payload: serde_json::Value,
    /// Time spent inside `execute` on the serving side
    pub elapsed_ms: u64,
}

impl ResultEnvelope {
    /// Decode the payload as the output of `T`.
    pub fn decode<T: Task>(self) -> Result<T::Output> {
        let expected = result_type::<T>();
        if self.result_type != expected {
            return Err(ComputeError::ResultType {
                expected,
                found: self.result_type,
            });
        }
        Ok(serde_json::from_value(self.payload)?)
    }
}

/// A line sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Request {
    /// Ask whether a service is bound under this name
    Lookup {
        /// Service name, usually [`SERVICE_NAME`](crate::SERVICE_NAME)
        service: String,
    },

    /// Execute a task
    Execute {
        /// The sealed task
        task: TaskEnvelope,
    },

    /// Liveness check
    Ping,
}

/// A line sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Request id, when the request carried one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    /// Result data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Reply>,
    /// Error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<WireError>,
}

/// Successful reply bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reply {
    /// The looked-up service is bound
    Bound {
        /// Service name
        service: String,
        /// Server version
        version: String,
    },
    /// Task output
    Executed(ResultEnvelope),
    /// Answer to `ping`
    Pong,
}

/// Error body of a [`Response`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireError {
    /// Failure class
    pub kind: ErrorKind,
    /// Human readable message
    pub message: String,
}

impl Response {
    /// Successful response.
    pub fn ok(id: Option<RequestId>, reply: Reply) -> Self {
        Self {
            id,
            result: Some(reply),
            error: None,
        }
    }

    /// Error response.
    pub fn err(id: Option<RequestId>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            id,
            result: None,
            error: Some(WireError {
                kind,
                message: message.into(),
            }),
        }
    }

    /// Split into the reply or the rebuilt error.
    pub fn into_result(self) -> Result<Reply> {
        match (self.result, self.error) {
            (_, Some(e)) => Err(ComputeError::from_wire(e.kind, e.message)),
            (Some(reply), None) => Ok(reply),
            (None, None) => Err(ComputeError::Transport(
                "response carries neither result nor error".to_string(),
            )),
        }
    }
}

impl From<&ComputeError> for WireError {
    fn from(e: &ComputeError) -> Self {
        Self {
            kind: e.kind(),
            message: e.message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TaskError, Transmissible};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Echo {
        text: String,
    }

    impl Transmissible for Echo {}

    impl Task for Echo {
        const KIND: &'static str = "echo";
        type Output = String;

        fn execute(&self) -> std::result::Result<String, TaskError> {
            Ok(self.text.clone())
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Other;

    impl Transmissible for Other {}

    impl Task for Other {
        const KIND: &'static str = "other";
        type Output = u8;

        fn execute(&self) -> std::result::Result<u8, TaskError> {
            Ok(0)
        }
    }

    #[test]
    fn test_seal_and_open() {
        let task = Echo { text: "hi".into() };
        let envelope = TaskEnvelope::seal(&task).unwrap();
        assert_eq!(envelope.kind, "echo");
        assert_eq!(envelope.open::<Echo>().unwrap(), task);
    }

    #[test]
    fn test_open_wrong_kind() {
        let envelope = TaskEnvelope::seal(&Echo { text: "hi".into() }).unwrap();
        let err = envelope.open::<Other>().unwrap_err();
        assert!(matches!(err, ComputeError::UnsupportedTask(_)));
    }

    #[test]
    fn test_decode_checks_result_type() {
        let envelope = ResultEnvelope {
            request_id: RequestId::new(),
            result_type: result_type::<Echo>(),
            payload: serde_json::json!("hello"),
            elapsed_ms: 0,
        };
        let err = envelope.clone().decode::<Other>().unwrap_err();
        assert!(matches!(err, ComputeError::ResultType { .. }));
        assert_eq!(envelope.decode::<Echo>().unwrap(), "hello");
    }

    #[test]
    fn test_request_wire_format() {
        let json = serde_json::to_value(Request::Lookup {
            service: "Computer".into(),
        })
        .unwrap();
        assert_eq!(json["method"], "lookup");
        assert_eq!(json["service"], "Computer");

        let parsed: Request = serde_json::from_str(r#"{"method":"ping"}"#).unwrap();
        assert!(matches!(parsed, Request::Ping));
    }

    #[test]
    fn test_response_into_result() {
        let ok = Response::ok(None, Reply::Pong);
        assert!(matches!(ok.into_result().unwrap(), Reply::Pong));

        let err = Response::err(None, ErrorKind::Execution, "failed");
        assert!(matches!(
            err.into_result().unwrap_err(),
            ComputeError::Execution(msg) if msg == "failed"
        ));

        let empty = Response {
            id: None,
            result: None,
            error: None,
        };
        assert!(matches!(
            empty.into_result().unwrap_err(),
            ComputeError::Transport(_)
        ));
    }
}
