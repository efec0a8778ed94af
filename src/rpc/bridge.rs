//! Dispatch bridge contract.
//!
//! A loaded artifact exposes exactly two entry points: the handler registry
//! and the client call. Everything the pipeline needs goes through them.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::error::{Error, Result};
use super::shape::{Shape, Value};

/// One registered method: an empty request ready to fill, plus what the
/// call needs to know about it.
#[derive(Debug, Clone)]
pub struct HandlerDescriptor {
    /// Service that declares the method in the schema.
    pub service: String,
    pub method: String,
    /// Freshly zeroed request record.
    pub request: Value,
    pub response: Arc<Shape>,
}

/// Registry keyed by method name only.
pub type HandlerRegistry = BTreeMap<String, HandlerDescriptor>;

/// Per-invocation context handed untouched to the call.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    /// Upper bound for the whole remote exchange; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

/// Structured response as returned by the remote side.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Response(pub serde_json::Map<String, serde_json::Value>);

impl Response {
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }
}

pub trait CallBridge {
    /// Full set of registered methods, each with a fresh zero-valued request.
    fn handlers(&self) -> HandlerRegistry;

    /// Perform the remote call once. No retries.
    fn call_client_method(
        &self,
        ctx: &CallContext,
        host: &str,
        port: u16,
        service: &str,
        method: &str,
        request: &Value,
    ) -> impl Future<Output = Result<Response>> + Send;
}

/// Take the descriptor for `method` out of `registry`.
pub fn resolve(mut registry: HandlerRegistry, method: &str) -> Result<HandlerDescriptor> {
    registry.remove(method).ok_or_else(|| Error::UnknownMethod {
        name: method.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::shape::Record;

    fn registry() -> HandlerRegistry {
        let shape = Shape::new("Empty", Vec::new());
        let mut reg = HandlerRegistry::new();
        reg.insert(
            "Ping".into(),
            HandlerDescriptor {
                service: "Health".into(),
                method: "Ping".into(),
                request: Value::Record(Record::zeroed(Arc::clone(&shape))),
                response: shape,
            },
        );
        reg
    }

    #[test]
    fn resolves_by_method_name() {
        let desc = resolve(registry(), "Ping").unwrap();
        assert_eq!(desc.service, "Health");
        assert_eq!(desc.method, "Ping");
    }

    #[test]
    fn unknown_method_is_reported() {
        let err = resolve(registry(), "NoSuchMethod").unwrap_err();
        assert!(matches!(err, Error::UnknownMethod { ref name } if name == "NoSuchMethod"));
    }
}
