//! Line-delimited JSON exchange over TCP.
//!
//! One request line out, one reply line back, then the connection is dropped:
//!
//! ```text
//! -> {"service":"Geo","method":"Locate","request":{...}}
//! <- {"status":"ok","response":{...}}
//! <- {"status":"error","error":"..."}
//! ```

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

use super::bridge::{CallContext, Response};
use super::error::{Error, Result};
use super::shape::Value;

#[derive(Serialize)]
struct CallEnvelope<'a> {
    service: &'a str,
    method: &'a str,
    request: &'a Value,
}

#[derive(Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum Reply {
    Ok { response: serde_json::Value },
    Error { error: String },
}

/// Run one exchange against `host:port`, honoring the context deadline.
pub async fn call(
    ctx: &CallContext,
    host: &str,
    port: u16,
    service: &str,
    method: &str,
    request: &Value,
) -> Result<Response> {
    let envelope = CallEnvelope {
        service,
        method,
        request,
    };
    let exchange = exchange(host, port, &envelope);
    match ctx.timeout {
        Some(limit) => tokio::time::timeout(limit, exchange).await.map_err(|_| {
            Error::Invoke(format!(
                "no response from {host}:{port} within {} ms",
                limit.as_millis()
            ))
        })?,
        None => exchange.await,
    }
}

async fn exchange(host: &str, port: u16, envelope: &CallEnvelope<'_>) -> Result<Response> {
    let stream = TcpStream::connect((host, port))
        .await
        .map_err(|e| Error::Invoke(format!("connect {host}:{port}: {e}")))?;
    let (read_half, mut write_half) = stream.into_split();

    let mut line = serde_json::to_vec(envelope)
        .map_err(|e| Error::Invoke(format!("encode request: {e}")))?;
    line.push(b'\n');
    write_half
        .write_all(&line)
        .await
        .map_err(|e| Error::Invoke(format!("send request: {e}")))?;
    write_half
        .flush()
        .await
        .map_err(|e| Error::Invoke(format!("send request: {e}")))?;
    debug!(bytes = line.len(), "request sent");

    let mut reader = BufReader::new(read_half);
    let mut reply = String::new();
    let n = reader
        .read_line(&mut reply)
        .await
        .map_err(|e| Error::Invoke(format!("read reply: {e}")))?;
    if n == 0 {
        return Err(Error::Invoke("connection closed before a reply arrived".into()));
    }

    let reply: Reply = serde_json::from_str(reply.trim_end())
        .map_err(|e| Error::Invoke(format!("undecodable reply: {e}")))?;
    match reply {
        Reply::Ok {
            response: serde_json::Value::Object(map),
        } => Ok(Response(map)),
        Reply::Ok { response } => Err(Error::Invoke(format!(
            "response is not an object: {response}"
        ))),
        Reply::Error { error } => Err(Error::Invoke(error)),
    }
}
