//! One invocation, end to end: resolve the method, fill its request, call once,
//! read the reply back as the declared response record.

use tracing::{debug, info, warn};

use super::bag::ArgumentBag;
use super::bridge::{CallBridge, CallContext, resolve};
use super::endpoint::EndpointRef;
use super::error::Result;
use super::materialize::materialize;
use super::reply::decode_reply;
use super::shape::{Record, Value};

/// What a successful invocation produced.
#[derive(Debug)]
pub struct Outcome {
    /// Request as it was sent.
    pub request: Value,
    /// Reply decoded into the declared response shape.
    pub response: Record,
}

pub async fn invoke<B: CallBridge>(
    bridge: &B,
    endpoint: &EndpointRef,
    bag: &ArgumentBag,
    ctx: &CallContext,
) -> Result<Outcome> {
    let descriptor = resolve(bridge.handlers(), &endpoint.method)?;
    if descriptor.service != endpoint.service {
        warn!(
            requested = %endpoint.service,
            declared = %descriptor.service,
            method = %endpoint.method,
            "service name differs from the schema; calling as requested"
        );
    }

    let mut request = descriptor.request;
    materialize(&mut request, bag)?;
    debug!(method = %endpoint.method, keys = bag.len(), "request materialized");

    info!(addr = %endpoint.target(), endpoint = %endpoint.qualified(), "dispatching call");
    let reply = bridge
        .call_client_method(
            ctx,
            &endpoint.host,
            endpoint.port,
            &endpoint.service,
            &endpoint.method,
            &request,
        )
        .await?;
    debug!(fields = reply.0.len(), "response received");
    let response = decode_reply(&descriptor.response, &reply)?;

    Ok(Outcome { request, response })
}
