//! Invocation core.
//!
//! decode_bag -> materialize (shape from the handler registry) -> call_client_method
//!   -> decode_reply (declared response shape) -> render
//!
//! Layout:
//!   shape        field tables, records, values
//!   bag          argument bag decoding
//!   materialize  type-directed request filling
//!   endpoint     HOST:PORT / SERVICE.METHOD parsing
//!   bridge       two-entry-point call contract + method resolution
//!   artifact     schema descriptor loading (implements the bridge)
//!   transport    line-delimited JSON over TCP
//!   reply        typed decoding of the remote reply
//!   pipeline     one invocation end to end
//!   render       response output

pub mod artifact;
pub mod bag;
pub mod bridge;
pub mod endpoint;
pub mod error;
pub mod materialize;
pub mod pipeline;
pub mod render;
pub mod reply;
pub mod shape;
pub mod transport;

pub use artifact::SchemaArtifact;
pub use bag::{ArgumentBag, decode_bag};
pub use bridge::{CallBridge, CallContext};
pub use endpoint::EndpointRef;
pub use error::Error;
