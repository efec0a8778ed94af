//! Invocation core and logging setup for the `chateau-call` binary.

pub mod rpc;
pub mod utils;
