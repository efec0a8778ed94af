/*!
`call.rs`

Implements the `call` subcommand: resolve one method from the schema, fill its
request from string arguments, call the remote endpoint once, print the response.

Order of work (every failure ends the run):
  1. connection string + endpoint parsed (malformed -> nothing else happens)
  2. argument bag collected (--param-file < --args < --param)
  3. schema artifact loaded
  4. method resolved, request materialized, remote call made (single await)
  5. response rendered

JSON Success Output:
{
  "status": "ok",
  "endpoint": "Geo.Locate",
  "target": "127.0.0.1:9090",
  "elapsed_ms": 3,
  "request": { ...materialized request... },
  "response": { ...reply read back in the declared response shape... }
}

JSON Error Output:
{
  "status":"error",
  "error":"message"
}
*/

use anyhow::{Context, Result};
use clap::Args;
use std::time::{Duration, Instant};
use tracing::info;

use crate::cmd::format::{Role, StyleOptions, box_header, color, emoji};
use crate::cmd::shared::{CONN_ENV, collect_bag, flag_or_env, load_schema, output_error};
use chateau_call::rpc::pipeline::{self, Outcome};
use chateau_call::rpc::render::render_response;
use chateau_call::rpc::{CallContext, EndpointRef};

#[derive(Args, Debug)]
pub struct CallArgs {
    /// Remote address HOST:PORT (falls back to CHATEAU_CONN)
    #[arg(short = 'c', long = "conn-string", alias = "conn_string", value_name = "HOST:PORT")]
    pub conn: Option<String>,

    /// Method to call as SERVICE.METHOD
    #[arg(short = 'e', long = "endpoint", value_name = "SERVICE.METHOD")]
    pub endpoint: String,

    /// Request arguments as a JSON object of field name -> value
    #[arg(short = 'a', long = "args", value_name = "JSON")]
    pub args: Option<String>,

    /// Provide one field (KEY=VALUE), repeatable; overrides --args
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Load arguments from file (JSON or YAML); lowest precedence
    #[arg(long = "param-file", value_name = "PATH")]
    pub param_file: Option<String>,

    /// Give up on the remote call after this many milliseconds
    #[arg(long = "timeout-ms", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute_call(args: CallArgs, schema: Option<String>) -> Result<()> {
    let Some(conn) = flag_or_env(args.conn.clone(), CONN_ENV) else {
        return output_error(
            args.json,
            "Call Error",
            "no connection string (use --conn-string or CHATEAU_CONN)",
        );
    };
    let endpoint = match EndpointRef::parse(&conn, &args.endpoint) {
        Ok(ep) => ep,
        Err(e) => return output_error(args.json, "Call Error", &e.to_string()),
    };

    let bag = match collect_bag(
        args.args.as_deref(),
        &args.params,
        args.param_file.as_deref(),
    ) {
        Ok(bag) => bag,
        Err(e) => return output_error(args.json, "Call Error", &format!("{e:#}")),
    };

    let Some(schema) = schema else {
        return output_error(
            args.json,
            "Call Error",
            "no schema specified (use --schema or CHATEAU_SCHEMA)",
        );
    };
    let artifact = match load_schema(&schema) {
        Ok(a) => a,
        Err(e) => return output_error(args.json, "Call Error", &format!("{e:#}")),
    };
    info!(schema = %artifact.path(), methods = artifact.methods().len(), "schema ready");

    let ctx = CallContext {
        timeout: args.timeout_ms.map(Duration::from_millis),
    };
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    let started = Instant::now();
    let result = rt.block_on(pipeline::invoke(&artifact, &endpoint, &bag, &ctx));
    let elapsed_ms = started.elapsed().as_millis();

    match result {
        Ok(outcome) => {
            print_outcome(&endpoint, &outcome, elapsed_ms, args.json);
            Ok(())
        }
        Err(e) => output_error(args.json, "Call Error", &e.to_string()),
    }
}

fn print_outcome(endpoint: &EndpointRef, outcome: &Outcome, elapsed_ms: u128, json: bool) {
    if json {
        let body = serde_json::json!({
            "status": "ok",
            "endpoint": endpoint.qualified(),
            "target": endpoint.target(),
            "elapsed_ms": elapsed_ms,
            "request": outcome.request,
            "response": outcome.response,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string())
        );
        return;
    }

    let style = StyleOptions::detect();
    let title = format!(
        "{} {}",
        emoji("success", &style),
        color(Role::Success, endpoint.qualified(), &style)
    );
    let subtitle = format!("{} • {elapsed_ms} ms", endpoint.target());
    println!("{}", box_header(title, Some(&subtitle), &style));
    println!("{}", color(Role::Accent, "Response:", &style));
    println!("{}", render_response(&outcome.response, true));
}
