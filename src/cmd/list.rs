/*!
`list.rs`

Implements the `list` subcommand: enumerate every method the schema declares.

JSON Output Shape:
{
  "status": "ok",
  "schema": "<path>",
  "count": 2,
  "methods": [
    { "service": "Geo", "method": "Locate", "request": "LocateRequest", "response": "LocateResponse" }
  ]
}
*/

use anyhow::Result;
use clap::Args;

use crate::cmd::format::{Role, StyleOptions, box_header, color, emoji, table};
use crate::cmd::shared::{load_schema, output_error};
use chateau_call::rpc::artifact::MethodEntry;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub fn execute_list(args: ListArgs, schema: Option<String>) -> Result<()> {
    let Some(schema) = schema else {
        return output_error(
            args.json,
            "List Error",
            "no schema specified (use --schema or CHATEAU_SCHEMA)",
        );
    };
    let artifact = match load_schema(&schema) {
        Ok(a) => a,
        Err(e) => return output_error(args.json, "List Error", &format!("{e:#}")),
    };
    let methods = artifact.methods();

    if args.json {
        let items: Vec<serde_json::Value> = methods.iter().map(method_json).collect();
        let body = serde_json::json!({
            "status": "ok",
            "schema": artifact.path(),
            "count": items.len(),
            "methods": items,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string())
        );
        return Ok(());
    }

    let style = StyleOptions::detect();
    let title = format!("{} Methods ({})", emoji("list", &style), methods.len());
    println!("{}", box_header(title, Some(artifact.path()), &style));
    if methods.is_empty() {
        println!("{}", color(Role::Dim, "schema declares no methods", &style));
        return Ok(());
    }
    let rows: Vec<Vec<String>> = methods
        .iter()
        .map(|m| {
            vec![
                format!("{}.{}", m.service, m.method),
                m.request.name.clone(),
                m.response.name.clone(),
            ]
        })
        .collect();
    println!("{}", table(&["ENDPOINT", "REQUEST", "RESPONSE"], &rows, &style));
    Ok(())
}

fn method_json(m: &MethodEntry) -> serde_json::Value {
    serde_json::json!({
        "service": m.service,
        "method": m.method,
        "request": m.request.name,
        "response": m.response.name,
    })
}
