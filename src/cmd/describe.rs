/*!
`describe.rs`

Implements the `describe` subcommand: show the request and response field
tables of one method, nested records expanded with dotted names.

JSON Output Shape:
{
  "status": "ok",
  "service": "Geo",
  "method": "Locate",
  "request":  { "name": "LocateRequest", "fields": [ {"name":"Near.X","type":"int64","filled":true} ] },
  "response": { "name": "LocateResponse", "fields": [ ... ] }
}

`filled` is false for kinds the materializer skips (arrays, maps).
*/

use anyhow::Result;
use clap::Args;

use crate::cmd::format::{Role, StyleOptions, box_header, color, emoji, table};
use crate::cmd::shared::{load_schema, output_error};
use chateau_call::rpc::bridge::{CallBridge, resolve};
use chateau_call::rpc::shape::{FieldKind, Shape};

#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Method name (the METHOD part of SERVICE.METHOD is also accepted)
    #[arg(value_name = "METHOD")]
    pub method: String,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

/// One flattened row of a field table.
#[derive(Debug, PartialEq)]
pub struct FieldRow {
    pub path: String,
    pub ty: String,
    pub filled: bool,
}

pub fn execute_describe(args: DescribeArgs, schema: Option<String>) -> Result<()> {
    let Some(schema) = schema else {
        return output_error(
            args.json,
            "Describe Error",
            "no schema specified (use --schema or CHATEAU_SCHEMA)",
        );
    };
    let artifact = match load_schema(&schema) {
        Ok(a) => a,
        Err(e) => return output_error(args.json, "Describe Error", &format!("{e:#}")),
    };

    let name = args
        .method
        .rsplit_once('.')
        .map(|(_, m)| m)
        .unwrap_or(&args.method)
        .trim();
    let descriptor = match resolve(artifact.handlers(), name) {
        Ok(d) => d,
        Err(e) => return output_error(args.json, "Describe Error", &e.to_string()),
    };
    let Some(request) = descriptor.request.as_record() else {
        return output_error(args.json, "Describe Error", "request is not a record");
    };
    let request_shape = request.shape();
    let request_rows = flatten_fields(request_shape);
    let response_rows = flatten_fields(&descriptor.response);

    if args.json {
        let body = serde_json::json!({
            "status": "ok",
            "service": descriptor.service,
            "method": descriptor.method,
            "request": shape_json(&request_shape.name, &request_rows),
            "response": shape_json(&descriptor.response.name, &response_rows),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string())
        );
        return Ok(());
    }

    let style = StyleOptions::detect();
    let title = format!(
        "{} {}.{}",
        emoji("info", &style),
        descriptor.service,
        descriptor.method
    );
    println!("{}", box_header(title, Some(artifact.path()), &style));
    print_rows(&format!("Request ({})", request_shape.name), &request_rows, &style);
    println!();
    print_rows(
        &format!("Response ({})", descriptor.response.name),
        &response_rows,
        &style,
    );
    Ok(())
}

/// Depth-first field listing; nested record fields get `Parent.Child` paths.
pub fn flatten_fields(shape: &Shape) -> Vec<FieldRow> {
    let mut rows = Vec::new();
    push_rows(shape, "", &mut rows);
    rows
}

fn push_rows(shape: &Shape, prefix: &str, rows: &mut Vec<FieldRow>) {
    for field in &shape.fields {
        let path = format!("{prefix}{}", field.name);
        rows.push(FieldRow {
            path: path.clone(),
            ty: field.kind.to_string(),
            filled: !matches!(field.kind, FieldKind::Other(_)),
        });
        if let Some(nested) = field.kind.nested() {
            push_rows(nested, &format!("{path}."), rows);
        }
    }
}

fn shape_json(name: &str, rows: &[FieldRow]) -> serde_json::Value {
    let fields: Vec<serde_json::Value> = rows
        .iter()
        .map(|r| serde_json::json!({"name": r.path, "type": r.ty, "filled": r.filled}))
        .collect();
    serde_json::json!({"name": name, "fields": fields})
}

fn print_rows(heading: &str, rows: &[FieldRow], style: &StyleOptions) {
    println!("{}", color(Role::Accent, heading, style));
    if rows.is_empty() {
        println!("{}", color(Role::Dim, "  (no fields)", style));
        return;
    }
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            let note = if r.filled { "" } else { "skipped" };
            vec![r.path.clone(), r.ty.clone(), note.to_string()]
        })
        .collect();
    println!("{}", table(&["FIELD", "TYPE", "NOTE"], &cells, style));
}
