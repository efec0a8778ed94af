/*!
shared.rs - helpers shared by the subcommands.

  - flag_or_env: flag > environment fallback (CHATEAU_SCHEMA, CHATEAU_CONN)
  - load_schema: schema descriptor -> SchemaArtifact (with context)
  - collect_bag: --param-file < --args < --param precedence
  - output_error: JSON or boxed error, then bail
*/

use anyhow::{Context, Result};

use crate::cmd::format::{Role, StyleOptions, box_header, color, emoji};
use chateau_call::rpc::{ArgumentBag, SchemaArtifact, bag, decode_bag};

pub const SCHEMA_ENV: &str = "CHATEAU_SCHEMA";
pub const CONN_ENV: &str = "CHATEAU_CONN";

/// Flag value if present and non-blank, else the named environment variable.
pub fn flag_or_env(flag: Option<String>, env_key: &str) -> Option<String> {
    flag.filter(|s| !s.trim().is_empty())
        .or_else(|| std::env::var(env_key).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn load_schema(path: &str) -> Result<SchemaArtifact> {
    SchemaArtifact::load(path).with_context(|| format!("failed to load schema: '{path}'"))
}

/// Merge every argument source into one bag.
///
/// Precedence (lowest first): `--param-file`, `--args`, `--param KEY=VALUE`.
pub fn collect_bag(
    args_json: Option<&str>,
    params: &[String],
    param_file: Option<&str>,
) -> Result<ArgumentBag> {
    let mut merged = ArgumentBag::new();

    if let Some(path) = param_file {
        merged.extend(load_param_file(path)?);
    }
    if let Some(raw) = args_json {
        merged.extend(decode_bag(raw, "--args")?);
    }
    for kv in params {
        let (key, value) = parse_param(kv)?;
        merged.insert(key, value);
    }
    Ok(merged)
}

/// `KEY=VALUE`; only the key is trimmed, the value is taken verbatim.
pub fn parse_param(kv: &str) -> Result<(String, String)> {
    let Some((k, v)) = kv.split_once('=') else {
        anyhow::bail!("invalid --param (expected KEY=VALUE): {kv}");
    };
    let key = k.trim();
    if key.is_empty() {
        anyhow::bail!("invalid --param (empty key): {kv}");
    }
    Ok((key.to_string(), v.to_string()))
}

/// Read a JSON or YAML object (by extension) and flatten it into a bag.
pub fn load_param_file(path: &str) -> Result<ArgumentBag> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read param file: {path}"))?;
    let lower = path.to_ascii_lowercase();

    let value: serde_json::Value = if lower.ends_with(".yaml") || lower.ends_with(".yml") {
        let yaml_v: serde_yaml::Value =
            serde_yaml::from_str(&raw).context("failed to parse YAML param file")?;
        serde_json::to_value(yaml_v).context("failed to convert YAML to JSON")?
    } else {
        serde_json::from_str(&raw).context("failed to parse JSON param file")?
    };

    let serde_json::Value::Object(map) = value else {
        anyhow::bail!("param file root must be an object: {path}");
    };
    Ok(bag::flatten_object(map))
}

/// Print `msg` as JSON or a boxed error, then fail with it.
pub fn output_error(json: bool, title: &str, msg: &str) -> Result<()> {
    if json {
        let err = serde_json::json!({"status":"error","error":msg});
        println!(
            "{}",
            serde_json::to_string_pretty(&err).unwrap_or_else(|_| err.to_string())
        );
    } else {
        let style = StyleOptions::detect();
        let heading = format!("{} {title}", emoji("error", &style));
        let subtitle = color(Role::Error, msg, &style);
        println!("{}", box_header(heading, Some(&subtitle), &style));
    }
    anyhow::bail!(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn params_split_on_first_equals() {
        assert_eq!(
            parse_param("Near={\"X\":\"1=2\"}").unwrap(),
            ("Near".to_string(), "{\"X\":\"1=2\"}".to_string())
        );
        assert_eq!(parse_param(" Name = a b").unwrap().0, "Name");
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=x").is_err());
    }

    #[test]
    fn precedence_file_then_args_then_params() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"A":"file","B":"file","C":7}}"#).unwrap();
        let bag = collect_bag(
            Some(r#"{"B":"args","D":"args"}"#),
            &["D=param".to_string()],
            Some(file.path().to_str().unwrap()),
        )
        .unwrap();
        assert_eq!(bag["A"], "file");
        assert_eq!(bag["B"], "args");
        assert_eq!(bag["C"], "7");
        assert_eq!(bag["D"], "param");
    }

    #[test]
    fn yaml_param_file_with_nested_bag() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(file, "Query: cafe\nNear:\n  X: \"5\"\n").unwrap();
        let bag = load_param_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(bag["Query"], "cafe");
        assert_eq!(bag["Near"], r#"{"X":"5"}"#);
    }

    #[test]
    fn param_file_root_must_be_object() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "[1,2]").unwrap();
        let err = load_param_file(file.path().to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("must be an object"));
    }

    #[test]
    fn malformed_args_are_rejected() {
        let err = collect_bag(Some("not json"), &[], None).unwrap_err();
        assert!(err.to_string().contains("--args"));
    }

    #[test]
    fn no_sources_means_empty_bag() {
        assert!(collect_bag(None, &[], None).unwrap().is_empty());
    }

    #[test]
    fn blank_flag_falls_through() {
        assert_eq!(
            flag_or_env(Some("  x.yaml ".into()), "CHATEAU_TEST_UNSET_VAR"),
            Some("x.yaml".to_string())
        );
        assert_eq!(flag_or_env(Some("   ".into()), "CHATEAU_TEST_UNSET_VAR"), None);
        assert_eq!(flag_or_env(None, "CHATEAU_TEST_UNSET_VAR"), None);
    }
}
