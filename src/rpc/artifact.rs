//! Loadable schema artifact.
//!
//! The code generator's output is a descriptor file (JSON, or YAML by
//! extension) holding every record's field table and the service/method map.
//! Loading resolves all type names into shared [`Shape`]s up front, so the
//! registry can hand out zeroed requests without further lookups.
//!
//! ```yaml
//! records:
//!   Point: [{ name: X, type: int64 }]
//!   LocateRequest: [{ name: Query, type: string }, { name: Near, type: "*Point" }]
//!   LocateResponse: [{ name: Found, type: bool }]
//! services:
//!   Geo:
//!     Locate: { request: LocateRequest, response: LocateResponse }
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use super::bridge::{CallBridge, CallContext, HandlerDescriptor, HandlerRegistry, Response};
use super::error::{Error, Result};
use super::shape::{FieldDef, FieldKind, Record, Shape, Value};
use super::transport;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Descriptor {
    #[serde(default)]
    records: BTreeMap<String, Vec<FieldDecl>>,
    services: BTreeMap<String, BTreeMap<String, MethodDecl>>,
}

#[derive(Debug, Deserialize)]
struct FieldDecl {
    name: String,
    #[serde(rename = "type")]
    ty: String,
}

#[derive(Debug, Deserialize)]
struct MethodDecl {
    request: String,
    response: String,
}

/// One method as declared by the schema.
#[derive(Debug, Clone)]
pub struct MethodEntry {
    pub service: String,
    pub method: String,
    pub request: Arc<Shape>,
    pub response: Arc<Shape>,
}

#[derive(Debug)]
pub struct SchemaArtifact {
    path: String,
    methods: Vec<MethodEntry>,
}

impl SchemaArtifact {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|e| Error::load(&shown, e.to_string()))?;

        let lower = shown.to_ascii_lowercase();
        let descriptor: Descriptor = if lower.ends_with(".yaml") || lower.ends_with(".yml") {
            serde_yaml::from_str(&raw).map_err(|e| Error::load(&shown, e.to_string()))?
        } else {
            serde_json::from_str(&raw).map_err(|e| Error::load(&shown, e.to_string()))?
        };

        let methods = resolve_methods(&descriptor).map_err(|reason| Error::load(&shown, reason))?;
        debug!(path = %shown, methods = methods.len(), "schema artifact loaded");
        Ok(Self {
            path: shown,
            methods,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Declared methods, ordered by service then method name.
    pub fn methods(&self) -> &[MethodEntry] {
        &self.methods
    }
}

impl CallBridge for SchemaArtifact {
    fn handlers(&self) -> HandlerRegistry {
        self.methods
            .iter()
            .map(|m| {
                let descriptor = HandlerDescriptor {
                    service: m.service.clone(),
                    method: m.method.clone(),
                    request: Value::Record(Record::zeroed(Arc::clone(&m.request))),
                    response: Arc::clone(&m.response),
                };
                (m.method.clone(), descriptor)
            })
            .collect()
    }

    async fn call_client_method(
        &self,
        ctx: &CallContext,
        host: &str,
        port: u16,
        service: &str,
        method: &str,
        request: &Value,
    ) -> Result<Response> {
        transport::call(ctx, host, port, service, method, request).await
    }
}

fn resolve_methods(descriptor: &Descriptor) -> std::result::Result<Vec<MethodEntry>, String> {
    let mut resolver = ShapeResolver::new(&descriptor.records);
    let mut owners: HashMap<&str, &str> = HashMap::new();
    let mut methods = Vec::new();

    for (service, decls) in &descriptor.services {
        for (method, decl) in decls {
            if let Some(first) = owners.insert(method, service) {
                return Err(format!(
                    "method '{method}' is declared by both '{first}' and '{service}'"
                ));
            }
            methods.push(MethodEntry {
                service: service.clone(),
                method: method.clone(),
                request: resolver.shape(&decl.request)?,
                response: resolver.shape(&decl.response)?,
            });
        }
    }
    Ok(methods)
}

/// Turns record declarations into shared shapes, memoized by name.
struct ShapeResolver<'a> {
    decls: &'a BTreeMap<String, Vec<FieldDecl>>,
    done: HashMap<String, Arc<Shape>>,
    visiting: Vec<String>,
}

impl<'a> ShapeResolver<'a> {
    fn new(decls: &'a BTreeMap<String, Vec<FieldDecl>>) -> Self {
        Self {
            decls,
            done: HashMap::new(),
            visiting: Vec::new(),
        }
    }

    fn shape(&mut self, name: &str) -> std::result::Result<Arc<Shape>, String> {
        if let Some(shape) = self.done.get(name) {
            return Ok(Arc::clone(shape));
        }
        if self.visiting.iter().any(|v| v == name) {
            return Err(format!(
                "record '{name}' is recursive ({} -> {name})",
                self.visiting.join(" -> ")
            ));
        }
        let decls = self
            .decls
            .get(name)
            .ok_or_else(|| format!("unknown record type '{name}'"))?;

        self.visiting.push(name.to_string());
        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(decls.len());
        for decl in decls {
            if !seen.insert(decl.name.as_str()) {
                return Err(format!("record '{name}' repeats field '{}'", decl.name));
            }
            let kind = self
                .kind(decl.ty.trim())
                .map_err(|e| format!("{name}.{}: {e}", decl.name))?;
            fields.push(FieldDef::new(decl.name.clone(), kind));
        }
        self.visiting.pop();

        let shape = Shape::new(name, fields);
        self.done.insert(name.to_string(), Arc::clone(&shape));
        Ok(shape)
    }

    fn kind(&mut self, ty: &str) -> std::result::Result<FieldKind, String> {
        if ty.starts_with("[]") || ty.starts_with("map[") {
            return Ok(FieldKind::Other(ty.to_string()));
        }
        if let Some(target) = ty.strip_prefix('*') {
            if FieldKind::scalar(target).is_some() || !self.decls.contains_key(target) {
                return Err(format!("'{ty}' must point to a record type"));
            }
            return Ok(FieldKind::OptionalRecord(self.shape(target)?));
        }
        if let Some(kind) = FieldKind::scalar(ty) {
            return Ok(kind);
        }
        Ok(FieldKind::Record(self.shape(ty)?))
    }
}
