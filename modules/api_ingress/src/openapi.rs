//! OpenAPI 3.1 document assembled from registered operation specs and
//! utoipa component schemas.

use std::collections::BTreeMap;

use modkit::api::{OperationSpec, ParamLocation, ResponseSpec};
use serde_json::{json, Map, Value};
use utoipa::openapi::{schema::Schema, RefOr};

pub type Components = BTreeMap<String, RefOr<Schema>>;

pub const BEARER_SCHEME: &str = "bearerAuth";

pub struct DocInfo<'a> {
    pub title: &'a str,
    pub version: &'a str,
    pub description: &'a str,
}

fn schema_ref(components: &Components, name: Option<&str>, array: bool) -> Value {
    let item = match name {
        Some(n) if components.contains_key(n) => json!({ "$ref": format!("#/components/schemas/{n}") }),
        _ => json!({ "type": "object" }),
    };
    if array {
        json!({ "type": "array", "items": item })
    } else {
        item
    }
}

fn response_obj(components: &Components, r: &ResponseSpec) -> Value {
    let mut obj = Map::new();
    obj.insert("description".into(), r.description.clone().into());
    if let Some(ct) = r.content_type {
        obj.insert(
            "content".into(),
            json!({ ct: { "schema": schema_ref(components, r.schema_name.as_deref(), r.array) } }),
        );
    }
    Value::Object(obj)
}

fn operation_obj(components: &Components, spec: &OperationSpec) -> Value {
    let mut op = Map::new();
    let op_id = spec.operation_id.clone().unwrap_or_else(|| {
        format!(
            "{}{}",
            spec.method.as_str().to_lowercase(),
            spec.path.replace(['/', '{', '}'], "_")
        )
    });
    op.insert("operationId".into(), op_id.into());
    if let Some(s) = &spec.summary {
        op.insert("summary".into(), s.clone().into());
    }
    if let Some(d) = &spec.description {
        op.insert("description".into(), d.clone().into());
    }
    if !spec.tags.is_empty() {
        op.insert("tags".into(), json!(spec.tags));
    }

    if !spec.params.is_empty() {
        let params: Vec<Value> = spec
            .params
            .iter()
            .map(|p| {
                let location = match p.location {
                    ParamLocation::Path => "path",
                    ParamLocation::Query => "query",
                };
                let mut param = json!({
                    "name": p.name,
                    "in": location,
                    "required": p.location == ParamLocation::Path || p.required,
                    "schema": { "type": p.param_type },
                });
                if let Some(d) = &p.description {
                    param["description"] = d.clone().into();
                }
                param
            })
            .collect();
        op.insert("parameters".into(), Value::Array(params));
    }

    if let Some(body) = &spec.request_body {
        let mut rb = Map::new();
        if let Some(d) = &body.description {
            rb.insert("description".into(), d.clone().into());
        }
        rb.insert("required".into(), body.required.into());
        rb.insert(
            "content".into(),
            json!({ body.content_type: { "schema": schema_ref(components, body.schema_name.as_deref(), false) } }),
        );
        op.insert("requestBody".into(), Value::Object(rb));
    }

    let responses: Map<String, Value> = spec
        .responses
        .iter()
        .map(|r| (r.status.to_string(), response_obj(components, r)))
        .collect();
    op.insert("responses".into(), Value::Object(responses));

    if spec.requires_auth {
        op.insert("security".into(), json!([{ BEARER_SCHEME: [] }]));
    }
    Value::Object(op)
}

/// Paths are sorted; operations on the same path are keyed by lower-case method.
pub fn build_document<'a>(
    info: &DocInfo<'_>,
    specs: impl IntoIterator<Item = &'a OperationSpec>,
    components: &Components,
) -> anyhow::Result<Value> {
    let mut paths: BTreeMap<String, Map<String, Value>> = BTreeMap::new();
    let mut any_auth = false;
    for spec in specs {
        any_auth |= spec.requires_auth;
        paths
            .entry(spec.path.clone())
            .or_default()
            .insert(spec.method.as_str().to_lowercase(), operation_obj(components, spec));
    }

    let mut comp = Map::new();
    let schemas: Map<String, Value> = components
        .iter()
        .map(|(k, v)| Ok((k.clone(), serde_json::to_value(v)?)))
        .collect::<Result<_, serde_json::Error>>()?;
    if !schemas.is_empty() {
        comp.insert("schemas".into(), Value::Object(schemas));
    }
    if any_auth {
        comp.insert(
            "securitySchemes".into(),
            json!({ BEARER_SCHEME: { "type": "http", "scheme": "bearer", "bearerFormat": "JWT" } }),
        );
    }

    Ok(json!({
        "openapi": "3.1.0",
        "info": {
            "title": info.title,
            "version": info.version,
            "description": info.description,
        },
        "paths": paths,
        "components": comp,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use modkit::api::RequestBodySpec;

    fn spec(method: Method, path: &str, auth: bool) -> OperationSpec {
        OperationSpec {
            method,
            path: path.into(),
            operation_id: None,
            summary: Some("s".into()),
            description: None,
            tags: vec!["T".into()],
            params: vec![],
            request_body: None,
            responses: vec![ResponseSpec {
                status: 204,
                content_type: None,
                description: "No Content".into(),
                schema_name: None,
                array: false,
            }],
            requires_auth: auth,
        }
    }

    const INFO: DocInfo<'static> = DocInfo {
        title: "t",
        version: "1",
        description: "d",
    };

    #[test]
    fn operations_on_one_path_share_an_entry() {
        let specs = [
            spec(Method::GET, "/things/{id}", false),
            spec(Method::DELETE, "/things/{id}", true),
        ];
        let doc = build_document(&INFO, specs.iter(), &Components::new()).unwrap();
        let path = &doc["paths"]["/things/{id}"];
        assert!(path.get("get").is_some());
        assert_eq!(path["delete"]["operationId"], "delete_things__id_");
        assert_eq!(path["delete"]["security"][0][BEARER_SCHEME], json!([]));
        assert!(path["get"].get("security").is_none());
        assert!(path["delete"]["responses"]["204"].get("content").is_none());
        assert_eq!(doc["components"]["securitySchemes"][BEARER_SCHEME]["scheme"], "bearer");
    }

    #[test]
    fn unknown_schema_names_fall_back_to_object() {
        let mut s = spec(Method::POST, "/things", false);
        s.request_body = Some(RequestBodySpec {
            content_type: "application/json",
            description: None,
            schema_name: Some("Missing".into()),
            required: true,
        });
        s.responses[0] = ResponseSpec {
            status: 200,
            content_type: Some("application/json"),
            description: "ok".into(),
            schema_name: Some("Missing".into()),
            array: true,
        };
        let doc = build_document(&INFO, [&s], &Components::new()).unwrap();
        let op = &doc["paths"]["/things"]["post"];
        assert_eq!(
            op["requestBody"]["content"]["application/json"]["schema"]["type"],
            "object"
        );
        assert_eq!(
            op["responses"]["200"]["content"]["application/json"]["schema"]["type"],
            "array"
        );
        assert!(doc["components"].get("securitySchemes").is_none());
    }
}
