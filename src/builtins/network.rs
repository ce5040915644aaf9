//! Network I/O operations: http-get, http-post, http-put, http-delete,
//! http-request.
//!
//! Every network builtin returns a promise rather than blocking the calling
//! thread — the actual request runs on a worker thread via
//! `promise::spawn_promise`, wrapping `crate::sandbox::Sandbox::http_request`.

use crate::error::EvalError;
use crate::promise;
use crate::value::Value;
use lisp_macros::builtin;

use super::sandbox;

fn as_str<'a>(fn_name: &str, arg: &'a Value, position: usize) -> Result<&'a str, EvalError> {
    match arg {
        Value::String(s) => Ok(s),
        other => Err(EvalError::type_error(fn_name, "string", other, position)),
    }
}

fn headers_from_map(fn_name: &str, value: &Value) -> Result<Vec<(String, String)>, EvalError> {
    match value {
        Value::Map(pairs) => pairs
            .iter()
            .map(|(k, v)| {
                let key = match k {
                    Value::String(s) => s.clone(),
                    Value::Symbol(s) => s.trim_start_matches(':').to_string(),
                    other => return Err(EvalError::type_error(fn_name, "string header name", other, 1)),
                };
                let val = match v {
                    Value::String(s) => s.clone(),
                    other => format!("{}", other),
                };
                Ok((key, val))
            })
            .collect(),
        other => Err(EvalError::type_error(fn_name, "map", other, 1)),
    }
}

fn response_to_value(response: crate::sandbox::HttpResponse, url: &str) -> Value {
    let header_pairs = response
        .headers
        .into_iter()
        .map(|(k, v)| (Value::String(k), Value::String(v)))
        .collect();

    let ok = (200..300).contains(&response.status);
    let mut pairs = vec![
        (Value::Symbol(":status".to_string()), Value::Number(response.status as f64)),
        (Value::Symbol(":headers".to_string()), Value::Map(header_pairs)),
        (Value::Symbol(":body".to_string()), Value::String(response.body.clone())),
        (Value::Symbol(":ok".to_string()), Value::Bool(ok)),
        (Value::Symbol(":url".to_string()), Value::String(url.to_string())),
    ];

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(&response.body) {
        pairs.push((Value::Symbol(":json".to_string()), crate::stdlib::json::json_to_value(&json)));
    }

    Value::Map(pairs)
}

fn spawn_request(
    url: String,
    method: String,
    body: Option<String>,
    headers: Option<Vec<(String, String)>>,
) -> Value {
    Value::Promise(promise::spawn_promise(move || {
        sandbox()
            .http_request(&url, &method, headers, body.as_deref(), None)
            .map(|resp| response_to_value(resp, &url))
            .map_err(|e| EvalError::network(e))
    }))
}

#[builtin(name = "http-get", category = "Network I/O", related(http-post, http-request))]
/// Performs an HTTP GET request. Returns a promise resolving to a response
/// map with `:status`, `:headers`, `:body`, `:ok`, `:url`, and (when the body
/// parses as JSON) `:json`.
///
/// # Examples
///
/// ```lisp
/// (await (http-get "https://example.com")) => {:status 200 ...}
/// ```
///
/// # See Also
///
/// http-post, http-request
pub fn http_get(args: &[Value]) -> Result<Value, EvalError> {
    if args.is_empty() || args.len() > 2 {
        return Err(EvalError::arity("http-get", "1 or 2", args.len()));
    }
    let url = as_str("http-get", &args[0], 1)?.to_string();
    let headers = args
        .get(1)
        .map(|h| headers_from_map("http-get", h))
        .transpose()?;
    Ok(spawn_request(url, "GET".to_string(), None, headers))
}

#[builtin(name = "http-post", category = "Network I/O", related(http-get, http-request))]
/// Performs an HTTP POST request with an optional body. Returns a promise
/// resolving to a response map.
///
/// # Examples
///
/// ```lisp
/// (await (http-post "https://api.example.com" "data")) => {:status 201 ...}
/// ```
///
/// # See Also
///
/// http-get, http-request
pub fn http_post(args: &[Value]) -> Result<Value, EvalError> {
    if args.is_empty() || args.len() > 3 {
        return Err(EvalError::arity("http-post", "1 to 3", args.len()));
    }
    let url = as_str("http-post", &args[0], 1)?.to_string();
    let body = args.get(1).map(|b| as_str("http-post", b, 2)).transpose()?.map(str::to_string);
    let headers = args
        .get(2)
        .map(|h| headers_from_map("http-post", h))
        .transpose()?;
    Ok(spawn_request(url, "POST".to_string(), body, headers))
}

/// `(http-put url [body] [headers])` — see `http-post`.
pub fn builtin_http_put(args: &[Value]) -> Result<Value, EvalError> {
    if args.is_empty() || args.len() > 3 {
        return Err(EvalError::arity("http-put", "1 to 3", args.len()));
    }
    let url = as_str("http-put", &args[0], 1)?.to_string();
    let body = args.get(1).map(|b| as_str("http-put", b, 2)).transpose()?.map(str::to_string);
    let headers = args
        .get(2)
        .map(|h| headers_from_map("http-put", h))
        .transpose()?;
    Ok(spawn_request(url, "PUT".to_string(), body, headers))
}

/// `(http-delete url [body] [headers])`.
pub fn builtin_http_delete(args: &[Value]) -> Result<Value, EvalError> {
    if args.is_empty() || args.len() > 3 {
        return Err(EvalError::arity("http-delete", "1 to 3", args.len()));
    }
    let url = as_str("http-delete", &args[0], 1)?.to_string();
    let body = args.get(1).map(|b| as_str("http-delete", b, 2)).transpose()?.map(str::to_string);
    let headers = args
        .get(2)
        .map(|h| headers_from_map("http-delete", h))
        .transpose()?;
    Ok(spawn_request(url, "DELETE".to_string(), body, headers))
}

/// `(http-request method url [body] [headers])` — the general-purpose form
/// the convenience wrappers above delegate to in spirit.
pub fn builtin_http_request(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() < 2 || args.len() > 4 {
        return Err(EvalError::arity("http-request", "2 to 4", args.len()));
    }
    let method = as_str("http-request", &args[0], 1)?.to_string();
    let url = as_str("http-request", &args[1], 2)?.to_string();
    let body = args.get(2).map(|b| as_str("http-request", b, 3)).transpose()?.map(str::to_string);
    let headers = args
        .get(3)
        .map(|h| headers_from_map("http-request", h))
        .transpose()?;
    Ok(spawn_request(url, method, body, headers))
}

pub fn register(env: &std::sync::Arc<crate::env::Environment>) {
    register_http_get(std::sync::Arc::clone(env));
    register_help_http_get();
    register_http_post(std::sync::Arc::clone(env));
    register_help_http_post();

    env.define("http-put".to_string(), Value::BuiltIn(builtin_http_put));
    env.define("http-delete".to_string(), Value::BuiltIn(builtin_http_delete));
    env.define("http-request".to_string(), Value::BuiltIn(builtin_http_request));

    crate::help::register_help(crate::help::HelpEntry {
        name: "http-put".to_string(),
        signature: "(http-put url [body] [headers])".to_string(),
        description: "Performs an HTTP PUT request. Returns a promise resolving to a response map.".to_string(),
        examples: vec!["(await (http-put \"https://api.example.com\" \"data\")) => {:status 200 ...}".to_string()],
        related: vec!["http-request".to_string()],
        category: "Network I/O".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "http-delete".to_string(),
        signature: "(http-delete url [body] [headers])".to_string(),
        description: "Performs an HTTP DELETE request. Returns a promise resolving to a response map.".to_string(),
        examples: vec!["(await (http-delete \"https://api.example.com/1\")) => {:status 204 ...}".to_string()],
        related: vec!["http-request".to_string()],
        category: "Network I/O".to_string(),
    });
    crate::help::register_help(crate::help::HelpEntry {
        name: "http-request".to_string(),
        signature: "(http-request method url [body] [headers])".to_string(),
        description: "General-purpose HTTP request dispatch. Returns a promise resolving to a response map with :status, :headers, :body, :ok, :url, and :json when the body parses as JSON.".to_string(),
        examples: vec!["(await (http-request \"GET\" \"https://example.com\")) => {:status 200 ...}".to_string()],
        related: vec!["http-get".to_string(), "http-post".to_string(), "await".to_string()],
        category: "Network I/O".to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_get_wrong_arity() {
        assert!(http_get(&[]).is_err());
    }

    #[test]
    fn test_json_to_value_object() {
        let json: serde_json::Value = serde_json::json!({"a": 1});
        match crate::stdlib::json::json_to_value(&json) {
            Value::Map(pairs) => assert_eq!(pairs.len(), 1),
            _ => panic!("expected map"),
        }
    }
}
