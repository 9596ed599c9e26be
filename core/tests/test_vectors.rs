//! Verify request building and response parsing against the JSON test
//! vectors stored in `test-vectors/`.
//!
//! Structured bodies are compared as parsed JSON (not raw strings) so field
//! ordering never causes false negatives.

use infra_core::{
    ApiClient, ApiError, ApiResponse, Config, HttpMethod, HttpResponse, Payload, RequestOptions,
};
use serde_json::Value;

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "PATCH" => HttpMethod::Patch,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn parse_headers(value: &Value) -> Vec<(String, String)> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect()
}

fn parse_options(value: &Value) -> RequestOptions {
    let mut options = RequestOptions::new().method(parse_method(value["method"].as_str().unwrap()));
    for (name, v) in parse_headers(&value["headers"]) {
        options = options.header(name, v);
    }
    let body = &value["body"];
    if let Some(raw) = body.get("raw") {
        options = options.raw(raw.as_str().unwrap());
    } else if let Some(json) = body.get("json") {
        options = options.json_value(json.clone());
    }
    options
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let base_url = vectors["base_url"].as_str().unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let mut config = Config::new(base_url);
        if let Some(token) = case["token"].as_str() {
            config = config.with_token(token);
        }
        let client = ApiClient::new(config, ());
        let expected = &case["expected_request"];

        let req = client
            .build_request(case["path"].as_str().unwrap(), parse_options(&case["options"]))
            .unwrap();

        assert_eq!(
            req.method,
            parse_method(expected["method"].as_str().unwrap()),
            "{name}: method"
        );
        assert_eq!(req.url, expected["url"].as_str().unwrap(), "{name}: url");
        assert_eq!(req.headers, parse_headers(&expected["headers"]), "{name}: headers");

        let body = &expected["body"];
        if body.is_null() {
            assert!(req.body.is_none(), "{name}: body should be None");
        } else if let Some(raw) = body.get("raw") {
            assert_eq!(req.body.as_deref(), raw.as_str(), "{name}: raw body");
        } else {
            let sent: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(sent, body["json"], "{name}: json body");
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[test]
fn response_test_vectors() {
    let raw = include_str!("../../test-vectors/responses.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let client = ApiClient::new(Config::new("http://localhost:8000"), ());
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let sim = &case["simulated_response"];
        let response = HttpResponse::new(
            sim["status"].as_u64().unwrap() as u16,
            sim["body"].as_str().unwrap(),
        );
        let result = client.parse_response(response);

        if let Some(expected) = case.get("expected_error") {
            let (status, payload) = match result.unwrap_err() {
                ApiError::Status { status, payload } => (status, payload),
                other => panic!("{name}: expected a status error, got {other:?}"),
            };
            assert_eq!(status as u64, expected["status"].as_u64().unwrap(), "{name}: status");
            let want = match expected.get("json") {
                Some(json) => Payload::Json(json.clone()),
                None => Payload::Text(expected["text"].as_str().unwrap().to_string()),
            };
            assert_eq!(payload, want, "{name}: payload");
        } else {
            let expected = &case["expected_result"];
            let want = match expected.get("json") {
                Some(json) => ApiResponse::Json(json.clone()),
                None => ApiResponse::Text(expected["text"].as_str().unwrap().to_string()),
            };
            assert_eq!(result.unwrap(), want, "{name}: parsed result");
        }
    }
}
