//! Per-call request options and the normalized response value.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::HttpMethod;

/// Request body, tagged by how it goes on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Sent unchanged.
    Raw(String),
    /// Sent as its compact JSON serialization.
    Json(Value),
}

impl RequestBody {
    pub(crate) fn into_wire(self) -> Result<String, ApiError> {
        match self {
            RequestBody::Raw(text) => Ok(text),
            RequestBody::Json(value) => {
                serde_json::to_string(&value).map_err(ApiError::Serialization)
            }
        }
    }
}

/// Method, extra headers and body for a single call. Consumed by
/// `ApiClient::request`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn raw(mut self, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Raw(body.into()));
        self
    }

    pub fn json_value(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Attach any serializable value as a JSON body.
    pub fn json<T: Serialize + ?Sized>(self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(ApiError::Serialization)?;
        Ok(self.json_value(value))
    }
}

/// A successful response: JSON when the body parsed, raw text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Json(Value),
    Text(String),
}

impl ApiResponse {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ApiResponse::Json(value) => Some(value),
            ApiResponse::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ApiResponse::Json(_) => None,
            ApiResponse::Text(text) => Some(text),
        }
    }

    pub fn into_json(self) -> Result<Value, ApiError> {
        match self {
            ApiResponse::Json(value) => Ok(value),
            ApiResponse::Text(body) => Err(ApiError::UnexpectedText { body }),
        }
    }

    /// Decode a JSON response into `T`.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        serde_json::from_value(self.into_json()?).map_err(ApiError::Deserialization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn raw_body_is_sent_unchanged() {
        let body = RequestBody::Raw("{not json".to_string());
        assert_eq!(body.into_wire().unwrap(), "{not json");
    }

    #[test]
    fn json_body_is_serialized_compactly() {
        let body = RequestBody::Json(json!({"stack": "ocr", "tag": "v2"}));
        let wire = body.into_wire().unwrap();
        let back: Value = serde_json::from_str(&wire).unwrap();
        assert_eq!(back, json!({"stack": "ocr", "tag": "v2"}));
        assert!(!wire.contains(' '));
    }

    #[test]
    fn json_builder_accepts_structs() {
        #[derive(Serialize)]
        struct Deploy<'a> {
            stack: &'a str,
        }
        let options = RequestOptions::new()
            .method(HttpMethod::Post)
            .json(&Deploy { stack: "ocr" })
            .unwrap();
        assert_eq!(options.body, Some(RequestBody::Json(json!({"stack": "ocr"}))));
    }

    #[test]
    fn headers_accumulate_in_order() {
        let options = RequestOptions::new().header("x-a", "1").header("x-b", "2");
        assert_eq!(
            options.headers,
            vec![("x-a".to_string(), "1".to_string()), ("x-b".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn accessors_match_variant() {
        let text = ApiResponse::Text("plain text".to_string());
        assert_eq!(text.as_text(), Some("plain text"));
        assert!(text.as_json().is_none());

        let json = ApiResponse::Json(json!({"a": 1}));
        assert!(json.as_text().is_none());
        assert_eq!(json.as_json(), Some(&json!({"a": 1})));
    }

    #[test]
    fn text_response_cannot_be_typed() {
        #[derive(Debug, Deserialize)]
        struct Anything {}
        let err = ApiResponse::Text("plain".to_string()).into_typed::<Anything>().unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedText { ref body } if body == "plain"));
    }

    #[test]
    fn json_response_with_wrong_shape_fails_to_decode() {
        #[derive(Debug, Deserialize)]
        struct Health {
            #[allow(dead_code)]
            status: String,
        }
        let err = ApiResponse::Json(json!({"ok": true})).into_typed::<Health>().unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }
}
