/* 📖 # Why a serverless event adapter?

The redirect was first deployed as a serverless function behind an API gateway. The
gateway hands the function a JSON event carrying the request `path` and expects a
JSON object with `statusCode`, `headers` and `body` back. Keeping that contract here
lets the same resolver run as a function (`reldirect event`) or as a server
(`reldirect serve`).
*/

use reldirect_base::{ReldirectError, ReldirectResult, ResultExt};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::redirect::{RedirectResponse, Resolver};

/// Inbound gateway event. Fields other than `path` are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayEvent {
    pub path: String,
}

pub fn handle_event(resolver: &Resolver, event: &GatewayEvent) -> RedirectResponse {
    resolver.resolve(&event.path)
}

/// Parse a JSON event, resolve it and serialize the response.
#[instrument(skip_all)]
pub fn handle_event_json(resolver: &Resolver, event_json: &str) -> ReldirectResult<String> {
    let event: GatewayEvent = serde_json::from_str(event_json)
        .map_err(|e| Box::new(ReldirectError::parse("event", e.to_string())))
        .context("Invalid gateway event")?;
    debug!(path = %event.path, "handling gateway event");
    response_to_json(&handle_event(resolver, &event))
}

/// Serialize a response as `{"statusCode":..,"headers":{..},"body":".."}`.
pub fn response_to_json(response: &RedirectResponse) -> ReldirectResult<String> {
    serde_json::to_string(response)
        .map_err(|e| reldirect_base::err!("Failed to serialize response: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;

    #[test]
    fn test_event_with_extra_fields() {
        let json = r#"{
            "path": "/.netlify/functions/handle-version/releases/3.1.0/linux/amd64",
            "httpMethod": "GET",
            "headers": {"accept": "*/*"},
            "queryStringParameters": {}
        }"#;
        let output = handle_event_json(&Resolver::default(), json).unwrap();
        expect![[r#"{"statusCode":302,"headers":{"content-type":"text/plain","location":"https://github.com/kubernetes-sigs/kubebuilder/releases/download/v3.1.0/kubebuilder_linux_amd64"},"body":"Redirecting to https://github.com/kubernetes-sigs/kubebuilder/releases/download/v3.1.0/kubebuilder_linux_amd64"}"#]]
            .assert_eq(&output);
    }

    #[test]
    fn test_not_found_event_keeps_three_field_shape() {
        let output =
            handle_event_json(&Resolver::default(), r#"{"path": "/releases/3.1.0"}"#).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        let object = value.as_object().unwrap();

        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, ["body", "headers", "statusCode"]);
        assert_eq!(value["statusCode"], 404);
        assert_eq!(value["headers"]["content-type"], "text/html");
        assert!(value["body"].as_str().unwrap().contains(r#""rawPath":"/releases/3.1.0""#));
    }

    #[test]
    fn test_event_without_path_is_rejected() {
        let err = handle_event_json(&Resolver::default(), r#"{"rawPath": "/x"}"#).unwrap_err();
        assert!(err.to_string().starts_with("Invalid gateway event: Failed to parse event:"));
        assert!(err.to_string().contains("missing field `path`"));
    }

    #[test]
    fn test_handle_event_matches_resolver() {
        let resolver = Resolver::default();
        let event = GatewayEvent {
            path: "/releases/2.3.1/linux/amd64".to_string(),
        };
        assert_eq!(
            handle_event(&resolver, &event),
            resolver.resolve("/releases/2.3.1/linux/amd64")
        );
    }
}
