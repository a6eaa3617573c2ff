use std::sync::Arc;

use reldirect_base::ReldirectResult;
use reldirect_base::pal::http::{HttpRequest, HttpResponse, HttpService, HttpStatusCode};
use tracing::debug;

use crate::redirect::{RedirectResponse, Resolver};

/// HTTP service answering every request with the resolver's redirect or 404 page.
///
/// The method is not inspected and the query string is dropped before resolving.
#[derive(Debug, Clone)]
pub struct RedirectService {
    resolver: Arc<Resolver>,
}

impl RedirectService {
    pub fn new(resolver: Resolver) -> Self {
        Self {
            resolver: Arc::new(resolver),
        }
    }

    fn request_path(target: &str) -> &str {
        target.split('?').next().unwrap_or(target)
    }

    fn into_http(response: RedirectResponse) -> HttpResponse {
        HttpResponse::new(HttpStatusCode::from(response.status_code))
            .with_headers(response.headers)
            .with_body(response.body)
    }
}

impl HttpService for RedirectService {
    fn handle_request(&self, request: HttpRequest) -> ReldirectResult<HttpResponse> {
        let path = Self::request_path(request.path());
        let response = self.resolver.resolve(path);
        debug!(
            method = %request.method(),
            path,
            status = response.status_code,
            location = response.location().unwrap_or(""),
            "resolved download request"
        );
        Ok(Self::into_http(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reldirect_base::pal::http::{HttpMethod, HttpServerConfig, HttpServerHandle};
    use reldirect_base::{MockPal, Pal};

    const DOWNLOAD: &str = "https://github.com/kubernetes-sigs/kubebuilder/releases/download";

    fn start(pal: &MockPal) -> HttpServerHandle {
        let service = Box::new(RedirectService::new(Resolver::default()));
        pal.start_http_server(service, HttpServerConfig::default())
            .unwrap()
    }

    #[test]
    fn test_redirect_through_mock_server() {
        let pal = MockPal::new();
        let server = start(&pal);

        let response = pal
            .simulate_request(
                server.port(),
                HttpRequest::new(HttpMethod::Get, "/releases/3.1.0/linux/amd64"),
            )
            .unwrap();

        let location = format!("{DOWNLOAD}/v3.1.0/kubebuilder_linux_amd64");
        assert_eq!(response.status(), HttpStatusCode::FOUND);
        assert_eq!(response.headers().get("location"), Some(location.as_str()));
        assert_eq!(response.headers().get("content-type"), Some("text/plain"));
        assert_eq!(
            response.body().as_string(),
            Some(format!("Redirecting to {location}"))
        );
    }

    #[test]
    fn test_query_string_is_ignored() {
        let pal = MockPal::new();
        let server = start(&pal);

        let response = pal
            .simulate_request(
                server.port(),
                HttpRequest::new(HttpMethod::Head, "/releases/1.0.8/darwin/arm64?source=docs"),
            )
            .unwrap();
        assert_eq!(
            response.headers().get("location"),
            Some(format!("{DOWNLOAD}/v1.0.8/kubebuilder_1.0.8_darwin_arm64.tar.gz").as_str())
        );
    }

    #[test]
    fn test_any_method_is_resolved() {
        let pal = MockPal::new();
        let server = start(&pal);

        let response = pal
            .simulate_request(
                server.port(),
                HttpRequest::new(HttpMethod::from("TRACE"), "/releases/3.1.0/linux/arm64"),
            )
            .unwrap();
        assert_eq!(response.status(), HttpStatusCode::FOUND);
    }

    #[test]
    fn test_malformed_path_gets_diagnostic_page() {
        let pal = MockPal::new();
        let server = start(&pal);

        let response = pal
            .simulate_request(
                server.port(),
                HttpRequest::new(HttpMethod::Get, "/downloads/latest"),
            )
            .unwrap();
        assert_eq!(response.status(), HttpStatusCode::NOT_FOUND);
        assert_eq!(response.headers().get("content-type"), Some("text/html"));
        assert!(!response.headers().contains("location"));
        let body = response.body().as_string().unwrap();
        assert!(body.contains(r#""rawPath":"/downloads/latest""#));
    }

    #[test]
    fn test_request_path_strips_query() {
        assert_eq!(RedirectService::request_path("/a/b?c=d?e"), "/a/b");
        assert_eq!(RedirectService::request_path("/a/b"), "/a/b");
        assert_eq!(RedirectService::request_path(""), "");
    }
}
