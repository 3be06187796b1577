//! Route dispatch. Pure function of (method, path, body) so tests exercise
//! the full request surface without a socket.

use crate::server::api;

pub struct HttpResponse {
    pub status_code: u16,
    pub status_text: &'static str,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    pub fn to_http_string(&self) -> String {
        format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status_code,
            self.status_text,
            self.content_type,
            self.body.len(),
            self.body
        )
    }
}

fn ok_json(body: String) -> HttpResponse {
    HttpResponse {
        status_code: 200,
        status_text: "OK",
        content_type: "application/json",
        body,
    }
}

fn error_response(status_code: u16, status_text: &'static str, message: &str) -> HttpResponse {
    HttpResponse {
        status_code,
        status_text,
        content_type: "application/json",
        body: format!("{{\"status\": \"error\", \"message\": {}}}", serde_json::json!(message)),
    }
}

pub fn route_request(method: &str, path: &str, body: &str) -> HttpResponse {
    match (method, path) {
        ("GET", "/api/health") => match api::health_payload() {
            Ok(payload) => ok_json(payload),
            Err(err) => error_response(500, "Internal Server Error", &err.to_string()),
        },
        ("GET", "/api/sectors") => match api::sectors_payload() {
            Ok(payload) => ok_json(payload),
            Err(err) => error_response(500, "Internal Server Error", &err.to_string()),
        },
        ("GET", "/api/data/version") => match api::data_version_payload() {
            Ok(payload) => ok_json(payload),
            Err(err) => error_response(500, "Internal Server Error", &err.to_string()),
        },
        ("POST", "/api/recommendations") => match api::recommendations_payload(body) {
            Ok(payload) => ok_json(payload),
            Err(api::RecommendPayloadError::Parse(err)) => {
                error_response(400, "Bad Request", &format!("Invalid request body: {err}"))
            }
            Err(api::RecommendPayloadError::Validation(response)) => HttpResponse {
                status_code: 400,
                status_text: "Bad Request",
                content_type: "application/json",
                body: serde_json::to_string_pretty(&response)
                    .unwrap_or_else(|_| "{\"status\": \"error\"}".to_string()),
            },
            Err(api::RecommendPayloadError::Engine(msg)) => {
                error_response(500, "Internal Server Error", &msg)
            }
        },
        _ => error_response(404, "Not Found", &format!("no route for {method} {path}")),
    }
}
