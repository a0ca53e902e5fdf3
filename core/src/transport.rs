//! Executes an `HttpRequest` over the network.
//!
//! # Design
//! `Transport` is the only I/O seam. The production `UreqTransport` turns
//! off ureq's status-as-error behaviour so 4xx/5xx come back as data for the
//! normalizer, while DNS/connect/timeout failures surface as
//! `TransportError`. One request per call, no retries.

use std::time::Duration;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.path.as_str();
        let body = request.body.as_deref().map(str::as_bytes);

        let mut response = match request.method {
            HttpMethod::Get => {
                let mut builder = self.agent.get(url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()?
            }
            HttpMethod::Delete => {
                let mut builder = self.agent.delete(url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()?
            }
            HttpMethod::Post | HttpMethod::Patch => {
                let mut builder = if request.method == HttpMethod::Post {
                    self.agent.post(url)
                } else {
                    self.agent.patch(url)
                };
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match body {
                    Some(bytes) => builder.send(bytes)?,
                    None => builder.send_empty()?,
                }
            }
        };

        let status = response.status().as_u16();
        // Undecodable bytes are replaced so the normalizer can still fall back.
        let bytes = response.body_mut().read_to_vec()?;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::*;

    /// Answers a single request with a 200 whose body is `body`.
    fn serve_once(body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4096];
            let mut seen = Vec::new();
            // Drain the whole request, body included, before answering.
            loop {
                if let Some(end) = seen.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&seen[..end]).to_ascii_lowercase();
                    let expected = head
                        .lines()
                        .find_map(|line| line.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if seen.len() >= end + 4 + expected {
                        break;
                    }
                }
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                seen.extend_from_slice(&buf[..n]);
            }
            let head = format!(
                "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(body).unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn invalid_utf8_body_is_decoded_lossily() {
        let base = serve_once(b"\xff\xfe\xfd");
        let transport = UreqTransport::new(Duration::from_secs(5));
        let request = HttpRequest {
            method: HttpMethod::Get,
            path: format!("{base}/api/v1/channels"),
            headers: Vec::new(),
            body: None,
        };
        let response = transport.execute(&request).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "\u{FFFD}\u{FFFD}\u{FFFD}");
    }

    #[test]
    fn accepted_send_with_undecodable_body_still_succeeds() {
        use serde_json::json;

        use crate::config::Config;
        use crate::dispatch::Dispatcher;

        let base = serve_once(b"\xff\xfe\xfd");
        let dispatcher = Dispatcher::from_config(&Config::new(&base));
        let args = json!({"channel_token": "tok", "message": "hi"});
        let result = dispatcher
            .call("send_notification", args.as_object().unwrap())
            .unwrap();
        assert!(!result.is_error, "{}", result.text);
        assert!(result.text.contains("sent successfully"));
    }

    #[test]
    fn unreachable_host_is_a_transport_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let transport = UreqTransport::new(Duration::from_secs(2));
        let request = HttpRequest {
            method: HttpMethod::Get,
            path: format!("http://127.0.0.1:{port}/api/v1/channels"),
            headers: Vec::new(),
            body: None,
        };
        let err = transport.execute(&request).unwrap_err();
        assert!(!err.message().is_empty());
    }
}
