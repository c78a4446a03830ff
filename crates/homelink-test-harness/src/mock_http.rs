//! Mock HTTP server for testing REST adapters.
//!
//! [`MockHttpServer`] answers each incoming HTTP/1.1 request with the next
//! scripted response and records what it received. Every connection carries
//! exactly one request and is closed after the response.

use homelink_core::error::{Error, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// One request as seen by the mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

#[derive(Debug, Clone)]
struct ScriptedResponse {
    status: u16,
    body: String,
}

/// A scripted HTTP/1.1 server on a random localhost port.
pub struct MockHttpServer {
    addr: String,
    listener: Option<TcpListener>,
    responses: VecDeque<ScriptedResponse>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    server_handle: Option<JoinHandle<()>>,
}

impl MockHttpServer {
    /// Bind a new server. Script responses, then call
    /// [`start`](MockHttpServer::start).
    pub async fn new() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| Error::Transport(format!("failed to bind mock HTTP server: {e}")))?;
        let addr = listener.local_addr()?.to_string();

        Ok(Self {
            addr,
            listener: Some(listener),
            responses: VecDeque::new(),
            requests: Arc::new(Mutex::new(Vec::new())),
            server_handle: None,
        })
    }

    /// `host:port` of the server, usable as an adapter's host setting.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Queue a response with `status` and a JSON (or any text) `body`.
    pub fn respond(&mut self, status: u16, body: &str) {
        self.responses.push_back(ScriptedResponse {
            status,
            body: body.to_string(),
        });
    }

    /// Start answering requests. Once the script runs out the server
    /// answers `500` to anything else.
    pub fn start(&mut self) {
        let Some(listener) = self.listener.take() else {
            return;
        };
        let mut responses: VecDeque<ScriptedResponse> = self.responses.drain(..).collect();
        let requests = Arc::clone(&self.requests);

        let handle = tokio::spawn(async move {
            loop {
                let (mut stream, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::warn!(error = %e, "Mock HTTP server accept failed");
                        return;
                    }
                };

                let request = match read_request(&mut stream).await {
                    Ok(request) => request,
                    Err(e) => {
                        tracing::warn!(error = %e, "Mock HTTP server could not read request");
                        continue;
                    }
                };
                lock(&requests).push(request);

                let response = responses.pop_front().unwrap_or(ScriptedResponse {
                    status: 500,
                    body: "unscripted request".into(),
                });
                if let Err(e) = write_response(&mut stream, &response).await {
                    tracing::warn!(error = %e, "Mock HTTP server could not write response");
                }
            }
        });

        self.server_handle = Some(handle);
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }
}

impl Drop for MockHttpServer {
    fn drop(&mut self) {
        if let Some(handle) = self.server_handle.take() {
            handle.abort();
        }
    }
}

fn lock(requests: &Mutex<Vec<RecordedRequest>>) -> MutexGuard<'_, Vec<RecordedRequest>> {
    requests.lock().unwrap_or_else(|e| e.into_inner())
}

async fn read_request(stream: &mut TcpStream) -> std::io::Result<RecordedRequest> {
    let mut data = Vec::new();
    let mut buf = [0u8; 1024];

    let header_end = loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }
        data.extend_from_slice(&buf[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let path = request_line.next().unwrap_or_default().to_string();

    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while data.len() < header_end + content_length {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
    }

    let body_end = data.len().min(header_end + content_length);
    let body = String::from_utf8_lossy(&data[header_end..body_end]).into_owned();

    Ok(RecordedRequest { method, path, body })
}

async fn write_response(stream: &mut TcpStream, response: &ScriptedResponse) -> std::io::Result<()> {
    let reason = match response.status {
        200 => "OK",
        202 => "Accepted",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    };
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        reason,
        response.body.len()
    );
    stream.write_all(head.as_bytes()).await?;
    stream.write_all(response.body.as_bytes()).await?;
    stream.flush().await?;
    stream.shutdown().await
}
