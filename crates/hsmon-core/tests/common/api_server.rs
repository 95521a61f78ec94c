//! Minimal HTTP/1.1 JSON server standing in for the coordinator API.
//!
//! Each route is a `(method, path)` pair with a queue of canned responses;
//! the last response repeats. Every request is recorded so tests can assert
//! on paths and headers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub status: u16,
    pub body: String,
}

impl CannedResponse {
    pub fn json(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

type Routes = HashMap<(String, String), Vec<CannedResponse>>;

#[derive(Default)]
pub struct ApiServerBuilder {
    routes: Routes,
}

impl ApiServerBuilder {
    pub fn route(mut self, method: &str, path: &str, responses: Vec<CannedResponse>) -> Self {
        self.routes
            .insert((method.to_uppercase(), path.to_string()), responses);
        self
    }

    pub fn get(self, path: &str, body: &str) -> Self {
        self.route("GET", path, vec![CannedResponse::json(body)])
    }

    /// Starts the server in a background thread. It runs until the process exits.
    pub fn start(self) -> ApiServer {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let routes = Arc::new(Mutex::new(self.routes));
        let requests = Arc::new(Mutex::new(Vec::new()));
        {
            let routes = Arc::clone(&routes);
            let requests = Arc::clone(&requests);
            thread::spawn(move || {
                for stream in listener.incoming().flatten() {
                    let routes = Arc::clone(&routes);
                    let requests = Arc::clone(&requests);
                    thread::spawn(move || handle(stream, &routes, &requests));
                }
            });
        }
        ApiServer {
            base_url: format!("http://127.0.0.1:{}", port),
            requests,
        }
    }
}

pub struct ApiServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl ApiServer {
    pub fn builder() -> ApiServerBuilder {
        ApiServerBuilder::default()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method.eq_ignore_ascii_case(method) && r.path == path)
            .count()
    }
}

fn handle(
    mut stream: TcpStream,
    routes: &Mutex<Routes>,
    requests: &Mutex<Vec<RecordedRequest>>,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let recorded = parse_request(request);

    let response = {
        let mut routes = routes.lock().unwrap();
        match routes.get_mut(&(recorded.method.to_uppercase(), recorded.path.clone())) {
            Some(queue) if queue.len() > 1 => queue.remove(0),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => CannedResponse::status(404),
        }
    };
    requests.lock().unwrap().push(recorded);

    let reason = match response.status {
        200 => "OK",
        204 => "No Content",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Status",
    };
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        reason,
        response.body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(response.body.as_bytes());
}

fn parse_request(request: &str) -> RecordedRequest {
    let mut lines = request.lines();
    let mut first = lines.next().unwrap_or("").split_whitespace();
    let method = first.next().unwrap_or("").to_string();
    let path = first.next().unwrap_or("").to_string();
    let mut authorization = None;
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("authorization") {
                authorization = Some(value.trim().to_string());
            }
        }
    }
    RecordedRequest {
        method,
        path,
        authorization,
    }
}
