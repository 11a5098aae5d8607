//! Canned HTTP responses served from a background thread.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;

pub struct CannedResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl CannedResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }
}

/// Serve `routes` on an ephemeral port and return the base URL.
/// Unknown paths get a 404. The thread lives until the test process exits.
pub fn serve(routes: Vec<(&'static str, CannedResponse)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("must bind test server");
    let address = listener.local_addr().expect("must read test server address");
    let routes: HashMap<&'static str, CannedResponse> = routes.into_iter().collect();

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let path = read_request_path(&mut stream);
            let (status, body) = match routes.get(path.as_str()) {
                Some(response) => (response.status, response.body.as_slice()),
                None => (404, &b""[..]),
            };
            let head = format!(
                "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                reason(status),
                body.len()
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(body);
            let _ = stream.flush();
        }
    });

    format!("http://{}", address)
}

fn read_request_path(stream: &mut std::net::TcpStream) -> String {
    let mut request = Vec::new();
    let mut buffer = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buffer) {
            Ok(0) | Err(_) => break,
            Ok(n) => request.extend_from_slice(&buffer[..n]),
        }
    }
    String::from_utf8_lossy(&request)
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string()
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}
