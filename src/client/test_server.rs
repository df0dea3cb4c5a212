//! Local HTTP listener answering every request with one fixed status

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

const ERROR_BODY: &str =
    r#"{"error_code":"TEMPORARILY_UNAVAILABLE","message":"warehouse is starting"}"#;

pub struct StatusServer {
    pub url: String,
    request_lines: Arc<Mutex<Vec<String>>>,
}

impl StatusServer {
    /// Serve `status_line` (e.g. `503 Service Unavailable`) on a random port
    pub fn start(status_line: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let request_lines = Arc::new(Mutex::new(Vec::new()));
        let seen = request_lines.clone();

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let Some(line) = read_request(&stream) else {
                    continue;
                };
                seen.lock().unwrap().push(line);

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    ERROR_BODY.len(),
                    ERROR_BODY
                );
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
            }
        });

        Self { url, request_lines }
    }

    /// Requests received whose request line starts with `prefix`, e.g. `POST /api`
    pub fn count(&self, prefix: &str) -> usize {
        self.request_lines
            .lock()
            .unwrap()
            .iter()
            .filter(|line| line.starts_with(prefix))
            .count()
    }
}

/// Read one request fully and return its request line
fn read_request(stream: &TcpStream) -> Option<String> {
    let mut reader = BufReader::new(stream.try_clone().ok()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;

    let mut content_length = 0usize;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header).ok()? == 0 {
            break;
        }
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).ok()?;
    Some(request_line.trim_end().to_string())
}
