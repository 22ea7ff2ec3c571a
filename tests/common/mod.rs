//! Local download targets for probe tests.
//!
//! Minimal blocking HTTP/1.1 server on 127.0.0.1, parsed with httparse.
//! One request per connection, GET only, routes fixed at startup.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use toolbelt::HttpProbe;

/// Maximum header section size (32 KiB)
const MAX_HEADER_SIZE: usize = 32 * 1024;

/// Probe that talks to 127.0.0.1 directly, ignoring proxy settings.
pub fn local_probe() -> HttpProbe {
    let client = reqwest::blocking::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    HttpProbe::with_client(client)
}

/// What the server answers for a path
#[derive(Clone)]
pub enum Route {
    /// 200 with the given body
    Ok(&'static str),
    /// Any status without body
    Status(u16),
    /// 302 to another path
    Redirect(&'static str),
}

pub struct TargetServer {
    base_url: String,
    hits: Arc<Mutex<Vec<String>>>,
}

impl TargetServer {
    /// Start serving in a background thread. Unknown paths get 404.
    pub fn start(routes: &[(&'static str, Route)]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let routes: HashMap<&'static str, Route> = routes.iter().cloned().collect();
        let hits = Arc::new(Mutex::new(Vec::new()));

        let server_hits = Arc::clone(&hits);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                handle(stream, &routes, &server_hits);
            }
        });

        Self { base_url, hits }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Paths requested so far, in arrival order.
    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }
}

fn handle(mut stream: TcpStream, routes: &HashMap<&'static str, Route>, hits: &Mutex<Vec<String>>) {
    let Some(path) = read_request_path(&mut stream) else {
        return;
    };
    hits.lock().unwrap().push(path.clone());

    let response = match routes.get(path.as_str()) {
        Some(Route::Ok(body)) => format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        ),
        Some(Route::Status(status)) => format!(
            "HTTP/1.1 {} Status\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            status
        ),
        Some(Route::Redirect(location)) => format!(
            "HTTP/1.1 302 Found\r\nLocation: {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            location
        ),
        None => "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string(),
    };

    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn read_request_path(stream: &mut impl Read) -> Option<String> {
    let mut header_buf = Vec::with_capacity(1024);
    let mut byte = [0u8; 1];

    while !header_buf.ends_with(b"\r\n\r\n") {
        match stream.read(&mut byte) {
            Ok(0) | Err(_) => return None,
            Ok(_) => header_buf.push(byte[0]),
        }
        if header_buf.len() > MAX_HEADER_SIZE {
            return None;
        }
    }

    let mut headers = [httparse::EMPTY_HEADER; 64];
    let mut request = httparse::Request::new(&mut headers);
    match request.parse(&header_buf) {
        Ok(httparse::Status::Complete(_)) => request.path.map(str::to_string),
        _ => None,
    }
}
