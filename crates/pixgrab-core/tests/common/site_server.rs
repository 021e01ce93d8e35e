//! Minimal HTTP/1.1 server imitating the site's search, pages and image hosts
//! for integration tests.
//!
//! - `GET /ajax/search/artworks/{kw}?..&p=N..` → ids configured for page N
//! - `GET /ajax/illust/{id}/pages` → `pages_per_illust` original URLs under `/img/`
//! - `GET /img/{id}_p{k}.png` → a small body derived from the file name

use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Clone, Default)]
pub struct SiteOptions {
    /// Identifiers listed on each search page.
    pub pages: HashMap<usize, Vec<String>>,
    /// Search pages that answer 500.
    pub failing_pages: HashSet<usize>,
    /// Identifiers whose pages endpoint answers 404.
    pub unresolvable: HashSet<String>,
    /// Image files (by name) that answer 404.
    pub broken_images: HashSet<String>,
    /// Files per artwork.
    pub pages_per_illust: usize,
}

/// A request as seen by the server.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub target: String,
    pub cookie: Option<String>,
    pub referer: Option<String>,
}

pub struct SiteServer {
    pub base_url: String,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl SiteServer {
    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn count_matching(&self, needle: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.target.contains(needle))
            .count()
    }
}

/// Body served for an image file.
pub fn image_body(name: &str) -> Vec<u8> {
    format!("image-bytes:{}", name).into_bytes()
}

/// Starts the server in a background thread. Runs until the process exits.
pub fn start(opts: SiteOptions) -> SiteServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let base_url = format!("http://127.0.0.1:{}", port);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let opts = Arc::new(opts);
    {
        let seen = Arc::clone(&seen);
        let base_url = base_url.clone();
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let opts = Arc::clone(&opts);
                let seen = Arc::clone(&seen);
                let base_url = base_url.clone();
                thread::spawn(move || handle(stream, &opts, &seen, &base_url));
            }
        });
    }
    SiteServer { base_url, seen }
}

fn handle(
    mut stream: std::net::TcpStream,
    opts: &SiteOptions,
    seen: &Mutex<Vec<SeenRequest>>,
    base_url: &str,
) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut raw = Vec::new();
    let mut buf = [0u8; 4096];
    while !raw.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => raw.extend_from_slice(&buf[..n]),
        }
    }
    let Ok(request) = std::str::from_utf8(&raw) else {
        return;
    };
    let Some(req) = parse_request(request) else {
        return;
    };
    seen.lock().unwrap().push(req.clone());

    let (status, content_type, body) = route(&req.target, opts, base_url);
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        content_type,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&body);
}

fn route(target: &str, opts: &SiteOptions, base_url: &str) -> (&'static str, &'static str, Vec<u8>) {
    const JSON: &str = "application/json";
    let (path, query) = target.split_once('?').unwrap_or((target, ""));

    if path.starts_with("/ajax/search/artworks/") {
        let page = query
            .split('&')
            .find_map(|kv| kv.strip_prefix("p="))
            .and_then(|p| p.parse::<usize>().ok())
            .unwrap_or(0);
        if opts.failing_pages.contains(&page) {
            return ("500 Internal Server Error", JSON, b"{}".to_vec());
        }
        let data: Vec<String> = opts
            .pages
            .get(&page)
            .map(|ids| {
                ids.iter()
                    .map(|id| format!(r#"{{"id":"{}","title":"t{}"}}"#, id, id))
                    .collect()
            })
            .unwrap_or_default();
        let body = format!(
            r#"{{"error":false,"body":{{"illustManga":{{"data":[{}],"total":{}}}}}}}"#,
            data.join(","),
            data.len()
        );
        return ("200 OK", JSON, body.into_bytes());
    }

    if let Some(rest) = path.strip_prefix("/ajax/illust/") {
        let id = rest.trim_end_matches("/pages");
        if opts.unresolvable.contains(id) {
            return ("404 Not Found", JSON, br#"{"error":true,"message":"gone","body":[]}"#.to_vec());
        }
        let pages: Vec<String> = (0..opts.pages_per_illust.max(1))
            .map(|k| format!(r#"{{"urls":{{"original":"{}/img/{}_p{}.png"}}}}"#, base_url, id, k))
            .collect();
        let body = format!(r#"{{"error":false,"body":[{}]}}"#, pages.join(","));
        return ("200 OK", JSON, body.into_bytes());
    }

    if let Some(name) = path.strip_prefix("/img/") {
        if opts.broken_images.contains(name) {
            return ("404 Not Found", "text/plain", b"missing".to_vec());
        }
        return ("200 OK", "image/png", image_body(name));
    }

    ("404 Not Found", "text/plain", Vec::new())
}

fn parse_request(request: &str) -> Option<SeenRequest> {
    let mut lines = request.lines();
    let target = lines.next()?.split_whitespace().nth(1)?.to_string();
    let mut cookie = None;
    let mut referer = None;
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            if name.eq_ignore_ascii_case("cookie") {
                cookie = Some(value.trim().to_string());
            } else if name.eq_ignore_ascii_case("referer") {
                referer = Some(value.trim().to_string());
            }
        }
    }
    Some(SeenRequest {
        target,
        cookie,
        referer,
    })
}
