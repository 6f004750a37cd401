use axum::extract::{ConnectInfo, Request};
use std::collections::HashMap;
use std::net::SocketAddr;

// Proxy headers in the order they are trusted
const PROXY_HEADERS: [&str; 7] = [
    "x-forwarded-for",
    "x-real-ip",
    "x-client-ip",
    "cf-connecting-ip",
    "x-forwarded",
    "forwarded-for",
    "forwarded",
];

const LOOPBACK: [&str; 3] = ["127.0.0.1", "::1", "::ffff:127.0.0.1"];

pub const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub source_ip: Option<String>,
    // lowercase header name -> value
    pub headers: HashMap<String, String>,
}

impl RequestMeta {
    pub fn new(source_ip: Option<&str>) -> Self {
        Self {
            source_ip: source_ip.map(str::to_string),
            headers: HashMap::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn from_request(req: &Request) -> Self {
        let source_ip = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        let headers = req
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        Self { source_ip, headers }
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

fn usable(candidate: &str) -> bool {
    !candidate.is_empty() && !LOOPBACK.contains(&candidate)
}

/// Picks the first non-loopback address among the socket address and proxy
/// headers, or `"unknown"` when nothing qualifies.
pub fn identify(meta: &RequestMeta) -> String {
    let direct = meta.source_ip.as_deref().map(str::trim);

    let forwarded = PROXY_HEADERS.iter().map(|&name| {
        meta.header(name).map(|value| {
            if name == "x-forwarded-for" {
                value.split(',').next().unwrap_or_default().trim()
            } else {
                value.trim()
            }
        })
    });

    std::iter::once(direct)
        .chain(forwarded)
        .flatten()
        .find(|candidate| usable(candidate))
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

pub fn user_identifier(user_id: &str) -> String {
    format!("user:{}", user_id)
}
