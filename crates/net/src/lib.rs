use std::fmt;
use std::io::Read;
use std::time::{Duration, Instant};

pub struct FetchResult {
    pub requested_url: String,
    /// Final URL after redirects.
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
    pub duration_ms: u128,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchError {
    /// The server answered with a non-success status.
    Status { url: String, status: u16 },
    /// DNS, connect, TLS, or timeout failure.
    Transport { url: String, message: String },
    /// The body could not be read to the end.
    Body { url: String, message: String },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Status { url, status } => write!(f, "GET {url} returned {status}"),
            FetchError::Transport { url, message } => write!(f, "GET {url} failed: {message}"),
            FetchError::Body { url, message } => {
                write!(f, "reading body of {url} failed: {message}")
            }
        }
    }
}

impl std::error::Error for FetchError {}

#[derive(Clone, Debug)]
pub struct NetConfig {
    pub timeout: Duration,
    pub user_agent: String,
    /// Bodies are truncated past this many bytes.
    pub max_body_bytes: u64,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: concat!("facetsync/", env!("CARGO_PKG_VERSION")).to_string(),
            max_body_bytes: 8 * 1024 * 1024,
        }
    }
}

/// Blocking `GET` of a text document. No custom headers beyond the user agent.
pub fn fetch_text(url: &str, config: &NetConfig) -> Result<FetchResult, FetchError> {
    let start = Instant::now();
    let agent = ureq::AgentBuilder::new()
        .timeout(config.timeout)
        .user_agent(&config.user_agent)
        .build();

    let resp = match agent.get(url).call() {
        Ok(resp) => resp,
        Err(ureq::Error::Status(status, _)) => {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        Err(ureq::Error::Transport(t)) => {
            return Err(FetchError::Transport {
                url: url.to_string(),
                message: t.to_string(),
            });
        }
    };

    let status = resp.status();
    let final_url = resp.get_url().to_string();
    let content_type = resp.header("content-type").map(str::to_string);
    if !html::is_html(&content_type) {
        log::debug!(target: "net", "{final_url} answered with {content_type:?}, parsing as html anyway");
    }

    let mut buf = Vec::new();
    resp.into_reader()
        .take(config.max_body_bytes)
        .read_to_end(&mut buf)
        .map_err(|e| FetchError::Body {
            url: final_url.clone(),
            message: e.to_string(),
        })?;

    Ok(FetchResult {
        requested_url: url.to_string(),
        url: final_url,
        status,
        content_type,
        body: String::from_utf8_lossy(&buf).into_owned(),
        duration_ms: start.elapsed().as_millis(),
    })
}
