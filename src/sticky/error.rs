use thiserror::Error;

#[derive(Error, Debug)]
pub enum StickyError {
    #[error("Could not reach Joplin: {0}")]
    Transport(String),

    #[error("Joplin answered {url} with HTTP {status}")]
    Status { status: u16, url: String },

    #[error("Malformed response from Joplin: {0}")]
    Malformed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authorization error: {0}")]
    Auth(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Api Error: {0}")]
    Api(String),
}

impl StickyError {
    /// True when the service could not be contacted at all, as opposed to
    /// answering with an error.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, StickyError::Transport(_))
    }
}

impl From<ureq::Error> for StickyError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => StickyError::Status {
                status,
                url: without_query(response.get_url()).to_string(),
            },
            ureq::Error::Transport(transport) => {
                let message = transport.to_string();
                let message = match transport.url() {
                    Some(url) => message.replace(url.as_str(), without_query(url.as_str())),
                    None => message,
                };
                StickyError::Transport(message)
            }
        }
    }
}

/// Every request carries the API token in its query string, so URLs are
/// cut at `?` before they end up in a message.
fn without_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(path, _)| path)
}

pub type Result<T> = std::result::Result<T, StickyError>;
