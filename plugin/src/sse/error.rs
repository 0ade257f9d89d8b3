use thiserror::Error;

/// Why a native connection failed. Only the display text leaves the
/// network side, as the data of the `error` event.
#[derive(Debug, Error)]
pub enum EventSourceError {
    #[error("invalid URL `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported URL scheme `{0}`")]
    UnsupportedScheme(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),

    #[error("unexpected content type `{0}`")]
    ContentType(String),

    #[error("stream read failed: {0}")]
    Stream(#[source] eventsource_stream::EventStreamError<reqwest::Error>),

    #[error("stream ended")]
    Ended,
}
