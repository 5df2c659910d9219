use thiserror::Error;

/// Failures while turning uploaded bytes into text or rows.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("document is not valid UTF-8 text")]
    Decode(#[from] std::string::FromUtf8Error),

    #[error("failed to read {format} archive: {source}")]
    Archive {
        format: &'static str,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("{format} archive is missing {entry}")]
    MissingEntry {
        format: &'static str,
        entry: &'static str,
    },

    #[error("{0} contains no extractable text")]
    NoText(&'static str),

    #[error("failed to read PDF: {0}")]
    Pdf(String),

    #[error("failed to read spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error while reading document: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures talking to one of the third-party search/content APIs.
///
/// Every variant is terminal for the request that produced it.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{service}: credential {env} is not configured")]
    MissingCredential { service: &'static str, env: String },

    #[error("{service} returned HTTP {status}")]
    Http { service: &'static str, status: u16 },

    #[error("{service} request failed: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },

    #[error("{service} returned an unexpected payload: {message}")]
    Malformed {
        service: &'static str,
        message: String,
    },

    #[error("{service} returned no results")]
    Empty { service: &'static str },
}

impl ApiError {
    pub fn service(&self) -> &'static str {
        match self {
            Self::MissingCredential { service, .. }
            | Self::Http { service, .. }
            | Self::Transport { service, .. }
            | Self::Malformed { service, .. }
            | Self::Empty { service } => service,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
