//! Retrieval of rule documents served over HTTP(S).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("error {status} when fetching {url}")]
    Status { url: String, status: u16 },
}

/// Whether `location` names a remote document rather than a local path.
pub fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// GET `url` and return the body. Any status above 299 is an error.
pub fn fetch(url: &str) -> Result<Vec<u8>, FetchError> {
    let client = reqwest::blocking::Client::new();
    fetch_with(&client, url)
}

pub(crate) fn fetch_with(
    client: &reqwest::blocking::Client,
    url: &str,
) -> Result<Vec<u8>, FetchError> {
    let request_error = |source| FetchError::Request {
        url: url.to_string(),
        source,
    };

    let response = client.get(url).send().map_err(request_error)?;
    let status = response.status().as_u16();
    if status > 299 {
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }

    let body = response.bytes().map_err(request_error)?;
    tracing::debug!(url, bytes = body.len(), "fetched rule document");
    Ok(body.to_vec())
}
