//! Response body decoding.

use crate::api::client::FetchError;
use serde::de::DeserializeOwned;

/// Parse a raw response body into `T`.
///
/// Any shape mismatch is a [`FetchError::Decode`], never a transport failure.
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T, FetchError> {
    serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))
}
