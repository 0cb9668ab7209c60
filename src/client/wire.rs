use crate::ErrorDescriptor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct CheckRequest<'a> {
    pub text: &'a str,
}

/// Body returned by the grammar service. Every field is optional on the wire.
#[derive(Debug, Default, Deserialize)]
pub struct CheckResponse {
    #[serde(default)]
    pub errors: Vec<ErrorDescriptor>,
}

impl CheckResponse {
    pub fn into_errors(self) -> Vec<ErrorDescriptor> {
        self.errors
    }
}

/// Decode a response body into the error set it describes.
pub fn normalize(body: &[u8]) -> Result<Vec<ErrorDescriptor>, serde_json::Error> {
    let response: CheckResponse = serde_json::from_slice(body)?;
    Ok(response.into_errors())
}
