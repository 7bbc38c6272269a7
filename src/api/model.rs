use serde::{Deserialize, Serialize};

/// Fallback text shown when the assistant answers without a `response`.
pub const NO_RESPONSE: &str = "No response received.";

#[derive(Serialize, Debug)]
pub struct AiRequest<'a> {
    pub prompt: &'a str,
}

#[derive(Deserialize, Debug, Default)]
pub struct AiResponse {
    #[serde(default)]
    pub response: Option<String>,
}

impl AiResponse {
    pub fn into_text(self) -> String {
        self.response
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| NO_RESPONSE.to_string())
    }
}
