use super::{SummaryError, TextGenerator};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

const TOP_P: f32 = 0.95;
const TOP_K: u32 = 40;
const MAX_OUTPUT_TOKENS: u32 = 8192;

/// Shape the model must answer in: projects, each with its issues
pub fn report_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "projects": {
                "type": "ARRAY",
                "description": "List of projects",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": {"type": "STRING", "description": "Title of the linear project"},
                        "issues": {
                            "type": "ARRAY",
                            "description": "List of linear project issues",
                            "items": {
                                "type": "OBJECT",
                                "properties": {
                                    "status": {
                                        "type": "STRING",
                                        "description": "Status of the issue",
                                        "enum": [":todo:", ":progress:", ":check:", ":canceled:"]
                                    },
                                    "label": {"type": "STRING", "description": "Title of the issue"},
                                    "link": {"type": "STRING", "description": "Github, Slack or Linear link", "nullable": true},
                                    "summary": {
                                        "type": "STRING",
                                        "description": "Optional short note on progress or roadblocks, empty if nothing to add",
                                        "nullable": true
                                    }
                                },
                                "required": ["status", "label"]
                            }
                        }
                    }
                }
            }
        }
    })
}

/// `generateContent` request body
pub fn request_body(prompt: &str, content: &str, temperature: f32) -> serde_json::Value {
    serde_json::json!({
        "systemInstruction": {"parts": [{"text": prompt}]},
        "contents": [{"role": "user", "parts": [{"text": content}]}],
        "generationConfig": {
            "temperature": temperature,
            "topP": TOP_P,
            "topK": TOP_K,
            "maxOutputTokens": MAX_OUTPUT_TOKENS,
            "responseMimeType": "application/json",
            "responseSchema": report_schema()
        }
    })
}

/// Text of the first candidate's first part
pub fn response_text(response: &serde_json::Value) -> Option<&str> {
    response["candidates"]
        .as_array()
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate["content"]["parts"].as_array())
        .and_then(|parts| parts.first())
        .and_then(|part| part["text"].as_str())
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, SummaryError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(SummaryError::MissingApiKey("Gemini"));
        }
        let model = model.into();
        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            model: if model.trim().is_empty() {
                DEFAULT_MODEL.to_string()
            } else {
                model
            },
            base_url: GEMINI_BASE_URL.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str, content: &str, temperature: f32) -> Result<String, SummaryError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request_body(prompt, content, temperature))
            .send()
            .await?;

        if !resp.status().is_success() {
            let code = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(SummaryError::Status {
                service: "Gemini",
                code,
                body,
            });
        }

        let api_resp: serde_json::Value = resp.json().await?;
        response_text(&api_resp)
            .map(str::to_string)
            .ok_or(SummaryError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_carries_generation_settings() {
        let body = request_body("Be brief", "{\"data\":{}}", 0.4);
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be brief");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "{\"data\":{}}");
        let config = &body["generationConfig"];
        assert_eq!(config["topK"], 40);
        assert_eq!(config["maxOutputTokens"], 8192);
        assert_eq!(config["responseMimeType"], "application/json");
        assert!((config["temperature"].as_f64().unwrap() - 0.4).abs() < 1e-6);
        assert_eq!(
            config["responseSchema"]["properties"]["projects"]["items"]["properties"]["issues"]["items"]["properties"]["status"]["enum"][2],
            ":check:"
        );
    }

    #[test]
    fn extracts_first_candidate_text() {
        let response = serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "{\"projects\":[]}"}], "role": "model"}}]
        });
        assert_eq!(response_text(&response), Some("{\"projects\":[]}"));
        assert_eq!(response_text(&serde_json::json!({"candidates": []})), None);
    }

    #[test]
    fn blank_model_falls_back_to_default() {
        let client = GeminiClient::new("key", "").unwrap();
        assert_eq!(client.model(), DEFAULT_MODEL);
        assert!(matches!(GeminiClient::new("", "m"), Err(SummaryError::MissingApiKey("Gemini"))));
    }
}
