use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Hosted generative-text model behind the chat and planner endpoints.
#[async_trait]
pub trait TextEngine: Send + Sync {
    /// Sends the ordered prompt parts as one single-turn request and returns
    /// the model's text.
    async fn generate(&self, parts: &[String]) -> Result<String, EngineError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream returned status {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("upstream response contained no text")]
    EmptyReply,
}

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Gemini `generateContent` client.
pub struct GeminiEngine {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

fn request_body(parts: &[String]) -> GenerateRequest<'_> {
    GenerateRequest {
        contents: vec![Content {
            role: "user",
            parts: parts.iter().map(|p| Part { text: p }).collect(),
        }],
    }
}

fn reply_text(response: GenerateResponse) -> Result<String, EngineError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.is_empty() {
        return Err(EngineError::EmptyReply);
    }
    Ok(text)
}

impl GeminiEngine {
    pub fn new(api_key: &str, base_url: &str, model: &str) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder().build()?;
        let model = model.trim_start_matches("models/");
        Ok(Self {
            client,
            endpoint: format!("{}/models/{}:generateContent", base_url.trim_end_matches('/'), model),
            api_key: api_key.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TextEngine for GeminiEngine {
    async fn generate(&self, parts: &[String]) -> Result<String, EngineError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(parts))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        reply_text(response.json::<GenerateResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves exactly one canned HTTP response, then hangs up.
    async fn one_shot_server(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{addr}/v1beta")
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        request.len() >= header_end + 4 + length
    }

    #[tokio::test]
    async fn non_success_status_is_upstream_error() {
        let base = one_shot_server("429 Too Many Requests", r#"{"error":"quota exhausted"}"#).await;
        let engine = GeminiEngine::new("k", &base, "gemini-2.0-flash").unwrap();

        let err = engine.generate(&["hello".to_string()]).await.unwrap_err();
        match err {
            EngineError::Upstream { status, body } => {
                assert_eq!(status, 429);
                assert!(body.contains("quota exhausted"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn successful_reply_is_extracted() {
        let base = one_shot_server("200 OK", r#"{"candidates":[{"content":{"parts":[{"text":"Rest well."}]}}]}"#).await;
        let engine = GeminiEngine::new("k", &base, "gemini-2.0-flash").unwrap();
        assert_eq!(engine.generate(&["hi".to_string()]).await.unwrap(), "Rest well.");
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let engine = GeminiEngine::new("k", &format!("http://{addr}"), "gemini-2.0-flash").unwrap();
        let err = engine.generate(&["hello".to_string()]).await.unwrap_err();
        assert!(matches!(err, EngineError::Transport(_)));
    }

    #[test]
    fn endpoint_accepts_prefixed_model_names() {
        let engine = GeminiEngine::new("k", "https://example.test/v1beta/", "models/gemini-2.0-flash").unwrap();
        assert_eq!(
            engine.endpoint(),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn request_keeps_part_order() {
        let parts = vec!["system".to_string(), "User: hello".to_string()];
        let body = serde_json::to_value(request_body(&parts)).unwrap();
        assert_eq!(
            body,
            json!({"contents": [{"role": "user", "parts": [{"text": "system"}, {"text": "User: hello"}]}]})
        );
    }

    #[test]
    fn reply_joins_first_candidate_parts() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [
                {"content": {"parts": [{"text": "Eat "}, {"text": "greens."}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(reply_text(response).unwrap(), "Eat greens.");
    }

    #[test]
    fn blocked_reply_is_empty() {
        let response: GenerateResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();
        assert!(matches!(reply_text(response), Err(EngineError::EmptyReply)));
    }
}
