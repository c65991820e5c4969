use anyhow::{anyhow, Result};
use bioslide_common::{BioslideConfig, Message};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// A message in the chat-completions wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }
}

impl From<&Message> for ChatMessage {
    fn from(msg: &Message) -> Self {
        Self { role: msg.role.as_str().to_string(), content: msg.content.clone() }
    }
}

/// One item read off a streamed completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatDelta {
    Text(String),
    Done,
    Failed(String),
}

/// Minimal OpenAI-compatible Chat Completions client.
pub struct OpenAiModelClient {
    api_key: String,
    base_url: String,
    pub model: String,
    http: reqwest::Client,
}

impl OpenAiModelClient {
    pub fn new_with_model(api_key: String, model: String) -> Self {
        Self {
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
            model,
            http: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &BioslideConfig) -> Option<Self> {
        let api_key = config.api_key.clone()?;
        let mut client = Self::new_with_model(api_key, config.model.clone());
        client.base_url = config.base_url.trim_end_matches('/').to_string();
        Some(client)
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn request(&self, body: &serde_json::Value) -> reqwest::RequestBuilder {
        tracing::debug!(
            "chat request body: {}",
            serde_json::to_string_pretty(body).unwrap_or_default()
        );
        let mut req = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json");
        if let Ok(project) = std::env::var("OPENAI_PROJECT") {
            if !project.is_empty() {
                req = req.header("OpenAI-Project", project);
            }
        }
        if let Ok(org) = std::env::var("OPENAI_ORG") {
            if !org.is_empty() {
                req = req.header("OpenAI-Organization", org);
            }
        }
        req.json(body)
    }

    async fn send(&self, body: serde_json::Value) -> Result<reqwest::Response> {
        let resp = self.request(&body).send().await.map_err(|e| anyhow!(e))?;

        let status = resp.status();
        tracing::debug!("chat response status: {status}");

        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let msg = format!("openai http {status}: {text}");
            tracing::warn!("{msg}");
            return Err(anyhow!(msg));
        }
        Ok(resp)
    }

    /// Run one non-streaming completion and return the assistant text.
    pub async fn complete_chat(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
        });
        let resp = self.send(body).await?;
        let value: serde_json::Value = resp.json().await?;
        value["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("completion response has no message content"))
    }

    /// Stream a completion. The receiver yields text deltas followed by
    /// exactly one `Done` or `Failed`.
    pub async fn stream_chat(&self, messages: Vec<ChatMessage>) -> Result<mpsc::Receiver<ChatDelta>> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": true,
        });
        let resp = self.send(body).await?;

        let (tx, rx) = mpsc::channel::<ChatDelta>(64);
        tokio::spawn(pump_sse(resp.bytes_stream(), tx));
        Ok(rx)
    }
}

/// Forward parsed SSE frames from `stream` to `tx` until `[DONE]`, an
/// error payload, or the end of the body. A body that ends before
/// `[DONE]` is a failure, not a complete reply.
async fn pump_sse<S, B, E>(stream: S, tx: mpsc::Sender<ChatDelta>)
where
    S: futures_util::Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    use futures_util::StreamExt;
    let mut buf = Vec::new();
    let mut stream = Box::pin(stream);
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => {
                buf.extend_from_slice(bytes.as_ref());
                for frame in drain_sse_frames(&mut buf) {
                    let (delta, last) = match frame {
                        SseFrame::Delta(text) => (ChatDelta::Text(text), false),
                        SseFrame::Done => (ChatDelta::Done, true),
                        SseFrame::Error(message) => {
                            tracing::warn!("stream reported error: {message}");
                            (ChatDelta::Failed(message), true)
                        }
                    };
                    if tx.send(delta).await.is_err() || last {
                        return;
                    }
                }
            }
            Err(e) => {
                tracing::warn!("stream chunk error: {e}");
                let _ = tx.send(ChatDelta::Failed(e.to_string())).await;
                return;
            }
        }
    }
    tracing::warn!("stream ended before [DONE]");
    let _ = tx.send(ChatDelta::Failed("stream ended before [DONE]".to_string())).await;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SseFrame {
    Delta(String),
    Done,
    Error(String),
}

/// Position and length of the first blank line ending an SSE block.
fn frame_end(buf: &[u8]) -> Option<(usize, usize)> {
    let lf = memchr::memmem::find(buf, b"\n\n").map(|pos| (pos, 2));
    let crlf = memchr::memmem::find(buf, b"\r\n\r\n").map(|pos| (pos, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if b.0 < a.0 { b } else { a }),
        (a, b) => a.or(b),
    }
}

/// Pull every complete Server-Sent Events block (terminated by a blank
/// line) out of `buf`, leaving any trailing partial block in place.
pub(crate) fn drain_sse_frames(buf: &mut Vec<u8>) -> Vec<SseFrame> {
    let mut frames = Vec::new();
    while let Some((pos, len)) = frame_end(buf) {
        let part = buf.drain(..pos + len).collect::<Vec<u8>>();
        let Ok(text) = String::from_utf8(part) else {
            continue;
        };
        for line in text.lines() {
            let Some(rest) = line.trim_start().strip_prefix("data:") else {
                continue;
            };
            let rest = rest.strip_prefix(' ').unwrap_or(rest).trim_end();
            if rest == "[DONE]" {
                frames.push(SseFrame::Done);
                continue;
            }
            match serde_json::from_str::<serde_json::Value>(rest) {
                Ok(v) => {
                    if let Some(error) = v.get("error") {
                        let message = error["message"]
                            .as_str()
                            .map(str::to_string)
                            .unwrap_or_else(|| error.to_string());
                        frames.push(SseFrame::Error(message));
                    } else if let Some(delta) = v["choices"][0]["delta"]["content"].as_str() {
                        frames.push(SseFrame::Delta(delta.to_string()));
                    }
                }
                Err(_) => tracing::warn!("SSE JSON parse error on: {rest}"),
            }
        }
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_complete_frames_and_keeps_partial_tail() {
        let mut buf = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Բարև\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\" ձեզ\"}}]}\n\n",
            "data: {\"choi"
        )
        .as_bytes()
        .to_vec();

        let frames = drain_sse_frames(&mut buf);
        assert_eq!(
            frames,
            vec![SseFrame::Delta("Բարև".into()), SseFrame::Delta(" ձեզ".into())]
        );
        assert_eq!(buf, b"data: {\"choi".to_vec());
    }

    #[test]
    fn done_marker_is_reported() {
        let mut buf = b"data: [DONE]\n\n".to_vec();
        assert_eq!(drain_sse_frames(&mut buf), vec![SseFrame::Done]);
        assert!(buf.is_empty());
    }

    #[test]
    fn malformed_json_lines_are_skipped() {
        let mut buf = b"data: not json\n\n".to_vec();
        assert!(drain_sse_frames(&mut buf).is_empty());
    }

    #[test]
    fn crlf_blocks_and_unspaced_data_are_accepted() {
        let mut buf = b"data:{\"choices\":[{\"delta\":{\"content\":\"Komitas\"}}]}\r\n\r\ndata:[DONE]\r\n\r\n".to_vec();
        assert_eq!(
            drain_sse_frames(&mut buf),
            vec![SseFrame::Delta("Komitas".into()), SseFrame::Done]
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn error_payload_becomes_an_error_frame() {
        let mut buf = b"data: {\"error\":{\"message\":\"overloaded\"}}\n\n".to_vec();
        assert_eq!(drain_sse_frames(&mut buf), vec![SseFrame::Error("overloaded".into())]);
    }

    async fn collect(mut rx: mpsc::Receiver<ChatDelta>) -> Vec<ChatDelta> {
        let mut out = Vec::new();
        while let Some(delta) = rx.recv().await {
            out.push(delta);
        }
        out
    }

    /// Serve one streamed response from `body`, then close the connection.
    async fn serve_once(body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            // Drain headers and the JSON body before answering.
            while !(memchr::memmem::find(&request, b"\r\n\r\n").is_some() && request.ends_with(b"}")) {
                match socket.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&chunk[..n]),
                }
            }
            let head = "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n";
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(body.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}/v1")
    }

    fn client_for(base_url: String) -> OpenAiModelClient {
        let config = BioslideConfig {
            api_key: Some("k".into()),
            base_url,
            ..BioslideConfig::default()
        };
        OpenAiModelClient::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn body_cut_before_done_is_a_failure() {
        let base_url = serve_once(
            "data: {\"choices\":[{\"delta\":{\"content\":\"SLIDES_JSON: {\\\"slides\\\":[{\\\"id\\\":\\\"1\\\"\"}}]}\n\n",
        )
        .await;
        let rx = client_for(base_url).stream_chat(vec![ChatMessage::system("s")]).await.unwrap();
        let deltas = collect(rx).await;
        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0], ChatDelta::Text("SLIDES_JSON: {\"slides\":[{\"id\":\"1\"".into()));
        assert!(matches!(deltas[1], ChatDelta::Failed(_)));
    }

    #[tokio::test]
    async fn done_marker_completes_the_stream() {
        let base_url = serve_once(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\ndata: [DONE]\n\n",
        )
        .await;
        let rx = client_for(base_url).stream_chat(vec![ChatMessage::system("s")]).await.unwrap();
        assert_eq!(collect(rx).await, vec![ChatDelta::Text("Hi".into()), ChatDelta::Done]);
    }

    #[test]
    fn config_without_key_yields_no_client() {
        assert!(OpenAiModelClient::from_config(&BioslideConfig::default()).is_none());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = BioslideConfig {
            api_key: Some("k".into()),
            base_url: "http://localhost:8080/v1/".into(),
            ..BioslideConfig::default()
        };
        let client = OpenAiModelClient::from_config(&config).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");
    }
}
