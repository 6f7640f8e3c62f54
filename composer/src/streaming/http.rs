//! Streaming handler that posts drafts to an AgentOS-style HTTP backend.
//!
//! A submission becomes `POST {endpoint}/agents/{id}/runs` (or `/teams/{id}/runs`) with a
//! multipart body: the `message` text, one `files` part per attachment, `stream=true`, and the
//! session id when one is configured. Response body chunks are forwarded as
//! [`AppEvent::ResponseChunk`] as they arrive.

use async_trait::async_trait;
use chat_composer_protocol::RunTarget;
use chat_composer_protocol::TransferPayload;
use chat_composer_protocol::payload::PayloadPart;
use reqwest::multipart::Form;
use reqwest::multipart::Part;
use url::Url;

use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;
use crate::error::SubmissionError;
use crate::streaming::StreamHandler;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpHandlerConfig {
    pub endpoint: Url,
    pub session_id: Option<String>,
}

pub struct HttpStreamHandler {
    config: HttpHandlerConfig,
    client: reqwest::Client,
    app_event_tx: AppEventSender,
}

impl HttpStreamHandler {
    pub fn new(config: HttpHandlerConfig, app_event_tx: AppEventSender) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            app_event_tx,
        }
    }

    fn runs_url(&self, target: &RunTarget) -> Result<Url, SubmissionError> {
        runs_url(&self.config.endpoint, target)
    }
}

#[async_trait]
impl StreamHandler for HttpStreamHandler {
    async fn send_payload(
        &self,
        target: &RunTarget,
        payload: TransferPayload,
    ) -> Result<(), SubmissionError> {
        let url = self.runs_url(target)?;
        let form = build_form(&payload, self.config.session_id.as_deref()).await?;
        tracing::debug!(
            "posting {} attachment(s), {} bytes, to {url}",
            payload.files.len(),
            payload.total_file_bytes()
        );

        let mut response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = match body.trim() {
                "" => status.canonical_reason().unwrap_or("request failed").to_string(),
                body => body.to_string(),
            };
            return Err(SubmissionError::Rejected {
                status: status.as_u16(),
                reason,
            });
        }

        let mut decoder = Utf8ChunkDecoder::default();
        while let Some(chunk) = response.chunk().await.map_err(transport_error)? {
            self.forward(decoder.push(&chunk));
        }
        self.forward(decoder.finish());
        Ok(())
    }
}

impl HttpStreamHandler {
    fn forward(&self, text: String) {
        if !text.is_empty() {
            self.app_event_tx.send(AppEvent::ResponseChunk(text));
        }
    }
}

/// Decodes a byte stream as UTF-8 across chunk boundaries. A character split between two chunks
/// is held back until its remaining bytes arrive; invalid sequences become U+FFFD.
#[derive(Debug, Default)]
struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    fn push(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut decoded = String::new();
        let mut start = 0;
        loop {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(text) => {
                    decoded.push_str(text);
                    start = self.pending.len();
                    break;
                }
                Err(err) => {
                    let valid = start + err.valid_up_to();
                    decoded.push_str(&String::from_utf8_lossy(&self.pending[start..valid]));
                    match err.error_len() {
                        Some(len) => {
                            decoded.push(char::REPLACEMENT_CHARACTER);
                            start = valid + len;
                        }
                        // Incomplete character at the end: wait for more bytes.
                        None => {
                            start = valid;
                            break;
                        }
                    }
                }
            }
        }
        self.pending = self.pending.split_off(start);
        decoded
    }

    /// Flush whatever is still held back once the stream has ended.
    fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }
}

/// `{endpoint}/agents/{id}/runs` (or `teams`), with the id percent-encoded as one path segment.
fn runs_url(endpoint: &Url, target: &RunTarget) -> Result<Url, SubmissionError> {
    let id = target.id();
    if matches!(id, "." | "..") {
        return Err(SubmissionError::InvalidTarget {
            kind: target.kind(),
            id: id.to_string(),
        });
    }
    let mut url = endpoint.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|()| SubmissionError::InvalidEndpoint(format!("{endpoint}: not a base URL")))?
        .pop_if_empty()
        .extend(target.path_segments());
    Ok(url)
}

async fn build_form(
    payload: &TransferPayload,
    session_id: Option<&str>,
) -> Result<Form, SubmissionError> {
    let mut form = Form::new();
    for part in payload.parts() {
        form = match part {
            PayloadPart::Text { field, value } => form.text(field, value.to_string()),
            PayloadPart::File { field, attachment } => {
                let bytes = tokio::fs::read(&attachment.path).await.map_err(|err| {
                    SubmissionError::ReadAttachment {
                        name: attachment.name.clone(),
                        reason: err.to_string(),
                    }
                })?;
                let part = Part::bytes(bytes)
                    .file_name(attachment.name.clone())
                    .mime_str(&attachment.mime_type.to_string())
                    .map_err(transport_error)?;
                form.part(field, part)
            }
        };
    }
    form = form.text("stream", "true");
    if let Some(session_id) = session_id {
        form = form.text("session_id", session_id.to_string());
    }
    Ok(form)
}

fn transport_error(err: reqwest::Error) -> SubmissionError {
    SubmissionError::Transport(err.to_string())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use chat_composer_protocol::Attachment;
    use chat_composer_protocol::AttachmentId;
    use chat_composer_protocol::ImageMimeType;
    use pretty_assertions::assert_eq;
    use tokio::io::AsyncReadExt;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc::unbounded_channel;

    fn url(text: &str) -> Url {
        Url::parse(text).expect("url")
    }

    fn attachment(name: &str, path: PathBuf) -> Attachment {
        Attachment {
            id: AttachmentId::new(0),
            name: name.to_string(),
            mime_type: ImageMimeType::Png,
            byte_size: 4,
            path,
        }
    }

    #[test]
    fn runs_url_appends_target_route() {
        let agent = RunTarget::Agent("dev".to_string());
        let team = RunTarget::Team("qa".to_string());

        assert_eq!(
            runs_url(&url("http://localhost:7777"), &agent).expect("join"),
            url("http://localhost:7777/agents/dev/runs")
        );
        assert_eq!(
            runs_url(&url("http://host/api/v1"), &team).expect("join"),
            url("http://host/api/v1/teams/qa/runs")
        );
        assert_eq!(
            runs_url(&url("http://host/api/"), &agent).expect("join"),
            url("http://host/api/agents/dev/runs")
        );
    }

    #[test]
    fn runs_url_keeps_special_ids_inside_one_segment() {
        let endpoint = url("http://host/api");
        let cases = [
            ("../admin", "/api/agents/..%2Fadmin/runs"),
            ("a/b", "/api/agents/a%2Fb/runs"),
            ("a?x=1", "/api/agents/a%3Fx=1/runs"),
            ("a#frag", "/api/agents/a%23frag/runs"),
        ];
        for (id, expected_path) in cases {
            let joined = runs_url(&endpoint, &RunTarget::Agent(id.to_string())).expect("join");
            assert_eq!(joined.path(), expected_path, "id {id:?}");
            assert_eq!(joined.query(), None, "id {id:?}");
            assert_eq!(joined.fragment(), None, "id {id:?}");
        }
    }

    #[test]
    fn runs_url_rejects_dot_segment_ids() {
        for id in [".", ".."] {
            assert_eq!(
                runs_url(&url("http://host/api"), &RunTarget::Team(id.to_string())),
                Err(SubmissionError::InvalidTarget {
                    kind: "team",
                    id: id.to_string(),
                })
            );
        }
    }

    #[test]
    fn decoder_holds_back_split_characters() {
        let mut decoder = Utf8ChunkDecoder::default();
        assert_eq!(decoder.push(b"a\xC3"), "a");
        assert_eq!(decoder.push(b"\xA9b"), "éb");
        // 3-byte character split over three chunks.
        assert_eq!(decoder.push(b"\xE4"), "");
        assert_eq!(decoder.push(b"\xB8"), "");
        assert_eq!(decoder.push(b"\xAD!"), "中!");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn decoder_replaces_invalid_bytes_and_flushes_leftovers() {
        let mut decoder = Utf8ChunkDecoder::default();
        assert_eq!(decoder.push(b"x\xFFy\xE4\xB8"), "x\u{FFFD}y");
        assert_eq!(decoder.finish(), "\u{FFFD}");
    }

    #[tokio::test]
    async fn unreadable_attachment_fails_before_any_request() {
        let dir = tempfile::tempdir().expect("tempdir");
        let payload = TransferPayload::new(
            "hi".to_string(),
            vec![attachment("gone.png", dir.path().join("gone.png"))],
        );

        let err = build_form(&payload, None).await.err();

        assert!(matches!(
            err,
            Some(SubmissionError::ReadAttachment { ref name, .. }) if name == "gone.png"
        ));
    }

    /// Accept one request, read it fully, and answer with `response`. Returns the raw request.
    async fn serve_once(listener: TcpListener, response: &'static [&'static [u8]]) -> String {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.expect("read");
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            if request_complete(&request) {
                break;
            }
        }
        for part in response {
            socket.write_all(part).await.expect("write response");
            socket.flush().await.expect("flush");
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        socket.shutdown().await.expect("shutdown");
        String::from_utf8_lossy(&request).into_owned()
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            return false;
        };
        let content_length = head.lines().find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        });
        match content_length {
            Some(len) => body.len() >= len,
            None => body.ends_with("0\r\n\r\n"),
        }
    }

    async fn send_to(
        response: &'static [&'static [u8]],
        payload: TransferPayload,
    ) -> (Result<(), SubmissionError>, String, Vec<AppEvent>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let server = tokio::spawn(serve_once(listener, response));
        let (tx, mut rx) = unbounded_channel::<AppEvent>();
        let handler = HttpStreamHandler::new(
            HttpHandlerConfig {
                endpoint: url(&format!("http://{addr}")),
                session_id: Some("session-1".to_string()),
            },
            AppEventSender::new(tx),
        );

        let result = handler
            .send_payload(&RunTarget::Agent("dev".to_string()), payload)
            .await;
        let request = server.await.expect("server task");
        drop(handler);
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        (result, request, events)
    }

    #[tokio::test]
    async fn posts_multipart_and_streams_response_chunks() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("shot.png");
        std::fs::write(&path, b"\x89PNG").expect("write image");
        let payload = TransferPayload::new("hello".to_string(), vec![attachment("shot.png", path)]);

        let (result, request, events) = send_to(
            &[b"HTTP/1.1 200 OK\r\ncontent-length: 11\r\nconnection: close\r\n\r\nhello world"],
            payload,
        )
        .await;

        assert_eq!(result, Ok(()));
        assert!(request.starts_with("POST /agents/dev/runs HTTP/1.1"));
        assert!(request.contains("name=\"message\"\r\n\r\nhello"));
        assert!(request.contains("name=\"files\"; filename=\"shot.png\""));
        assert!(request.contains("content-type: image/png") || request.contains("Content-Type: image/png"));
        assert!(request.contains("name=\"stream\"\r\n\r\ntrue"));
        assert!(request.contains("name=\"session_id\"\r\n\r\nsession-1"));
        let streamed: String = events
            .into_iter()
            .filter_map(|event| match event {
                AppEvent::ResponseChunk(chunk) => Some(chunk),
                _ => None,
            })
            .collect();
        assert_eq!(streamed, "hello world");
    }

    #[tokio::test]
    async fn character_split_across_chunks_is_streamed_intact() {
        let payload = TransferPayload::new("hello".to_string(), Vec::new());

        let (result, _request, events) = send_to(
            &[
                b"HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\nconnection: close\r\n\r\n",
                b"2\r\na\xC3\r\n",
                b"2\r\n\xA9b\r\n",
                b"0\r\n\r\n",
            ],
            payload,
        )
        .await;

        assert_eq!(result, Ok(()));
        let streamed: String = events
            .into_iter()
            .filter_map(|event| match event {
                AppEvent::ResponseChunk(chunk) => Some(chunk),
                _ => None,
            })
            .collect();
        assert_eq!(streamed, "aéb");
    }

    #[tokio::test]
    async fn error_status_is_reported_as_rejection() {
        let payload = TransferPayload::new("hello".to_string(), Vec::new());

        let (result, _request, events) = send_to(
            &[b"HTTP/1.1 422 Unprocessable Entity\r\ncontent-length: 13\r\nconnection: close\r\n\r\nno such agent"],
            payload,
        )
        .await;

        assert_eq!(
            result,
            Err(SubmissionError::Rejected {
                status: 422,
                reason: "no such agent".to_string(),
            })
        );
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn empty_error_body_falls_back_to_status_text() {
        let payload = TransferPayload::new("hello".to_string(), Vec::new());

        let (result, _request, _events) = send_to(
            &[b"HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"],
            payload,
        )
        .await;

        assert_eq!(
            result,
            Err(SubmissionError::Rejected {
                status: 503,
                reason: "Service Unavailable".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);
        let (tx, _rx) = unbounded_channel::<AppEvent>();
        let handler = HttpStreamHandler::new(
            HttpHandlerConfig {
                endpoint: url(&format!("http://{addr}")),
                session_id: None,
            },
            AppEventSender::new(tx),
        );

        let result = handler
            .send_payload(
                &RunTarget::Agent("dev".to_string()),
                TransferPayload::new("hi".to_string(), Vec::new()),
            )
            .await;

        assert!(matches!(result, Err(SubmissionError::Transport(_))));
    }
}
