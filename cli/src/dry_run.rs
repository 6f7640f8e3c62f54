use async_trait::async_trait;
use chat_composer::AppEvent;
use chat_composer::AppEventSender;
use chat_composer::StreamHandler;
use chat_composer::SubmissionError;
use chat_composer_protocol::RunTarget;
use chat_composer_protocol::TransferPayload;
use serde_json::json;

/// Stands in for the HTTP handler with `--dry-run`: the payload is summarized as one JSON line
/// and echoed back as the response.
pub struct DryRunHandler {
    app_event_tx: AppEventSender,
}

impl DryRunHandler {
    pub fn new(app_event_tx: AppEventSender) -> Self {
        Self { app_event_tx }
    }
}

#[async_trait]
impl StreamHandler for DryRunHandler {
    async fn send_payload(
        &self,
        target: &RunTarget,
        payload: TransferPayload,
    ) -> Result<(), SubmissionError> {
        let summary = payload_summary(target, &payload);
        self.app_event_tx
            .send(AppEvent::ResponseChunk(summary.to_string()));
        Ok(())
    }
}

fn payload_summary(target: &RunTarget, payload: &TransferPayload) -> serde_json::Value {
    let files: Vec<_> = payload
        .files
        .iter()
        .map(|file| {
            json!({
                "name": file.name,
                "mime_type": file.mime_type,
                "byte_size": file.byte_size,
            })
        })
        .collect();
    json!({
        "target": target,
        "path": target.runs_path(),
        "message": payload.message,
        "files": files,
    })
}
