use tokio::sync::mpsc::UnboundedSender;

use crate::app_event::AppEvent;
use crate::notification::Notification;
use crate::notification::NotificationSink;

/// Cloneable handle for posting [`AppEvent`]s to the front end's event loop.
#[derive(Clone, Debug)]
pub struct AppEventSender {
    app_event_tx: UnboundedSender<AppEvent>,
}

impl AppEventSender {
    pub fn new(app_event_tx: UnboundedSender<AppEvent>) -> Self {
        Self { app_event_tx }
    }

    /// Send an event, logging (rather than failing) when the receiver is gone.
    pub fn send(&self, event: AppEvent) {
        if let Err(err) = self.app_event_tx.send(event) {
            tracing::error!("failed to send event: {err}");
        }
    }
}

impl NotificationSink for AppEventSender {
    fn notify(&self, notification: Notification) {
        self.send(AppEvent::Notify(notification));
    }
}
