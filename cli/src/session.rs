//! Line-oriented front end for a [`ChatComposer`].
//!
//! Input lines are parsed into [`Command`]s and applied to the composer; [`AppEvent`]s coming back
//! from submissions in flight are rendered as they arrive. Normal output (the draft listing and
//! streamed responses) goes to `out`, notifications go to `err`.

use std::io;
use std::io::Write;
use std::path::PathBuf;

use chat_composer::AppEvent;
use chat_composer::AppEventSender;
use chat_composer::ChatComposer;
use chat_composer::normalize_pasted_path;
use chat_composer_protocol::FileCandidate;
use chat_composer_protocol::ImageMimeType;
use chat_composer_protocol::Selection;

use crate::command::Command;
use crate::command::HELP;
use crate::command::parse_command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Session<O, E> {
    composer: ChatComposer,
    app_event_tx: AppEventSender,
    out: O,
    err: E,
}

impl<O: Write, E: Write> Session<O, E> {
    pub fn new(composer: ChatComposer, app_event_tx: AppEventSender, out: O, err: E) -> Self {
        Self {
            composer,
            app_event_tx,
            out,
            err,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.composer.is_busy()
    }

    pub fn handle_line(&mut self, line: &str) -> io::Result<Flow> {
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(message) => {
                writeln!(self.err, "error: {message}")?;
                return Ok(Flow::Continue);
            }
        };

        match command {
            Command::Quit => return Ok(Flow::Quit),
            Command::Help => writeln!(self.out, "{HELP}")?,
            Command::Agent(id) => self.select(Selection::agent(id))?,
            Command::Team(id) => self.select(Selection::team(id))?,
            Command::List => self.list()?,
            _ if !self.composer.input_enabled() => {
                writeln!(
                    self.err,
                    "error: select an agent or team first (/agent <id> or /team <id>)"
                )?;
            }
            Command::Text(text) => match pasted_image_path(&text) {
                Some(path) => self.attach(&[path])?,
                None => {
                    if !self.composer.text().is_empty() {
                        self.composer.insert_str("\n");
                    }
                    self.composer.insert_str(&text);
                }
            },
            Command::Attach(paths) => self.attach(&paths)?,
            Command::Remove(position) => match self.composer.remove_attachment(position - 1) {
                Some(removed) => writeln!(self.out, "removed {}", removed.name)?,
                None => writeln!(self.err, "error: no attachment {position}")?,
            },
            Command::Clear => {
                self.composer.clear_attachments();
            }
            Command::Send => self.send()?,
        }
        Ok(Flow::Continue)
    }

    pub fn handle_event(&mut self, event: AppEvent) -> io::Result<()> {
        match event {
            AppEvent::Notify(notification) => writeln!(self.err, "error: {notification}")?,
            AppEvent::ResponseChunk(chunk) => {
                write!(self.out, "{chunk}")?;
                self.out.flush()?;
            }
            AppEvent::SubmissionFinished { succeeded } => {
                self.composer.set_busy(false);
                if succeeded {
                    writeln!(self.out)?;
                }
            }
        }
        Ok(())
    }

    fn select(&mut self, selection: Selection) -> io::Result<()> {
        self.composer.set_selection(selection);
        if let Some(target) = self.composer.selection().target() {
            writeln!(self.out, "sending to {}", target.runs_path())?;
        }
        Ok(())
    }

    fn attach(&mut self, paths: &[PathBuf]) -> io::Result<()> {
        let mut candidates = Vec::with_capacity(paths.len());
        for path in paths {
            match FileCandidate::from_path(path) {
                Ok(candidate) => candidates.push(candidate),
                Err(err) => writeln!(self.err, "error: {}: {err}", path.display())?,
            }
        }
        if candidates.is_empty() {
            return Ok(());
        }
        // Rejections are reported through the event channel.
        let outcome = self.composer.attach(candidates);
        if outcome.accepted > 0 {
            writeln!(
                self.out,
                "attached {} file(s), {} staged",
                outcome.accepted,
                self.composer.attachments().len()
            )?;
        }
        Ok(())
    }

    fn send(&mut self) -> io::Result<()> {
        if self.composer.is_busy() {
            writeln!(self.err, "error: a message is still being sent")?;
            return Ok(());
        }
        match self.composer.submit() {
            Some(pending) => {
                self.composer.set_busy(true);
                pending.spawn(self.app_event_tx.clone());
            }
            None => writeln!(self.err, "error: nothing to send")?,
        }
        Ok(())
    }

    fn list(&mut self) -> io::Result<()> {
        match self.composer.selection().target() {
            Some(target) => writeln!(self.out, "to: {}", target.runs_path())?,
            None => writeln!(self.out, "to: (no agent or team selected)")?,
        }
        writeln!(self.out, "text: {:?}", self.composer.text())?;
        let previews = self.composer.previews();
        for (position, attachment) in self.composer.attachments().iter().enumerate() {
            let preview = previews
                .iter()
                .find(|handle| handle.attachment_id == attachment.id)
                .map(|handle| handle.url.as_str())
                .unwrap_or("-");
            writeln!(
                self.out,
                "  {}. {} ({}, {} bytes) {preview}",
                position + 1,
                attachment.name,
                attachment.mime_type,
                attachment.byte_size,
            )?;
        }
        Ok(())
    }
}

/// A line that is nothing but the path of an existing image file (as a terminal produces when a
/// file is dragged in) is attached rather than typed.
fn pasted_image_path(text: &str) -> Option<PathBuf> {
    let path = normalize_pasted_path(text)?;
    (ImageMimeType::from_extension(&path).is_some() && path.is_file()).then_some(path)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::dry_run::DryRunHandler;
    use chat_composer::BlobUrlRegistry;
    use chat_composer::ChatComposerParams;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::sync::mpsc::unbounded_channel;

    type TestSession = Session<Vec<u8>, Vec<u8>>;

    fn session(selection: Selection) -> (TestSession, UnboundedReceiver<AppEvent>) {
        let (tx, rx) = unbounded_channel();
        let app_event_tx = AppEventSender::new(tx);
        let composer = ChatComposer::new(ChatComposerParams {
            notifier: Arc::new(app_event_tx.clone()),
            handler: Arc::new(DryRunHandler::new(app_event_tx.clone())),
            preview_registry: Box::new(BlobUrlRegistry::new()),
            selection,
        });
        (
            Session::new(composer, app_event_tx, Vec::new(), Vec::new()),
            rx,
        )
    }

    fn stdout(session: &TestSession) -> String {
        String::from_utf8_lossy(&session.out).into_owned()
    }

    fn stderr(session: &TestSession) -> String {
        String::from_utf8_lossy(&session.err).into_owned()
    }

    fn line(session: &mut TestSession, input: &str) {
        assert_eq!(session.handle_line(input).expect("io"), Flow::Continue);
    }

    async fn settle(session: &mut TestSession, rx: &mut UnboundedReceiver<AppEvent>) {
        while session.is_busy() {
            let event = rx.recv().await.expect("event");
            session.handle_event(event).expect("io");
        }
    }

    #[test]
    fn input_requires_a_selection() {
        let (mut session, _rx) = session(Selection::default());

        line(&mut session, "hello");

        assert_eq!(session.composer.text(), "");
        assert!(stderr(&session).contains("select an agent or team first"));

        line(&mut session, "/agent dev");
        line(&mut session, "hello");
        assert_eq!(session.composer.text(), "hello");
        assert!(stdout(&session).contains("sending to agents/dev/runs"));
    }

    #[test]
    fn text_lines_are_joined_with_newlines() {
        let (mut session, _rx) = session(Selection::agent("dev"));

        line(&mut session, "first");
        line(&mut session, "second");

        assert_eq!(session.composer.text(), "first\nsecond");
    }

    #[tokio::test]
    async fn send_clears_the_draft_and_streams_the_response() {
        let (mut session, mut rx) = session(Selection::team("qa"));
        line(&mut session, "hello");

        line(&mut session, "");

        assert_eq!(session.composer.text(), "");
        assert!(session.is_busy());
        settle(&mut session, &mut rx).await;
        let out = stdout(&session);
        assert!(out.contains("\"path\":\"teams/qa/runs\""));
        assert!(out.contains("\"message\":\"hello\""));
        assert_eq!(stderr(&session), "");
    }

    #[tokio::test]
    async fn second_send_while_busy_is_refused() {
        let (mut session, mut rx) = session(Selection::agent("dev"));
        line(&mut session, "one");
        line(&mut session, "/send");
        line(&mut session, "two");

        line(&mut session, "/send");

        assert!(stderr(&session).contains("still being sent"));
        assert_eq!(session.composer.text(), "two");
        settle(&mut session, &mut rx).await;
        line(&mut session, "/send");
        assert_eq!(session.composer.text(), "");
    }

    #[test]
    fn blank_draft_has_nothing_to_send() {
        let (mut session, _rx) = session(Selection::agent("dev"));

        line(&mut session, "/send");

        assert!(stderr(&session).contains("nothing to send"));
        assert!(!session.is_busy());
    }

    #[test]
    fn attach_list_and_remove() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in ["a.png", "b.jpg"] {
            std::fs::write(dir.path().join(name), b"img").expect("write image");
        }
        let (mut session, _rx) = session(Selection::agent("dev"));

        let input = format!(
            "/attach {} {}",
            dir.path().join("a.png").display(),
            dir.path().join("b.jpg").display()
        );
        line(&mut session, &input);
        assert_eq!(session.composer.attachments().len(), 2);

        line(&mut session, "/list");
        let out = stdout(&session);
        assert!(out.contains("1. a.png (image/png, 3 bytes) blob:"));
        assert!(out.contains("2. b.jpg (image/jpeg, 3 bytes) blob:"));

        line(&mut session, "/remove 1");
        assert_eq!(session.composer.attachments()[0].name, "b.jpg");
        line(&mut session, "/remove 5");
        assert!(stderr(&session).contains("no attachment 5"));

        line(&mut session, "/clear");
        assert!(session.composer.attachments().is_empty());
        assert!(session.composer.previews().is_empty());
    }

    #[test]
    fn rejected_files_are_reported_as_notifications() {
        let dir = tempfile::tempdir().expect("tempdir");
        let notes = dir.path().join("notes.txt");
        std::fs::write(&notes, "hi").expect("write");
        let (mut session, mut rx) = session(Selection::agent("dev"));

        let missing = dir.path().join("missing.png");
        line(
            &mut session,
            &format!("/attach {} {}", notes.display(), missing.display()),
        );

        assert!(session.composer.attachments().is_empty());
        assert!(stderr(&session).contains("missing.png"));
        let event = rx.try_recv().expect("notification");
        session.handle_event(event).expect("io");
        assert!(stderr(&session).contains("error: Unsupported file type: notes.txt"));
    }

    #[test]
    fn pasted_image_path_is_attached_instead_of_typed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let image = dir.path().join("my shot.png");
        std::fs::write(&image, b"img").expect("write image");
        let (mut session, _rx) = session(Selection::agent("dev"));

        line(&mut session, &format!("'{}'", image.display()));
        line(&mut session, "shot.png is attached");
        line(&mut session, &dir.path().join("absent.png").display().to_string());

        assert_eq!(session.composer.attachments().len(), 1);
        assert_eq!(session.composer.attachments()[0].name, "my shot.png");
        assert_eq!(
            session.composer.text(),
            format!("shot.png is attached\n{}", dir.path().join("absent.png").display())
        );
    }

    #[test]
    fn quit_stops_the_session() {
        let (mut session, _rx) = session(Selection::default());
        assert_eq!(session.handle_line("/quit").expect("io"), Flow::Quit);
    }
}
