use headshot_core::chat::ChatLog;
use headshot_core::edit_history::EditHistory;
use headshot_core::generation::HeadshotStyle;
use headshot_core::image::ImageRef;
use headshot_core::{HeadshotError, Identity, Result};
use serde::Serialize;
use uuid::Uuid;

/// Per-user studio state: the uploaded selfie, the edit history of generated
/// frames and the chat transcript.
///
/// Each outgoing request takes a sequence token. `reset` advances the
/// sequence, so a response for an older token is recognised as stale.
#[derive(Debug)]
pub struct StudioSession {
    id: String,
    identity: Identity,
    history: EditHistory<ImageRef>,
    chat: ChatLog,
    base_image: Option<ImageRef>,
    style: Option<HeadshotStyle>,
    is_processing: bool,
    request_seq: u64,
}

/// Read-only view handed to callers after every operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioSnapshot {
    pub session_id: String,
    pub current: Option<ImageRef>,
    pub cursor: Option<usize>,
    pub frame_count: usize,
    pub can_undo: bool,
    pub can_redo: bool,
    pub is_processing: bool,
    pub style: Option<HeadshotStyle>,
}

impl StudioSession {
    pub fn new(identity: Identity) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            identity,
            history: EditHistory::new(),
            chat: ChatLog::new(),
            base_image: None,
            style: None,
            is_processing: false,
            request_seq: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn history(&self) -> &EditHistory<ImageRef> {
        &self.history
    }

    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    pub fn base_image(&self) -> Option<&ImageRef> {
        self.base_image.as_ref()
    }

    pub fn current_image(&self) -> Option<&ImageRef> {
        self.history.current()
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    /// Marks a request in flight and logs the user's side of it.
    pub fn begin_request(&mut self, user_text: &str) -> Result<u64> {
        if self.is_processing {
            return Err(HeadshotError::Busy);
        }
        self.is_processing = true;
        self.request_seq += 1;
        self.chat.push_user(user_text);
        Ok(self.request_seq)
    }

    /// Closes the request for `token`. Fails with `StaleResponse` if the
    /// session moved on while it was in flight.
    pub fn finish_request(&mut self, token: u64) -> Result<()> {
        if token != self.request_seq {
            return Err(HeadshotError::StaleResponse { token });
        }
        self.is_processing = false;
        Ok(())
    }

    /// A new headshot replaces the whole history.
    pub fn accept_headshot(
        &mut self,
        selfie: ImageRef,
        style: HeadshotStyle,
        image: ImageRef,
        note: Option<String>,
    ) {
        self.base_image = Some(selfie);
        self.style = Some(style);
        self.history.reset();
        self.history.apply_edit(image.clone());
        self.chat.push_assistant(
            note.unwrap_or_else(|| format!("Here is your {style} headshot.")),
            Some(image),
        );
    }

    pub fn accept_edit(&mut self, image: ImageRef, note: Option<String>) {
        self.history.apply_edit(image.clone());
        self.chat
            .push_assistant(note.unwrap_or_else(|| "Edit applied.".to_string()), Some(image));
    }

    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.chat.push_assistant(message, None);
    }

    /// Steps back one frame. Fails with `Busy` while a request is in flight.
    pub fn undo(&mut self) -> Result<bool> {
        if self.is_processing {
            return Err(HeadshotError::Busy);
        }
        Ok(self.history.undo())
    }

    pub fn redo(&mut self) -> Result<bool> {
        if self.is_processing {
            return Err(HeadshotError::Busy);
        }
        Ok(self.history.redo())
    }

    /// Clears everything and invalidates any request in flight.
    pub fn reset(&mut self) {
        self.history.reset();
        self.chat = ChatLog::new();
        self.base_image = None;
        self.style = None;
        self.is_processing = false;
        self.request_seq += 1;
    }

    pub fn snapshot(&self) -> StudioSnapshot {
        StudioSnapshot {
            session_id: self.id.clone(),
            current: self.history.current().cloned(),
            cursor: self.history.cursor(),
            frame_count: self.history.len(),
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
            is_processing: self.is_processing,
            style: self.style,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(tag: &str) -> ImageRef {
        ImageRef::new("image/png", tag)
    }

    #[test]
    fn test_second_request_is_busy() {
        let mut session = StudioSession::new(Identity::Anonymous);
        let token = session.begin_request("first").unwrap();
        assert!(matches!(
            session.begin_request("second"),
            Err(HeadshotError::Busy)
        ));

        session.finish_request(token).unwrap();
        assert!(session.begin_request("third").is_ok());
    }

    #[test]
    fn test_reset_makes_in_flight_token_stale() {
        let mut session = StudioSession::new(Identity::Anonymous);
        let token = session.begin_request("go").unwrap();
        session.reset();

        assert!(matches!(
            session.finish_request(token),
            Err(HeadshotError::StaleResponse { token: t }) if t == token
        ));
        assert!(!session.is_processing());
        assert!(session.chat().is_empty());
    }

    #[test]
    fn test_headshot_then_edits() {
        let mut session = StudioSession::new(Identity::Anonymous);
        session.accept_headshot(image("selfie"), HeadshotStyle::Studio, image("h1"), None);
        session.accept_edit(image("h2"), Some("Brighter".into()));

        let snapshot = session.snapshot();
        assert_eq!(snapshot.current, Some(image("h2")));
        assert_eq!(snapshot.frame_count, 2);
        assert!(snapshot.can_undo);
        assert_eq!(session.chat().messages()[0].text, "Here is your studio headshot.");

        // A new headshot starts a fresh history.
        session.accept_headshot(image("selfie"), HeadshotStyle::Casual, image("h3"), None);
        assert_eq!(session.history().frames(), &[image("h3")]);
        assert!(!session.history().can_undo());
    }

    #[test]
    fn test_history_locked_while_processing() {
        let mut session = StudioSession::new(Identity::Anonymous);
        session.accept_headshot(image("selfie"), HeadshotStyle::Studio, image("h1"), None);
        session.accept_edit(image("h2"), None);

        let token = session.begin_request("tie").unwrap();
        assert!(matches!(session.undo(), Err(HeadshotError::Busy)));
        assert!(matches!(session.redo(), Err(HeadshotError::Busy)));
        assert_eq!(session.current_image(), Some(&image("h2")));

        session.finish_request(token).unwrap();
        assert!(session.undo().unwrap());
        assert_eq!(session.current_image(), Some(&image("h1")));
    }
}
