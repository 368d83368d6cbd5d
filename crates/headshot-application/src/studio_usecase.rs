//! Studio use case implementation.
//!
//! `StudioUseCase` coordinates the usage quota, the image generator (through
//! the retry wrapper) and per-session edit history.
//!
//! # Flow of a generation
//!
//! 1. Lock the session, reject if a request is already in flight, read the
//!    frame an edit applies to, check the quota, take a sequence token,
//!    unlock.
//! 2. Call the generator with no lock held.
//! 3. Lock again. If the token is stale the result is dropped; otherwise one
//!    generation is consumed and the frame recorded.

use crate::session::{SessionCache, StudioSession, StudioSnapshot};
use headshot_core::chat::ChatMessage;
use headshot_core::generation::{
    GeneratedImage, GenerationRequest, HeadshotStyle, ImageGenerator, RetryPolicy, edit_prompt,
    with_retry,
};
use headshot_core::image::ImageRef;
use headshot_core::usage::UsageTracker;
use headshot_core::{HeadshotError, Identity, Result};
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct StudioUseCase {
    generator: Arc<dyn ImageGenerator>,
    usage: Arc<UsageTracker>,
    retry_policy: RetryPolicy,
    sessions: SessionCache<Mutex<StudioSession>>,
}

impl StudioUseCase {
    pub fn new(
        generator: Arc<dyn ImageGenerator>,
        usage: Arc<UsageTracker>,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            generator,
            usage,
            retry_policy,
            sessions: SessionCache::new(),
        }
    }

    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    /// Opens a new session for `identity` and returns its id.
    pub async fn open_session(&self, identity: Identity) -> String {
        let session = StudioSession::new(identity);
        let id = session.id().to_string();
        tracing::debug!("Opened studio session {} for {}", id, session.identity());
        self.sessions.insert(id.clone(), Arc::new(Mutex::new(session))).await;
        id
    }

    pub async fn close_session(&self, session_id: &str) -> Result<()> {
        self.sessions
            .remove(session_id)
            .await
            .map(|_| ())
            .ok_or_else(|| HeadshotError::not_found("StudioSession", session_id))
    }

    async fn session(&self, session_id: &str) -> Result<Arc<Mutex<StudioSession>>> {
        self.sessions
            .get(session_id)
            .await
            .ok_or_else(|| HeadshotError::not_found("StudioSession", session_id))
    }

    pub async fn snapshot(&self, session_id: &str) -> Result<StudioSnapshot> {
        Ok(self.session(session_id).await?.lock().await.snapshot())
    }

    pub async fn messages(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        let session = self.session(session_id).await?;
        let session = session.lock().await;
        Ok(session.chat().messages().to_vec())
    }

    /// Turns a selfie into a headshot of `style`, replacing the history.
    pub async fn generate_headshot(
        &self,
        session_id: &str,
        selfie: ImageRef,
        style: HeadshotStyle,
        extra: Option<&str>,
    ) -> Result<StudioSnapshot> {
        let handle = self.session(session_id).await?;
        let request = GenerationRequest {
            image: selfie.clone(),
            instruction: style.prompt(extra),
        };
        let user_text = match extra.map(str::trim).filter(|s| !s.is_empty()) {
            Some(extra) => format!("Create a {style} headshot. {extra}"),
            None => format!("Create a {style} headshot."),
        };

        let (identity, token, ()) = self.begin(&handle, &user_text, |_| Ok(())).await?;
        tracing::info!(
            "[Studio] Generating {} headshot for {} (request #{})",
            style,
            identity,
            token
        );

        let outcome = self.call_generator(&request).await;

        let mut session = handle.lock().await;
        let generated = self.settle(&mut session, &identity, token, outcome)?;
        session.accept_headshot(selfie, style, generated.image, generated.note);
        Ok(session.snapshot())
    }

    /// Applies a natural-language edit to the current frame.
    pub async fn apply_edit(&self, session_id: &str, instruction: &str) -> Result<StudioSnapshot> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(HeadshotError::validation("Describe the edit you want"));
        }

        let handle = self.session(session_id).await?;
        let (identity, token, current) = self
            .begin(&handle, instruction, |session| {
                session.current_image().cloned().ok_or_else(|| {
                    HeadshotError::validation("Generate a headshot before editing it")
                })
            })
            .await?;
        let request = GenerationRequest {
            image: current,
            instruction: edit_prompt(instruction),
        };
        tracing::info!("[Studio] Applying edit for {} (request #{})", identity, token);

        let outcome = self.call_generator(&request).await;

        let mut session = handle.lock().await;
        let generated = self.settle(&mut session, &identity, token, outcome)?;
        session.accept_edit(generated.image, generated.note);
        Ok(session.snapshot())
    }

    pub async fn undo(&self, session_id: &str) -> Result<StudioSnapshot> {
        let handle = self.session(session_id).await?;
        let mut session = handle.lock().await;
        session.undo()?;
        Ok(session.snapshot())
    }

    pub async fn redo(&self, session_id: &str) -> Result<StudioSnapshot> {
        let handle = self.session(session_id).await?;
        let mut session = handle.lock().await;
        session.redo()?;
        Ok(session.snapshot())
    }

    pub async fn reset(&self, session_id: &str) -> Result<StudioSnapshot> {
        let handle = self.session(session_id).await?;
        let mut session = handle.lock().await;
        session.reset();
        tracing::debug!("[Studio] Session {} reset", session_id);
        Ok(session.snapshot())
    }

    /// Busy check, `prepare`, quota check and token, under one lock.
    ///
    /// `prepare` reads whatever the request needs from the session so it
    /// matches the state the token was issued against.
    async fn begin<T>(
        &self,
        handle: &Mutex<StudioSession>,
        user_text: &str,
        prepare: impl FnOnce(&StudioSession) -> Result<T>,
    ) -> Result<(Identity, u64, T)> {
        let mut session = handle.lock().await;
        if session.is_processing() {
            return Err(HeadshotError::Busy);
        }
        let prepared = prepare(&session)?;

        let identity = session.identity().clone();
        let allowance = self.usage.check_limit(&identity);
        if !allowance.allowed {
            let retry_after = allowance.retry_after.unwrap_or_else(chrono::Duration::zero);
            tracing::info!("[Studio] Quota exhausted for {}", identity);
            return Err(HeadshotError::QuotaExceeded { retry_after });
        }

        let token = session.begin_request(user_text)?;
        Ok((identity, token, prepared))
    }

    async fn call_generator(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<GeneratedImage, headshot_core::generation::GenerationError> {
        let generator = self.generator.as_ref();
        with_retry(&self.retry_policy, || generator.generate(request)).await
    }

    /// Closes the request and charges for a successful one.
    fn settle(
        &self,
        session: &mut StudioSession,
        identity: &Identity,
        token: u64,
        outcome: std::result::Result<GeneratedImage, headshot_core::generation::GenerationError>,
    ) -> Result<GeneratedImage> {
        if let Err(e) = session.finish_request(token) {
            tracing::info!("[Studio] Discarding response for request #{}", token);
            return Err(e);
        }

        match outcome {
            Ok(generated) => {
                let record = self.usage.consume(identity)?;
                tracing::debug!(
                    "[Studio] {} has used {} generation(s) this window",
                    identity,
                    record.count
                );
                Ok(generated)
            }
            Err(e) => {
                tracing::warn!("[Studio] Generation failed with {}: {}", self.generator.model(), e);
                session.record_failure(e.user_message());
                Err(e.into())
            }
        }
    }
}
