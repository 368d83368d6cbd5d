//! Share-for-credit state machine.
//!
//! ```text
//! Idle -> Sharing -> AwaitingConfirmation -> Granted
//!   |        |              |
//!   |        +--------------+-------------> Cancelled
//!   +--> Ineligible (offers the ad fallback)
//! ```
//!
//! Nothing verifies that the post was actually published; the platforms give
//! no callback. The user's confirmation is taken as a self-reported
//! attestation.

use super::share::SharePlatform;
use crate::error::{HeadshotError, Result};
use crate::identity::Identity;
use crate::usage::Allowance;
use chrono::Duration;

/// Alternate way to earn a credit when sharing is not possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditFallback {
    WatchAd,
}

/// What the caller needs to open the share dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareIntent {
    /// Account the credit will go to.
    pub identity: Identity,
    pub platform: SharePlatform,
    pub share_url: String,
    /// Caption placed on the clipboard so the user can paste it.
    pub clipboard_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareState {
    Idle,
    Sharing(ShareIntent),
    AwaitingConfirmation(ShareIntent),
    Granted(SharePlatform),
    Cancelled,
    Ineligible {
        platform: SharePlatform,
        retry_after: Duration,
        fallback: CreditFallback,
    },
}

#[derive(Debug, Clone)]
pub struct ShareFlow {
    state: ShareState,
}

impl Default for ShareFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl ShareFlow {
    pub fn new() -> Self {
        Self {
            state: ShareState::Idle,
        }
    }

    pub fn state(&self) -> &ShareState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.state,
            ShareState::Granted(_) | ShareState::Cancelled | ShareState::Ineligible { .. }
        )
    }

    /// Starts a share. An ineligible identity is routed to the fallback
    /// instead of being blocked outright.
    pub fn begin(
        &mut self,
        identity: &Identity,
        platform: SharePlatform,
        eligibility: Allowance,
        link: &str,
        caption: &str,
    ) -> Result<&ShareState> {
        if !matches!(self.state, ShareState::Idle) {
            return Err(self.illegal("begin"));
        }

        self.state = if eligibility.allowed {
            ShareState::Sharing(ShareIntent {
                identity: identity.clone(),
                platform,
                share_url: platform.share_url(link, caption)?,
                clipboard_text: format!("{caption} {link}"),
            })
        } else {
            ShareState::Ineligible {
                platform,
                retry_after: eligibility.retry_after.unwrap_or_else(Duration::zero),
                fallback: CreditFallback::WatchAd,
            }
        };
        Ok(&self.state)
    }

    /// The share in progress, if the flow has not finished.
    pub fn pending_intent(&self) -> Option<&ShareIntent> {
        match &self.state {
            ShareState::Sharing(intent) | ShareState::AwaitingConfirmation(intent) => Some(intent),
            _ => None,
        }
    }

    /// The external share window has been opened.
    pub fn mark_opened(&mut self) -> Result<&ShareState> {
        match std::mem::replace(&mut self.state, ShareState::Idle) {
            ShareState::Sharing(intent) => {
                self.state = ShareState::AwaitingConfirmation(intent);
                Ok(&self.state)
            }
            other => {
                self.state = other;
                Err(self.illegal("mark_opened"))
            }
        }
    }

    /// User says they posted. Returns the platform to credit.
    ///
    /// Only the identity that started the flow can confirm it.
    pub fn confirm(&mut self, identity: &Identity) -> Result<SharePlatform> {
        match &self.state {
            ShareState::AwaitingConfirmation(intent) if &intent.identity != identity => Err(
                HeadshotError::validation("This share was started by a different account"),
            ),
            ShareState::AwaitingConfirmation(intent) => {
                let platform = intent.platform;
                self.state = ShareState::Granted(platform);
                Ok(platform)
            }
            _ => Err(self.illegal("confirm")),
        }
    }

    pub fn cancel(&mut self) -> Result<()> {
        match self.state {
            ShareState::Sharing(_) | ShareState::AwaitingConfirmation(_) => {
                self.state = ShareState::Cancelled;
                Ok(())
            }
            _ => Err(self.illegal("cancel")),
        }
    }

    fn illegal(&self, action: &str) -> HeadshotError {
        HeadshotError::validation(format!(
            "Cannot {action} a share in state {}",
            state_name(&self.state)
        ))
    }
}

fn state_name(state: &ShareState) -> &'static str {
    match state {
        ShareState::Idle => "Idle",
        ShareState::Sharing(_) => "Sharing",
        ShareState::AwaitingConfirmation(_) => "AwaitingConfirmation",
        ShareState::Granted(_) => "Granted",
        ShareState::Cancelled => "Cancelled",
        ShareState::Ineligible { .. } => "Ineligible",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINK: &str = "https://headshot.studio";

    fn user() -> Identity {
        Identity::User("u1".into())
    }

    #[test]
    fn test_happy_path() {
        let mut flow = ShareFlow::new();
        let state = flow
            .begin(&user(), SharePlatform::Linkedin, Allowance::granted(), LINK, "Look!")
            .unwrap();
        match state {
            ShareState::Sharing(intent) => {
                assert_eq!(intent.identity, user());
                assert_eq!(intent.clipboard_text, "Look! https://headshot.studio");
                assert!(intent.share_url.contains("linkedin.com"));
            }
            other => panic!("unexpected state {other:?}"),
        }

        flow.mark_opened().unwrap();
        assert!(matches!(flow.state(), ShareState::AwaitingConfirmation(_)));

        assert_eq!(flow.confirm(&user()).unwrap(), SharePlatform::Linkedin);
        assert_eq!(flow.state(), &ShareState::Granted(SharePlatform::Linkedin));
        assert!(flow.is_finished());
    }

    #[test]
    fn test_ineligible_offers_ad_fallback() {
        let mut flow = ShareFlow::new();
        flow.begin(
            &user(),
            SharePlatform::Twitter,
            Allowance::denied(Duration::hours(5)),
            LINK,
            "x",
        )
        .unwrap();

        assert_eq!(
            flow.state(),
            &ShareState::Ineligible {
                platform: SharePlatform::Twitter,
                retry_after: Duration::hours(5),
                fallback: CreditFallback::WatchAd,
            }
        );
        assert!(flow.confirm(&user()).is_err());
    }

    #[test]
    fn test_cannot_confirm_before_opening() {
        let mut flow = ShareFlow::new();
        flow.begin(&user(), SharePlatform::Facebook, Allowance::granted(), LINK, "x")
            .unwrap();
        let err = flow.confirm(&user()).unwrap_err();
        assert!(err.is_validation());
        assert!(matches!(flow.state(), ShareState::Sharing(_)));
    }

    #[test]
    fn test_cancel_from_awaiting() {
        let mut flow = ShareFlow::new();
        flow.begin(&user(), SharePlatform::Facebook, Allowance::granted(), LINK, "x")
            .unwrap();
        flow.mark_opened().unwrap();
        flow.cancel().unwrap();
        assert_eq!(flow.state(), &ShareState::Cancelled);
        assert!(flow.cancel().is_err());
    }

    #[test]
    fn test_mark_opened_keeps_state_on_error() {
        let mut flow = ShareFlow::new();
        assert!(flow.mark_opened().is_err());
        assert_eq!(flow.state(), &ShareState::Idle);
    }

    #[test]
    fn test_begin_twice_is_rejected() {
        let mut flow = ShareFlow::new();
        flow.begin(&user(), SharePlatform::Linkedin, Allowance::granted(), LINK, "x")
            .unwrap();
        assert!(
            flow.begin(&user(), SharePlatform::Linkedin, Allowance::granted(), LINK, "x")
                .is_err()
        );
    }

    #[test]
    fn test_other_account_cannot_confirm() {
        let mut flow = ShareFlow::new();
        flow.begin(&user(), SharePlatform::Linkedin, Allowance::granted(), LINK, "x")
            .unwrap();
        flow.mark_opened().unwrap();

        let err = flow.confirm(&Identity::User("u2".into())).unwrap_err();
        assert!(err.is_validation());
        assert!(matches!(flow.state(), ShareState::AwaitingConfirmation(_)));
        assert_eq!(flow.confirm(&user()).unwrap(), SharePlatform::Linkedin);
    }

    #[test]
    fn test_pending_intent_only_while_open() {
        let mut flow = ShareFlow::new();
        assert!(flow.pending_intent().is_none());
        flow.begin(&user(), SharePlatform::Facebook, Allowance::granted(), LINK, "x")
            .unwrap();
        assert_eq!(
            flow.pending_intent().map(|i| i.platform),
            Some(SharePlatform::Facebook)
        );
        flow.cancel().unwrap();
        assert!(flow.pending_intent().is_none());
    }
}
