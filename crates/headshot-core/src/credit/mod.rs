//! Bonus-credit side channels.
//!
//! - `share`: per-platform share cooldowns (`ShareLedger`) and share intents
//! - `flow`: the share modal state machine (`ShareFlow`)
//! - `ad`: timed ad views (`AdRewardLedger`)

mod ad;
mod flow;
mod share;

pub use ad::{AdRewardLedger, AdViewSession};
pub use flow::{CreditFallback, ShareFlow, ShareIntent, ShareState};
pub use share::{ShareLedger, SharePlatform, SocialShareRecord};
