use super::friendly;
use anyhow::Result;
use chrono::Utc;
use headshot_application::AppContext;
use headshot_core::Identity;
use headshot_core::credit::{SharePlatform, ShareState};
use headshot_core::error::format_wait;
use headshot_core::usage::UsageTracker;

pub fn quota(ctx: &AppContext, identity: &Identity) {
    let now = Utc::now();
    let usage = &ctx.usage;
    let record = usage.active_record(identity, now);
    let bonus = record.as_ref().map_or(0, |r| r.bonus_credits);
    let used = record.as_ref().map_or(0, |r| r.count);

    println!("Account:   {identity}");
    println!("Used:      {used} of {}", usage.daily_cap() + bonus);
    if bonus > 0 {
        println!("Bonus:     {bonus} credit(s) earned today");
    }
    println!("Remaining: {}", usage.remaining_at(identity, now));
    if let Some(record) = record {
        println!(
            "Resets in: {}",
            format_wait(&record.time_until_reset(now, usage.window()))
        );
    }
}

/// " (resets in 3h 12m)" once the window is exhausted, else empty.
pub(crate) fn reset_hint(usage: &UsageTracker, identity: &Identity) -> String {
    match usage.check_limit(identity).retry_after {
        Some(wait) => format!(" (resets in {})", format_wait(&wait)),
        None => String::new(),
    }
}

pub fn share(
    ctx: &AppContext,
    identity: &Identity,
    platform: SharePlatform,
    confirm: bool,
    caption: Option<&str>,
) -> Result<()> {
    let mut flow = ctx
        .credits
        .start_share(identity, platform, caption)
        .map_err(friendly)?;

    match flow.state().clone() {
        ShareState::Sharing(intent) if !confirm => {
            println!("Open this link to share on {}:", intent.platform);
            println!("  {}", intent.share_url);
            println!();
            println!("Suggested caption:");
            println!("  {}", intent.clipboard_text);
            println!();
            println!("Once posted, run `headshot share --platform {platform} --confirm`.");
        }
        ShareState::Sharing(_) => {
            ctx.credits
                .confirm_share(identity, &mut flow)
                .map_err(friendly)?;
            println!("Thanks for sharing! +1 generation.");
            println!("Remaining: {}", ctx.usage.remaining(identity));
        }
        ShareState::Ineligible { retry_after, .. } => {
            println!(
                "You already shared on {platform} recently. Try again in {}, or run `headshot ad`.",
                format_wait(&retry_after)
            );
        }
        other => {
            tracing::debug!("Unexpected share state {:?}", other);
        }
    }
    Ok(())
}

pub async fn watch_ad(ctx: &AppContext, identity: &Identity) -> Result<()> {
    let session = ctx.credits.start_ad_view(identity).map_err(friendly)?;
    let watch = ctx.credits.ad_min_watch();

    println!("Playing ad ({}s)...", watch.num_seconds());
    tokio::time::sleep(watch.to_std()?).await;

    ctx.credits.complete_ad_view(&session).map_err(friendly)?;
    println!("Thanks for watching! +1 generation.");
    println!("Remaining: {}", ctx.usage.remaining(identity));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use headshot_core::storage::{MemoryLocalStore, NamespacedStore};
    use std::sync::Arc;

    #[test]
    fn test_reset_hint_only_when_exhausted() {
        let store = NamespacedStore::new(Arc::new(MemoryLocalStore::new()), "test");
        let usage = UsageTracker::new(store, 1, chrono::Duration::hours(24));
        let identity = Identity::Anonymous;

        assert_eq!(reset_hint(&usage, &identity), "");
        usage.consume(&identity).unwrap();
        assert!(reset_hint(&usage, &identity).starts_with(" (resets in 23h"));
    }
}
