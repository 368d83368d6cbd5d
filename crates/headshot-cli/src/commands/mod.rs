pub mod account;
pub mod blog;
pub mod credits;
pub mod generate;

use headshot_core::HeadshotError;

/// Turns a domain error into the message a user should see.
pub(crate) fn friendly(err: HeadshotError) -> anyhow::Error {
    tracing::debug!("Command failed: {:?}", err);
    anyhow::anyhow!(err.user_message())
}
