use super::friendly;
use anyhow::Result;
use headshot_application::AppContext;
use headshot_core::auth::AuthSession;

pub async fn signup(ctx: &AppContext, email: &str, password: &str) -> Result<()> {
    let auth = ctx.auth().map_err(friendly)?;
    let session = auth.sign_up(email, password).await.map_err(friendly)?;
    println!("Account created for {}.", session.email);
    print_user_hint(&session);
    Ok(())
}

pub async fn login(ctx: &AppContext, email: &str, password: &str) -> Result<()> {
    let auth = ctx.auth().map_err(friendly)?;
    let session = auth.sign_in(email, password).await.map_err(friendly)?;
    println!("Signed in as {}.", session.email);
    print_user_hint(&session);
    Ok(())
}

fn print_user_hint(session: &AuthSession) {
    println!("Pass `--user {}` to use this account's quota.", session.user_id);
}
