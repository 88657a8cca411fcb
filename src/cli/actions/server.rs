use crate::api;
use crate::cli::actions::Action;
use anyhow::Result;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            token_secret,
            issuer,
            frontend_url,
        } => {
            api::new(port, dsn, &token_secret, issuer, frontend_url).await?;
        }
    }

    Ok(())
}
