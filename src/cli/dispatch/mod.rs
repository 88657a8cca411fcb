use crate::cli::actions::Action;
use anyhow::{Context, Result};
use secrecy::SecretString;

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    Ok(Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        dsn: matches
            .get_one::<String>("dsn")
            .map(ToString::to_string)
            .context("missing required argument: --dsn")?,
        token_secret: matches
            .get_one::<String>("token-secret")
            .map(|secret| SecretString::from(secret.clone()))
            .context("missing required argument: --token-secret")?,
        issuer: matches
            .get_one::<String>("issuer")
            .map_or_else(|| "cofre".to_string(), ToString::to_string),
        frontend_url: matches
            .get_one::<String>("frontend-url")
            .map_or_else(|| "http://localhost:5173".to_string(), ToString::to_string),
    })
}
