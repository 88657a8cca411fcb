pub mod server;

use secrecy::SecretString;

/// Actions the CLI can dispatch.
#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        token_secret: SecretString,
        issuer: String,
        frontend_url: String,
    },
}
