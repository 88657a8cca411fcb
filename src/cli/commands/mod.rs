use clap::{
    Arg, ColorChoice, Command,
    builder::{
        ValueParser,
        styling::{AnsiColor, Effects, Styles},
    },
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("cofre")
        .about("Personal credential vault")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("COFRE_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("dsn")
                .short('d')
                .long("dsn")
                .help("Database connection string")
                .env("COFRE_DSN")
                .required(true),
        )
        .arg(
            Arg::new("token-secret")
                .long("token-secret")
                .help("Secret used to sign session artifacts")
                .env("COFRE_TOKEN_SECRET")
                .required(true),
        )
        .arg(
            Arg::new("issuer")
                .long("issuer")
                .help("Issuer label embedded in TOTP provisioning URIs")
                .default_value("cofre")
                .env("COFRE_ISSUER"),
        )
        .arg(
            Arg::new("frontend-url")
                .long("frontend-url")
                .help("Frontend origin allowed by CORS")
                .default_value("http://localhost:5173")
                .env("COFRE_FRONTEND_URL"),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("COFRE_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "cofre");
        assert_eq!(
            command.get_about().unwrap().to_string(),
            "Personal credential vault"
        );
        assert_eq!(
            command.get_version().unwrap().to_string(),
            env!("CARGO_PKG_VERSION")
        );
    }

    #[test]
    fn test_check_required_args() {
        let command = new();
        let matches = command.get_matches_from(vec![
            "cofre",
            "--dsn",
            "postgres://cofre@localhost/cofre",
            "--token-secret",
            "super-secret",
            "--port",
            "8443",
        ]);

        assert_eq!(matches.get_one::<u16>("port").copied(), Some(8443));
        assert_eq!(
            matches.get_one::<String>("dsn").map(String::as_str),
            Some("postgres://cofre@localhost/cofre")
        );
        assert_eq!(
            matches.get_one::<String>("issuer").map(String::as_str),
            Some("cofre")
        );
        assert_eq!(
            matches.get_one::<String>("frontend-url").map(String::as_str),
            Some("http://localhost:5173")
        );
    }

    #[test]
    fn test_log_level_validator() {
        let command = new();
        let matches = command.try_get_matches_from(vec![
            "cofre",
            "--dsn",
            "postgres://cofre@localhost/cofre",
            "--token-secret",
            "super-secret",
            "-vvv",
        ]);

        assert!(matches.is_ok());
        assert_eq!(
            matches.map(|m| m.get_count("verbosity")).unwrap_or_default(),
            3
        );
    }
}
