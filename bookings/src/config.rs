//! Server configuration
//!
//! Parsed once in `main` from command-line flags (with environment fallbacks)
//! and handed to the constructors that need it.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{ArgAction, Parser};
use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::error::ConfigError;

/// Bookings web server
#[derive(Debug, Clone, Parser)]
#[command(name = "bookings")]
#[command(version, about = "Room booking web server", long_about = None)]
pub struct Config {
    /// Application is in production (secure cookies)
    #[arg(long, env = "PRODUCTION", default_value_t = true, action = ArgAction::Set)]
    pub production: bool,

    /// Use the template cache instead of reading templates on every request
    #[arg(long = "cache", env = "USE_TEMPLATE_CACHE", default_value_t = true, action = ArgAction::Set)]
    pub use_cache: bool,

    /// Database host
    #[arg(long, env = "DB_HOST", default_value = "localhost")]
    pub dbhost: String,

    /// Database name
    #[arg(long, env = "DB_NAME", default_value = "")]
    pub dbname: String,

    /// Database user
    #[arg(long, env = "DB_USER", default_value = "")]
    pub dbuser: String,

    /// Database password
    #[arg(long, env = "DB_PASSWORD", default_value = "", hide_env_values = true)]
    pub dbpassword: String,

    /// Database port
    #[arg(long, env = "DB_PORT", default_value_t = 5432)]
    pub dbport: u16,

    /// Database ssl settings (disable, prefer, require)
    #[arg(long, env = "DB_SSL", default_value = "")]
    pub dbssl: String,

    /// HTTP listen port
    #[arg(long, env = "HTTP_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Directory holding `*.page.html` and `*.layout.html` templates
    #[arg(long = "templates", env = "TEMPLATE_DIR", value_name = "PATH", default_value = "bookings/templates")]
    pub template_dir: PathBuf,

    /// Directory holding e-mail templates
    #[arg(long = "email-templates", env = "EMAIL_TEMPLATE_DIR", value_name = "PATH", default_value = "bookings/email-templates")]
    pub email_template_dir: PathBuf,

    /// Directory served under `/assets`
    #[arg(long = "assets", env = "ASSET_DIR", value_name = "PATH", default_value = "bookings/assets")]
    pub asset_dir: PathBuf,

    /// Sender address for notification e-mails
    #[arg(long, env = "MAIL_FROM", default_value = "me@here.com")]
    pub mail_from: String,

    /// Address receiving new-booking notices
    #[arg(long, env = "OWNER_EMAIL", default_value = "owner@here.com")]
    pub owner_email: String,

    /// Outstanding notification e-mails before new ones are rejected
    #[arg(long, env = "MAIL_QUEUE_CAPACITY", default_value_t = 100)]
    pub mail_queue_capacity: usize,
}

impl Config {
    /// Check the flags that have no usable default
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dbname.trim().is_empty() {
            return Err(ConfigError::MissingFlag("dbname"));
        }
        if self.dbuser.trim().is_empty() {
            return Err(ConfigError::MissingFlag("dbuser"));
        }
        if self.mail_queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                flag: "mail-queue-capacity",
                value: "0".into(),
            });
        }
        self.ssl_mode()?;
        Ok(())
    }

    fn ssl_mode(&self) -> Result<Option<PgSslMode>, ConfigError> {
        let mode = self.dbssl.trim();
        if mode.is_empty() {
            return Ok(None);
        }
        PgSslMode::from_str(mode)
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                flag: "dbssl",
                value: mode.to_string(),
            })
    }

    /// Postgres connection built from host, port, dbname, user, password and sslmode
    pub fn pg_connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        let mut options = PgConnectOptions::new()
            .host(&self.dbhost)
            .port(self.dbport)
            .database(&self.dbname)
            .username(&self.dbuser);
        if !self.dbpassword.is_empty() {
            options = options.password(&self.dbpassword);
        }
        if let Some(mode) = self.ssl_mode()? {
            options = options.ssl_mode(mode);
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["bookings"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["--dbname", "bookings", "--dbuser", "tcs"]);
        assert!(config.production);
        assert!(config.use_cache);
        assert_eq!(config.dbhost, "localhost");
        assert_eq!(config.dbport, 5432);
        assert_eq!(config.mail_queue_capacity, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_boolean_flags_take_values() {
        let config = parse(&[
            "--production", "false", "--cache", "false", "--dbname", "b", "--dbuser", "u",
        ]);
        assert!(!config.production);
        assert!(!config.use_cache);
    }

    #[test]
    fn test_missing_name_or_user_is_rejected() {
        let config = parse(&["--dbuser", "tcs"]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingFlag("dbname"))
        ));

        let config = parse(&["--dbname", "bookings"]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingFlag("dbuser"))
        ));
    }

    #[test]
    fn test_ssl_mode() {
        let config = parse(&["--dbname", "b", "--dbuser", "u", "--dbssl", "require"]);
        assert!(config.pg_connect_options().is_ok());

        let config = parse(&["--dbname", "b", "--dbuser", "u", "--dbssl", "sometimes"]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { flag: "dbssl", .. })
        ));
    }
}
