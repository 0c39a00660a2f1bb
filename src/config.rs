use clap::{Parser, Subcommand};

// ============================================
// Environment variable name constants
// ============================================
pub mod env {
    pub const LOG_FORMAT: &str = "LOG_FORMAT";
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
    pub const HEALTH_PORT: &str = "HEALTH_PORT";
    pub const SERVER_PORT: &str = "SERVER_PORT";
    pub const STORAGE_PATH: &str = "STORAGE_PATH";
    pub const SESSION_SECRET: &str = "SESSION_SECRET";
    pub const SESSION_TTL_HOURS: &str = "SESSION_TTL_HOURS";
    pub const HIGH_RISK_THRESHOLD: &str = "HIGH_RISK_THRESHOLD";
}

/// Minimum length accepted for `SESSION_SECRET`
pub const MIN_SESSION_SECRET_LEN: usize = 32;

/// SQLite file name inside the storage directory
const DB_FILE_NAME: &str = "risk.db";

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show version information
    Version,
    /// Create a user that can log in to the web UI
    CreateUser {
        /// Login name
        #[arg(long)]
        username: String,
        /// Password (a random one is generated and printed when omitted)
        #[arg(long)]
        password: Option<String>,
    },
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "risk-register",
    version,
    about = "Risk register for assets, vulnerabilities, threats and risk assessments",
    long_about = "A web application for recording assets, their vulnerabilities and threats, scoring the resulting risks and grouping them into dated risk assessments."
)]
pub struct Config {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Log format: json or pretty
    #[arg(long, env = env::LOG_FORMAT, default_value = "json")]
    pub log_format: String,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, env = env::LOG_LEVEL, default_value = "info")]
    pub log_level: String,

    /// Health check server port
    #[arg(long, env = env::HEALTH_PORT, default_value = "8080")]
    pub health_port: u16,

    /// Web UI and API port
    #[arg(long, env = env::SERVER_PORT, default_value = "3000")]
    pub server_port: u16,

    /// Directory holding the SQLite database
    #[arg(long, env = env::STORAGE_PATH, default_value = "/data")]
    pub storage_path: String,

    /// Secret used to derive the session cookie key (random per process when unset)
    #[arg(long, env = env::SESSION_SECRET, hide_env_values = true)]
    pub session_secret: Option<String>,

    /// Session lifetime in hours
    #[arg(long, env = env::SESSION_TTL_HOURS, default_value = "8")]
    pub session_ttl_hours: u32,

    /// Minimum risk score listed as a high risk on the dashboard
    #[arg(long, env = env::HIGH_RISK_THRESHOLD, default_value = "7.0")]
    pub high_risk_threshold: f64,
}

impl Config {
    pub fn from_args() -> Self {
        Config::parse()
    }

    /// Validate settings that clap cannot check on its own
    pub fn validate(&self) -> Result<(), String> {
        if let Some(secret) = &self.session_secret
            && secret.len() < MIN_SESSION_SECRET_LEN
        {
            return Err(format!(
                "{} must be at least {} characters",
                env::SESSION_SECRET,
                MIN_SESSION_SECRET_LEN
            ));
        }
        if self.session_ttl_hours == 0 {
            return Err(format!("{} must be greater than 0", env::SESSION_TTL_HOURS));
        }
        if !self.high_risk_threshold.is_finite() || self.high_risk_threshold < 0.0 {
            return Err(format!(
                "{} must be a non-negative number",
                env::HIGH_RISK_THRESHOLD
            ));
        }
        if self.health_port == self.server_port {
            return Err(format!(
                "{} and {} must differ",
                env::HEALTH_PORT,
                env::SERVER_PORT
            ));
        }
        Ok(())
    }

    /// Get SQLite database path
    pub fn get_db_path(&self) -> String {
        format!("{}/{}", self.storage_path.trim_end_matches('/'), DB_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_config() -> Config {
        Config {
            command: None,
            log_format: "json".to_string(),
            log_level: "info".to_string(),
            health_port: 8080,
            server_port: 3000,
            storage_path: "/data".to_string(),
            session_secret: None,
            session_ttl_hours: 8,
            high_risk_threshold: 7.0,
        }
    }

    #[test]
    fn test_validate_defaults() {
        assert!(default_config().validate().is_ok());
    }

    #[test]
    fn test_validate_short_session_secret() {
        let mut config = default_config();
        config.session_secret = Some("too-short".to_string());
        assert_eq!(
            config.validate().unwrap_err(),
            "SESSION_SECRET must be at least 32 characters"
        );
    }

    #[test]
    fn test_validate_long_session_secret() {
        let mut config = default_config();
        config.session_secret = Some("a".repeat(MIN_SESSION_SECRET_LEN));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_ttl() {
        let mut config = default_config();
        config.session_ttl_hours = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_negative_threshold() {
        let mut config = default_config();
        config.high_risk_threshold = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_port_clash() {
        let mut config = default_config();
        config.health_port = 3000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_get_db_path() {
        assert_eq!(default_config().get_db_path(), "/data/risk.db");
    }

    #[test]
    fn test_get_db_path_trailing_slash() {
        let mut config = default_config();
        config.storage_path = "/tmp/custom/".to_string();
        assert_eq!(config.get_db_path(), "/tmp/custom/risk.db");
    }

    #[test]
    fn test_parse_create_user() {
        let config = Config::try_parse_from([
            "risk-register",
            "create-user",
            "--username",
            "alice",
        ])
        .expect("parse");
        match config.command {
            Some(Command::CreateUser { username, password }) => {
                assert_eq!(username, "alice");
                assert!(password.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
