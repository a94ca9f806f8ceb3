use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::AppError;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub token_issuer: String,
    pub token_secret: String,
    pub token_lifetime_hours: i64,
    pub email_server: String,
    pub email_port: u16,
    pub email_from: String,
    pub email_password: String,
    pub log_file: String,
    pub report_path: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Every setting except
    /// `REPORT_PATH` is required.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            port: parsed(&lookup, "API_PORT")?,
            database_url: required(&lookup, "DATABASE_URL")?,
            token_issuer: required(&lookup, "TOKEN_ISSUE_NAME")?,
            token_secret: required(&lookup, "TOKEN_KEY")?,
            token_lifetime_hours: parsed(&lookup, "TOKEN_LIFE_TIME")?,
            email_server: required(&lookup, "EMAIL_SERVER")?,
            email_port: parsed(&lookup, "EMAIL_PORT")?,
            email_from: required(&lookup, "EMAIL_FROM")?,
            email_password: required(&lookup, "EMAIL_PASSWORD")?,
            log_file: required(&lookup, "LOG_FILE")?,
            report_path: lookup("REPORT_PATH")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("Report.xlsx")),
        })
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("missing required environment variable {key}")))
}

fn parsed<F, T>(lookup: &F, key: &str) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let raw = required(lookup, key)?;
    raw.trim()
        .parse()
        .map_err(|_| AppError::Config(format!("invalid value for {key}: {raw}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("API_PORT", "8080"),
            ("DATABASE_URL", ":memory:"),
            ("TOKEN_ISSUE_NAME", "roombook"),
            ("TOKEN_KEY", "secret"),
            ("TOKEN_LIFE_TIME", "2"),
            ("EMAIL_SERVER", "smtp.example.com"),
            ("EMAIL_PORT", "587"),
            ("EMAIL_FROM", "rooms@example.com"),
            ("EMAIL_PASSWORD", "hunter2"),
            ("LOG_FILE", "roombook.log"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<AppConfig, AppError> {
        AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_loads_complete_environment() {
        let config = load(&full_env()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.token_lifetime_hours, 2);
        assert_eq!(config.email_port, 587);
        assert_eq!(config.report_path, PathBuf::from("Report.xlsx"));
    }

    #[test]
    fn test_missing_variable_is_fatal() {
        let mut vars = full_env();
        vars.remove("EMAIL_PASSWORD");
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("EMAIL_PASSWORD"));
    }

    #[test]
    fn test_blank_variable_counts_as_missing() {
        let mut vars = full_env();
        vars.insert("LOG_FILE", "   ");
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_unparseable_port_is_rejected() {
        let mut vars = full_env();
        vars.insert("API_PORT", "eighty");
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("API_PORT"));
    }

    #[test]
    fn test_report_path_override() {
        let mut vars = full_env();
        vars.insert("REPORT_PATH", "/tmp/bookings.xlsx");
        let config = load(&vars).unwrap();
        assert_eq!(config.report_path, PathBuf::from("/tmp/bookings.xlsx"));
    }
}
