use secrecy::Secret;
use serde::Deserialize;

const DEFAULT_RESEND_API_URL: &str = "https://api.resend.com";
const DEFAULT_EMAIL_FROM: &str = "Froebel School <onboarding@resend.dev>";
const DEFAULT_CLEANUP_SCHEDULE: &str = "0 */15 * * * *";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: Secret<String>,
    pub base_url: String,
    pub host: String,
    pub port: u16,

    // Resend transactional email API
    pub resend_api_key: Secret<String>,
    pub resend_api_url: String,
    pub email_from: String,

    // Accounts created with these addresses get the admin role
    pub admin_emails: Vec<String>,

    // Sessions & magic links
    pub secure_cookies: bool,
    pub magic_link_ttl_minutes: i64,
    pub session_ttl_days: i64,

    pub cleanup_schedule: String,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for local development)
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        Ok(Self {
            database_url: Secret::new(config.get("database_url")?),
            base_url: config.get("base_url")?,
            host: config.get("host").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: config.get("port")?,

            resend_api_key: Secret::new(config.get("resend_api_key")?),
            resend_api_url: config
                .get("resend_api_url")
                .unwrap_or_else(|_| DEFAULT_RESEND_API_URL.to_string()),
            email_from: config
                .get("email_from")
                .unwrap_or_else(|_| DEFAULT_EMAIL_FROM.to_string()),

            admin_emails: config
                .get::<String>("admin_emails")
                .map(|raw| parse_email_list(&raw))
                .unwrap_or_default(),

            secure_cookies: config.get("secure_cookies").unwrap_or(false),
            magic_link_ttl_minutes: config.get("magic_link_ttl_minutes").unwrap_or(15),
            session_ttl_days: config.get("session_ttl_days").unwrap_or(7),

            cleanup_schedule: config
                .get("cleanup_schedule")
                .unwrap_or_else(|_| DEFAULT_CLEANUP_SCHEDULE.to_string()),
        })
    }

    /// Whether `email` is listed in `ADMIN_EMAILS` (case-insensitive)
    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.admin_emails.iter().any(|admin| *admin == email)
    }
}

/// Splits a comma-separated address list, normalising each entry
fn parse_email_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|email| email.trim().to_lowercase())
        .filter(|email| !email.is_empty())
        .collect()
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        database_url: Secret::new("postgres://localhost/froebel_test".to_string()),
        base_url: "http://localhost:3001".to_string(),
        host: "127.0.0.1".to_string(),
        port: 3001,
        resend_api_key: Secret::new("re_test_key".to_string()),
        resend_api_url: "http://127.0.0.1:9".to_string(),
        email_from: DEFAULT_EMAIL_FROM.to_string(),
        admin_emails: vec!["principal@froebel.org".to_string()],
        secure_cookies: false,
        magic_link_ttl_minutes: 15,
        session_ttl_days: 7,
        cleanup_schedule: DEFAULT_CLEANUP_SCHEDULE.to_string(),
    }
}
