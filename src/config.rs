use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
    pub cookie_name: String,
}

/// Argon2 cost parameters. `None` keeps the library default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordConfig {
    pub memory_kib: Option<u32>,
    pub iterations: Option<u32>,
    pub parallelism: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub api_key: Option<String>,
    pub api_host: String,
    pub base_url: String,
    pub country: String,
    pub date_posted: String,
    pub delay_ms: u64,
    pub timeout_secs: u64,
}

impl SearchConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResumeConfig {
    pub extractor_url: String,
    pub groq_api_key: Option<String>,
    pub groq_base_url: String,
    pub groq_model: String,
    pub timeout_secs: u64,
}

impl ResumeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
    pub admin_creation_secret: Option<String>,
    pub search: SearchConfig,
    pub resume: ResumeConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "opportunity-tracker".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "opportunity-tracker-users".into()),
            ttl_minutes: parsed("JWT_TTL_MINUTES").unwrap_or(60),
            refresh_ttl_minutes: parsed("JWT_REFRESH_TTL_MINUTES").unwrap_or(60 * 24 * 14),
            cookie_name: std::env::var("SESSION_COOKIE_NAME").unwrap_or_else(|_| "session".into()),
        };
        let password = PasswordConfig {
            memory_kib: parsed("ARGON2_MEMORY_KIB"),
            iterations: parsed("ARGON2_ITERATIONS"),
            parallelism: parsed("ARGON2_PARALLELISM"),
        };
        let search = SearchConfig {
            api_key: non_empty("JSEARCH_API_KEY"),
            api_host: std::env::var("JSEARCH_API_HOST")
                .unwrap_or_else(|_| "jsearch.p.rapidapi.com".into()),
            base_url: std::env::var("JSEARCH_BASE_URL")
                .unwrap_or_else(|_| "https://jsearch.p.rapidapi.com".into()),
            country: std::env::var("JSEARCH_COUNTRY").unwrap_or_else(|_| "us".into()),
            date_posted: std::env::var("JSEARCH_DATE_POSTED").unwrap_or_else(|_| "all".into()),
            delay_ms: parsed("SEARCH_DELAY_MS").unwrap_or(500),
            timeout_secs: parsed("SEARCH_TIMEOUT_SECS").unwrap_or(15),
        };
        let resume = ResumeConfig {
            extractor_url: std::env::var("RESUME_EXTRACTOR_URL")
                .unwrap_or_else(|_| "http://localhost:8090".into()),
            groq_api_key: non_empty("GROQ_API_KEY"),
            groq_base_url: std::env::var("GROQ_BASE_URL")
                .unwrap_or_else(|_| "https://api.groq.com/openai/v1".into()),
            groq_model: std::env::var("GROQ_MODEL").unwrap_or_else(|_| "openai/gpt-oss-20b".into()),
            timeout_secs: parsed("RESUME_TIMEOUT_SECS").unwrap_or(60),
        };
        Ok(Self {
            database_url,
            jwt,
            password,
            admin_creation_secret: non_empty("ADMIN_CREATION_SECRET"),
            search,
            resume,
        })
    }
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

fn non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
