use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_access_ttl_secs: i64,
    pub jwt_refresh_ttl_secs: i64,
    pub cors_origins: Vec<String>,
    pub media_root: PathBuf,
    pub media_url: String,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".into());
        let port = parse_or(&lookup, "PORT", 8080)?;
        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 20)?;
        let jwt_secret =
            lookup("JWT_SECRET").ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set"))?;
        let jwt_access_ttl_secs = parse_or(&lookup, "JWT_ACCESS_TTL_SECS", 300)?;
        let jwt_refresh_ttl_secs = parse_or(&lookup, "JWT_REFRESH_TTL_SECS", 86_400)?;
        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let media_root = PathBuf::from(lookup("MEDIA_ROOT").unwrap_or_else(|| "media".into()));
        let mut media_url = lookup("MEDIA_URL").unwrap_or_else(|| "/media/".into());
        if !media_url.ends_with('/') {
            media_url.push('/');
        }
        let max_upload_bytes = parse_or(&lookup, "MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?;

        Ok(Self {
            host,
            port,
            database_url,
            database_max_connections,
            jwt_secret,
            jwt_access_ttl_secs,
            jwt_refresh_ttl_secs,
            cors_origins,
            media_root,
            media_url,
            max_upload_bytes,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {}: {}", key, e)),
        None => Ok(default),
    }
}
