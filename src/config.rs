use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub upload_dir: String,
    pub public_upload_path: String,
    /// Bearer token required on mutating routes. Empty disables the check.
    pub api_token: String,
    pub max_page_size: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "ster.db".to_string()),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            public_upload_path: env::var("PUBLIC_UPLOAD_PATH")
                .unwrap_or_else(|_| "/uploads".to_string()),
            api_token: env::var("API_TOKEN").unwrap_or_default(),
            max_page_size: env::var("MAX_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(100),
        }
    }
}
