//! Runtime configuration, read from command-line flags or the environment.

use clap::Parser;
use std::net::SocketAddr;

use crate::auth::jwt::DEFAULT_EXPIRY_SECONDS;
use crate::io::google_books::DEFAULT_GOOGLE_BOOKS_URL;

#[derive(Debug, Clone, Parser)]
#[command(name = "bookswap-backend", version, about = "BookSwap lending and trust API")]
pub struct Config {
    /// Address the HTTP server binds to
    #[arg(long, env = "LISTEN", default_value = "127.0.0.1:3000")]
    pub listen: SocketAddr,

    /// SQLite database URL; the file is created when missing
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:bookswap.db")]
    pub database_url: String,

    /// HS256 signing secret, at least 32 bytes. A development secret is used when unset.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value_t = DEFAULT_EXPIRY_SECONDS)]
    pub jwt_expiry_seconds: u64,

    /// Origin allowed by CORS
    #[arg(long, env = "CORS_ORIGIN", default_value = "http://localhost:8080")]
    pub cors_origin: String,

    /// Google Books `volumes` endpoint used by catalog search
    #[arg(long, env = "GOOGLE_BOOKS_URL", default_value = DEFAULT_GOOGLE_BOOKS_URL)]
    pub google_books_url: String,

    #[arg(long, env = "GOOGLE_BOOKS_API_KEY", hide_env_values = true)]
    pub google_books_api_key: Option<String>,

    /// Default log filter; RUST_LOG takes precedence
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}
