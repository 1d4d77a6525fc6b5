use std::env;
use std::path::PathBuf;

const DEFAULT_DATABASE_URL: &str = "catcollector.db";
const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5050";
const DEFAULT_S3_BASE_URL: &str = "https://s3.amazonaws.com/";

/// Runtime settings read from the process environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub s3_bucket: Option<String>,
    pub s3_base_url: String,
    pub tls: Option<TlsFiles>,
    pub upload_tmp_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct TlsFiles {
    pub cert_file: String,
    pub key_file: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let tls = match (non_empty("TLS_CERT_FILE"), non_empty("TLS_KEY_FILE")) {
            (Some(cert_file), Some(key_file)) => Some(TlsFiles {
                cert_file,
                key_file,
            }),
            (None, None) => None,
            _ => {
                warn!("TLS_CERT_FILE and TLS_KEY_FILE must be set together; serving plain HTTP");
                None
            }
        };

        Config {
            database_url: non_empty("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            bind_address: non_empty("BIND_ADDRESS")
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            s3_bucket: non_empty("S3_BUCKET"),
            s3_base_url: non_empty("S3_BASE_URL")
                .unwrap_or_else(|| DEFAULT_S3_BASE_URL.to_string()),
            tls,
            upload_tmp_dir: non_empty("UPLOAD_TMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
        }
    }
}
