//! Configuración del servidor a partir de variables de entorno (`.env` opcional).

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::{info, warn};

/// Extensiones aceptadas para materiales de curso.
pub const ALLOWED_EXTENSIONS: &[&str] = &[".pdf", ".docx", ".pptx", ".xlsx", ".zip"];

/// MIME types aceptados para materiales de curso.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/zip",
    "application/x-zip-compressed",
];

/// Los apuntes de clase solo admiten PDF y DOCX.
pub const NOTE_EXTENSIONS: &[&str] = &[".pdf", ".docx"];

pub const MAX_FILE_NAME_LENGTH: usize = 120;

const DEFAULT_SESSION_SECRET: &str = "instructor-material-upload-secret-key";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub max_file_size_mb: u64,
    pub notifications_enabled: bool,
    pub storage_path: PathBuf,
    pub tmp_path: PathBuf,
    pub database_path: PathBuf,
    pub session_secret: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_file_size_mb: 100,
            notifications_enabled: false,
            storage_path: PathBuf::from("./storage"),
            tmp_path: PathBuf::from("./storage/tmp"),
            database_path: PathBuf::from("./data/portal.sqlite"),
            session_secret: DEFAULT_SESSION_SECRET.to_string(),
        }
    }
}

impl Config {
    /// Lee la configuración del entorno. Los valores inválidos vuelven al
    /// default con un warning en lugar de abortar.
    pub fn from_env() -> Self {
        let _ = dotenv::dotenv();
        let defaults = Self::default();

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: try_load("PORT", defaults.port),
            max_file_size_mb: try_load("MAX_FILE_MB", defaults.max_file_size_mb),
            notifications_enabled: env::var("NOTIFICATIONS_ENABLED")
                .map(|v| v == "true")
                .unwrap_or(false),
            storage_path: env::var("STORAGE_PATH").map(PathBuf::from).unwrap_or(defaults.storage_path),
            tmp_path: env::var("TMP_PATH").map(PathBuf::from).unwrap_or(defaults.tmp_path),
            database_path: env::var("DATABASE_PATH").map(PathBuf::from).unwrap_or(defaults.database_path),
            session_secret: env::var("SESSION_SECRET").unwrap_or(defaults.session_secret),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    /// Clave de firma para la cookie de sesión. `Key::from` exige al menos
    /// 64 bytes, así que el secreto se repite hasta completarlos.
    pub fn session_key_bytes(&self) -> Vec<u8> {
        let seed = if self.session_secret.is_empty() {
            DEFAULT_SESSION_SECRET.as_bytes()
        } else {
            self.session_secret.as_bytes()
        };
        seed.iter().copied().cycle().take(seed.len().max(64)).collect()
    }
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(e) => {
                warn!("Invalid {key} value '{raw}': {e}, using default {default}");
                default
            }
        },
        Err(_) => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}
