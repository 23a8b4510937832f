//! Settings read from the environment (and an optional `.env` file).

use crate::AutomationError;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

pub const USERNAME_ENV: &str = "CERNER_USERNAME";
pub const PASSWORD_ENV: &str = "CERNER_PASSWORD";
pub const BASE_URL_ENV: &str = "CERNER_BASE_URL";
pub const DOWNLOAD_PATH_ENV: &str = "DOWNLOAD_PATH";
pub const COORDINATES_ENV: &str = "POWERCHART_COORDINATES";
pub const APP_LINK_ENV: &str = "CERNER_APP_NAME";
pub const BROWSER_ENV: &str = "POWERCHART_BROWSER";
pub const HEADLESS_ENV: &str = "POWERCHART_HEADLESS";

pub const DEFAULT_BASE_URL: &str = "https://trummo.cernerworks.com/Citrix/ProdWeb/";
/// Text of the portal link that downloads the PowerChart launch file.
pub const DEFAULT_APP_LINK: &str = "Powerchart P275 TRUM_MO";

/// Remote-desktop client window hosting PowerChart.
pub const CITRIX_VIEWER: &str = "Citrix Viewer";
/// Helper process running the security sign-in dialog. The name really has
/// three spaces.
pub const CITRIX_HUSK: &str = "Citrix   Husk";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials: Option<Credentials>,
    pub base_url: String,
    pub download_dir: PathBuf,
    pub coordinates_path: Option<PathBuf>,
    pub app_link: String,
    /// Browser used to sign in to the portal; searched for when unset.
    pub browser_path: Option<PathBuf>,
    pub headless: bool,
}

impl Settings {
    /// Load `.env` from the working directory, if there is one.
    pub fn load_dotenv() {
        match dotenvy::dotenv() {
            Ok(path) => info!(".env file found at {}, loading environment variables", path.display()),
            Err(e) => debug!("No .env file loaded: {}", e),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let credentials = match (get(USERNAME_ENV), get(PASSWORD_ENV)) {
            (Some(username), Some(password)) => Some(Credentials { username, password }),
            _ => None,
        };

        let download_dir = get(DOWNLOAD_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(std::env::temp_dir)
                    .join("Downloads")
            });

        Self {
            credentials,
            base_url: get(BASE_URL_ENV).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            download_dir,
            coordinates_path: get(COORDINATES_ENV).map(PathBuf::from),
            app_link: get(APP_LINK_ENV).unwrap_or_else(|| DEFAULT_APP_LINK.to_string()),
            browser_path: get(BROWSER_ENV).map(PathBuf::from),
            headless: get(HEADLESS_ENV).map_or(true, |v| {
                !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no")
            }),
        }
    }

    pub fn require_credentials(&self) -> Result<&Credentials, AutomationError> {
        self.credentials.as_ref().ok_or_else(|| {
            AutomationError::MissingEnvironment(format!(
                "Credentials not found. Please set {USERNAME_ENV} and {PASSWORD_ENV} environment variables."
            ))
        })
    }
}
