use thiserror::Error;

#[derive(Error, Debug)]
pub enum JinnError {
    // API 錯誤
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Request timed out: {message}")]
    Timeout { message: String },

    #[error("Invalid API response: {message}")]
    Parse { message: String },

    // 密鑰錯誤
    #[error("Key not found: {path}")]
    KeyNotFound { path: String },

    #[error("No usable SSH key for {hostname}: {reason}")]
    KeyResolution { hostname: String, reason: String },

    #[error("Wrong passphrase for key: {path}")]
    InvalidPassphrase { path: String },

    #[error("Invalid key format: {message}")]
    InvalidKeyFormat { message: String },

    // 連線錯誤
    #[error("Bastion {bastion} unreachable: {message}")]
    BastionConnect { bastion: String, message: String },

    // 驗證錯誤
    #[error("Invalid path: {message}")]
    InvalidPath { message: String },

    #[error("Invalid hostname: {hostname}")]
    InvalidHostname { hostname: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Prompt failed: {message}")]
    Prompt { message: String },

    // 系統錯誤
    #[error("IO error: {message}")]
    Io { message: String },

    #[error("Home directory not found")]
    HomeDirNotFound,
}

impl From<std::io::Error> for JinnError {
    fn from(e: std::io::Error) -> Self {
        JinnError::Io {
            message: e.to_string(),
        }
    }
}

impl From<ssh_key::Error> for JinnError {
    fn from(e: ssh_key::Error) -> Self {
        JinnError::InvalidKeyFormat {
            message: e.to_string(),
        }
    }
}

impl From<reqwest::Error> for JinnError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            JinnError::Timeout {
                message: e.to_string(),
            }
        } else if e.is_decode() {
            JinnError::Parse {
                message: e.to_string(),
            }
        } else {
            JinnError::Network {
                message: e.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for JinnError {
    fn from(e: serde_json::Error) -> Self {
        JinnError::Parse {
            message: e.to_string(),
        }
    }
}

impl From<dialoguer::Error> for JinnError {
    fn from(e: dialoguer::Error) -> Self {
        JinnError::Prompt {
            message: e.to_string(),
        }
    }
}

pub type JinnResult<T> = Result<T, JinnError>;

impl JinnError {
    pub fn error_type(&self) -> &'static str {
        match self {
            JinnError::Authentication { .. } => "Authentication",
            JinnError::Network { .. } => "Network",
            JinnError::Timeout { .. } => "Timeout",
            JinnError::Parse { .. } => "Parse",
            JinnError::KeyNotFound { .. } => "KeyNotFound",
            JinnError::KeyResolution { .. } => "KeyResolution",
            JinnError::InvalidPassphrase { .. } => "InvalidPassphrase",
            JinnError::InvalidKeyFormat { .. } => "InvalidKeyFormat",
            JinnError::BastionConnect { .. } => "BastionConnect",
            JinnError::InvalidPath { .. } => "InvalidPath",
            JinnError::InvalidHostname { .. } => "InvalidHostname",
            JinnError::Config { .. } => "Config",
            JinnError::Prompt { .. } => "Prompt",
            JinnError::Io { .. } => "Io",
            JinnError::HomeDirNotFound => "HomeDirNotFound",
        }
    }

    /// Errors that only disqualify a single host; everything else ends the run.
    pub fn is_per_host(&self) -> bool {
        matches!(
            self,
            JinnError::KeyNotFound { .. }
                | JinnError::KeyResolution { .. }
                | JinnError::InvalidPassphrase { .. }
                | JinnError::InvalidKeyFormat { .. }
                | JinnError::BastionConnect { .. }
                | JinnError::InvalidHostname { .. }
        )
    }
}
