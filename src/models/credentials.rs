/// Username/password pair for the login endpoint. Never persisted.
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// How requests to the inventory API are authorized
#[derive(Clone, PartialEq)]
pub enum ApiCredential {
    /// Static access key, sent as `Authentication: <key>`
    AccessKey(String),
    /// Session key from `POST /login/`, sent as bearer token and `sessionid` cookie
    SessionKey(String),
}

impl std::fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiCredential::AccessKey(_) => write!(f, "AccessKey(***)"),
            ApiCredential::SessionKey(_) => write!(f, "SessionKey(***)"),
        }
    }
}
