use std::fmt;

/// Credentials for the spreadsheet backend. Public sheets only need an API key; private sheets
/// need an OAuth access token (e.g. minted for a service account).
#[derive(Clone)]
pub enum Creds {
    ApiKey(String),
    AccessToken(String),
}

impl Creds {
    pub fn api_key(key: String) -> Self {
        Self::ApiKey(key)
    }

    pub fn access_token(token: String) -> Self {
        Self::AccessToken(token)
    }
}

impl fmt::Debug for Creds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey(_) => f.debug_tuple("ApiKey").field(&"<hidden>").finish(),
            Self::AccessToken(_) => f.debug_tuple("AccessToken").field(&"<hidden>").finish(),
        }
    }
}
