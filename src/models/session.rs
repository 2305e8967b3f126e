use std::sync::Arc;

use dashmap::DashMap;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::AdminCredentials;
use crate::error::{AgendaError, AgendaResult};

/// The logged-in admin behind a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Admin {
    pub email: String,
    pub token: Uuid,
}

/// Admin logins, keyed by session token. Sessions last until logout or restart.
#[derive(Clone)]
pub struct Sessions {
    credentials: Arc<AdminCredentials>,
    tokens: Arc<DashMap<Uuid, OffsetDateTime>>,
}

impl Sessions {
    pub fn new(credentials: AdminCredentials) -> Self {
        Self {
            credentials: Arc::new(credentials),
            tokens: Arc::new(DashMap::new()),
        }
    }

    /// Checks the admin's email and password, returning a fresh session token.
    pub fn login(&self, email: &str, password: &str) -> AgendaResult<Uuid> {
        if !email.trim().eq_ignore_ascii_case(&self.credentials.email)
            || password != self.credentials.password
        {
            tracing::warn!(email, "rejected admin login");
            return Err(AgendaError::Unauthorized);
        }

        let token = Uuid::new_v4();
        self.tokens.insert(token, OffsetDateTime::now_utc());
        tracing::info!("admin logged in");

        Ok(token)
    }

    /// Ends the session, returning whether it existed.
    pub fn logout(&self, token: Uuid) -> bool {
        self.tokens.remove(&token).is_some()
    }

    pub fn admin_for_token(&self, token: &str) -> AgendaResult<Admin> {
        let token = Uuid::parse_str(token.trim()).map_err(|_| AgendaError::Unauthorized)?;
        if self.tokens.contains_key(&token) {
            Ok(Admin {
                email: self.credentials.email.clone(),
                token,
            })
        } else {
            Err(AgendaError::Unauthorized)
        }
    }
}
