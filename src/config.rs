//! Server settings, read from the environment (and `.env` if present).

use std::net::SocketAddr;

use time::UtcOffset;

use crate::error::{AgendaError, AgendaResult};

pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@activities.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// The single admin login.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
}

impl Default for AdminCredentials {
    fn default() -> Self {
        Self {
            email: DEFAULT_ADMIN_EMAIL.to_owned(),
            password: DEFAULT_ADMIN_PASSWORD.to_owned(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    /// Postgres connection string; the in-memory store is used without one.
    pub database_url: Option<String>,
    pub admin: AdminCredentials,
    /// The offset calendar days are measured in.
    pub calendar_offset: UtcOffset,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_url: None,
            admin: AdminCredentials::default(),
            calendar_offset: UtcOffset::UTC,
        }
    }
}

impl Config {
    pub fn from_env() -> AgendaResult<Self> {
        dotenv::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AgendaResult<Self> {
        let addr = lookup("AGENDA_ADDR")
            .unwrap_or_else(|| DEFAULT_ADDR.to_owned())
            .parse()
            .map_err(|err| AgendaError::Config(format!("invalid AGENDA_ADDR: {}", err)))?;
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let defaults = AdminCredentials::default();
        let admin = AdminCredentials {
            email: lookup("AGENDA_ADMIN_EMAIL").unwrap_or(defaults.email),
            password: lookup("AGENDA_ADMIN_PASSWORD").unwrap_or(defaults.password),
        };

        let calendar_offset = match lookup("AGENDA_UTC_OFFSET") {
            Some(hours) => parse_offset(&hours)?,
            None => UtcOffset::UTC,
        };

        Ok(Self {
            addr,
            database_url,
            admin,
            calendar_offset,
        })
    }
}

fn parse_offset(hours: &str) -> AgendaResult<UtcOffset> {
    let hours: i8 = hours.trim().parse().map_err(|_| {
        AgendaError::Config(format!("AGENDA_UTC_OFFSET must be whole hours, got {}", hours))
    })?;

    UtcOffset::from_hms(hours, 0, 0)
        .map_err(|err| AgendaError::Config(format!("invalid AGENDA_UTC_OFFSET: {}", err)))
}
