use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::tokens::{Role, TokenRegistry};

/// How the current request got its access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// `?admin=` matched the owner key.
    Owner,
    /// `?token=` matched a live token.
    Client,
    /// Neither; read-only.
    Guest,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Owner => "owner",
            Mode::Client => "client",
            Mode::Guest => "guest",
        }
    }
}

/// Access resolved for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Access {
    pub mode: Mode,
    pub role: Role,
    pub company: String,
}

impl Access {
    pub fn guest(config: &Config) -> Self {
        Access {
            mode: Mode::Guest,
            role: Role::Viewer,
            company: config.client_company.clone(),
        }
    }

    pub fn can_edit(&self) -> bool {
        self.role.can_edit()
    }

    pub fn can_issue_tokens(&self) -> bool {
        self.role == Role::Owner
    }
}

/// Work out the caller's access from the `admin` and `token` parameters.
pub fn resolve(
    config: &Config,
    registry: &TokenRegistry,
    admin: Option<&str>,
    token: Option<&str>,
) -> Access {
    resolve_at(config, registry, admin, token, Utc::now())
}

/// [`resolve`] with an explicit clock for token expiry.
///
/// The owner key is checked first; a token is only consulted when it does not
/// match. A bad token is indistinguishable from no token at all.
pub fn resolve_at(
    config: &Config,
    registry: &TokenRegistry,
    admin: Option<&str>,
    token: Option<&str>,
    now: DateTime<Utc>,
) -> Access {
    if let Some(admin) = admin.filter(|key| !key.is_empty()) {
        if admin == config.owner_key {
            return Access {
                mode: Mode::Owner,
                role: Role::Owner,
                company: config.client_company.clone(),
            };
        }
    }

    if let Some(info) = token.and_then(|t| registry.validate_at(t, now)) {
        let company = if info.company.is_empty() {
            config.client_company.clone()
        } else {
            info.company.clone()
        };
        return Access {
            mode: Mode::Client,
            role: info.role(),
            company,
        };
    }

    Access::guest(config)
}
