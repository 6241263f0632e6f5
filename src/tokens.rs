use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{create_dir_all, File};
use std::mem::take;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{DashboardError, Result};
use crate::store::read_columns;
use crate::timestamp::{format_timestamp, parse_timestamp};

/// Column headers of the tokens table, in file order.
pub const TOKEN_COLUMNS: [&str; 5] = ["token", "role", "company", "expires_at", "created_at"];

/// Number of random bytes behind each token (hex-encoded to twice as many chars).
const TOKEN_BYTES: usize = 8;

/// Dashboard roles, from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Viewer,
    Editor,
    Owner,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Editor => "editor",
            Role::Owner => "owner",
        }
    }

    /// Editors and owners may change orders.
    pub fn can_edit(self) -> bool {
        matches!(self, Role::Editor | Role::Owner)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DashboardError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "viewer" => Ok(Role::Viewer),
            "editor" => Ok(Role::Editor),
            "owner" => Ok(Role::Owner),
            other => Err(DashboardError::InvalidInput(format!(
                "unknown role '{}'",
                other
            ))),
        }
    }
}

/// One row of `tokens.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub token: String,
    pub role: String,
    pub company: String,
    pub expires_at: String,
    pub created_at: String,
}

impl Token {
    /// Role granted by this token. Unrecognised roles grant read-only access.
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or(Role::Viewer)
    }

    /// True when the expiry parses and lies strictly after `now`.
    ///
    /// An unparsable expiry counts as expired.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        match parse_timestamp(&self.expires_at) {
            Some(expires_at) => now < expires_at,
            None => {
                log::warn!(
                    "Rejecting token with malformed expiry '{}'",
                    self.expires_at
                );
                false
            }
        }
    }
}

/// Bearer tokens backed by a CSV file.
///
/// Every call re-reads the file; issuing rewrites it completely, so two
/// concurrent issuers can lose one another's rows.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    path: PathBuf,
}

impl TokenRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TokenRegistry { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an empty tokens file (header only) if there is none yet.
    pub fn ensure_file(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        self.save(&[])
    }

    /// All token rows in file order. A missing file holds no tokens.
    pub fn list(&self) -> Result<Vec<Token>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let rows = read_columns(&self.path, &TOKEN_COLUMNS)?;
        Ok(rows
            .into_iter()
            .map(|mut row| Token {
                token: take(&mut row[0]),
                role: take(&mut row[1]),
                company: take(&mut row[2]),
                expires_at: take(&mut row[3]),
                created_at: take(&mut row[4]),
            })
            .collect())
    }

    /// Issue a token valid for `ttl` from now.
    pub fn issue(&self, role: Role, company: &str, ttl: Duration) -> Result<Token> {
        self.issue_at(role, company, ttl, Utc::now())
    }

    /// Issue a token with an explicit clock.
    pub fn issue_at(
        &self,
        role: Role,
        company: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<Token> {
        if ttl <= Duration::zero() {
            return Err(DashboardError::InvalidInput(
                "token lifetime must be positive".to_string(),
            ));
        }

        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            DashboardError::InvalidInput("token lifetime is too long".to_string())
        })?;
        let token = Token {
            token: generate_token(),
            role: role.to_string(),
            company: company.to_string(),
            expires_at: format_timestamp(expires_at),
            created_at: format_timestamp(now),
        };

        let mut tokens = self.list()?;
        tokens.push(token.clone());
        self.save(&tokens)?;

        log::info!(
            "Issued {} token for '{}' expiring {}",
            token.role,
            token.company,
            token.expires_at
        );
        Ok(token)
    }

    /// Look `token` up and return its row while it is still valid.
    pub fn validate(&self, token: &str) -> Option<Token> {
        self.validate_at(token, Utc::now())
    }

    /// Validate against an explicit clock.
    ///
    /// Returns `None` for an empty token, an unknown token, an expired token
    /// or one whose expiry cannot be parsed. Read errors also yield `None`.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Option<Token> {
        if token.is_empty() {
            return None;
        }

        let tokens = match self.list() {
            Ok(tokens) => tokens,
            Err(e) => {
                log::warn!("Could not read {}: {}", self.path.display(), e);
                return None;
            }
        };

        tokens
            .into_iter()
            .find(|row| row.token == token)
            .filter(|row| row.is_live_at(now))
    }

    fn save(&self, tokens: &[Token]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }

        let file = File::create(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        writer.write_record(TOKEN_COLUMNS)?;
        for token in tokens {
            writer.serialize(token)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Token lifetime from a whole number of hours.
pub fn ttl_from_hours(hours: i64) -> Result<Duration> {
    match Duration::try_hours(hours) {
        Some(ttl) if hours > 0 => Ok(ttl),
        _ => Err(DashboardError::InvalidInput(format!(
            "token lifetime of {} hours is out of range",
            hours
        ))),
    }
}

/// Random lowercase hex string.
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}
