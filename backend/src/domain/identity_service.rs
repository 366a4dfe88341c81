//! Guardian accounts and sign-in sessions.
//!
//! Passwords are stored as Argon2id PHC strings. Sessions live in memory only
//! and are lost on restart; a session expires after the configured TTL.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use log::{info, warn};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

use crate::domain::commands::identity::{RegisterGuardianCommand, SignInCommand, SignInResult};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::guardian::{Guardian, Session};
use crate::storage::csv::{CsvConnection, GuardianRepository};
use crate::storage::GuardianStorage;

pub const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_DISPLAY_NAME_LENGTH: usize = 100;

fn hash_password(password: &str) -> DomainResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> DomainResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| anyhow::anyhow!("Stored password hash is invalid: {}", e))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("Failed to verify password: {}", e).into()),
    }
}

fn validate_display_name(display_name: &str) -> DomainResult<String> {
    let trimmed = display_name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("Display name cannot be empty"));
    }
    if trimmed.chars().count() > MAX_DISPLAY_NAME_LENGTH {
        return Err(DomainError::validation(format!(
            "Display name cannot exceed {} characters",
            MAX_DISPLAY_NAME_LENGTH
        )));
    }
    Ok(trimmed.to_string())
}

/// Service for guardian registration, sign in and session lookup
#[derive(Clone)]
pub struct IdentityService {
    guardians: GuardianRepository,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    session_ttl: Duration,
}

impl IdentityService {
    pub fn new(connection: CsvConnection, session_ttl: Duration) -> Self {
        Self {
            guardians: GuardianRepository::new(connection),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            session_ttl,
        }
    }

    /// Create a guardian account
    pub async fn register(&self, command: RegisterGuardianCommand) -> DomainResult<Guardian> {
        let email = Guardian::normalize_email(&command.email);
        info!("Registering guardian: {}", email);

        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::validation("A valid email address is required"));
        }
        if command.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(DomainError::validation(format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LENGTH
            )));
        }
        let display_name = validate_display_name(&command.display_name)?;

        let now = Utc::now();
        let guardian = Guardian {
            id: Guardian::generate_id(now),
            email,
            display_name,
            password_hash: hash_password(&command.password)?,
            created_at: now,
        };

        if !self.guardians.insert_guardian(&guardian).await? {
            warn!("Registration rejected, email in use: {}", guardian.email);
            return Err(DomainError::Conflict(format!(
                "An account already exists for {}",
                guardian.email
            )));
        }

        info!("Registered guardian {}", guardian.id);
        Ok(guardian)
    }

    /// Exchange email and password for a session token
    pub async fn sign_in(&self, command: SignInCommand) -> DomainResult<SignInResult> {
        let invalid = || DomainError::Unauthorized("Invalid email or password".to_string());

        let guardian = match self.guardians.find_guardian_by_email(&command.email).await? {
            Some(guardian) => guardian,
            None => {
                warn!("Sign in for unknown email: {}", command.email.trim());
                return Err(invalid());
            }
        };

        if !verify_password(&command.password, &guardian.password_hash)? {
            warn!("Wrong password for guardian {}", guardian.id);
            return Err(invalid());
        }

        let now = Utc::now();
        let session = Session {
            token: format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple()),
            guardian_id: guardian.id.clone(),
            created_at: now,
            expires_at: now + self.session_ttl,
        };

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.retain(|_, s| !s.is_expired(now));
        sessions.insert(session.token.clone(), session.clone());
        drop(sessions);

        info!("Guardian {} signed in", guardian.id);
        Ok(SignInResult { session, guardian })
    }

    /// Resolve a bearer token to its guardian
    pub async fn authenticate(&self, token: &str) -> DomainResult<Guardian> {
        let now = Utc::now();
        let session = {
            let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
            sessions.get(token).cloned()
        };

        let session = match session {
            Some(session) if !session.is_expired(now) => session,
            Some(_) => {
                self.revoke(token);
                return Err(DomainError::Unauthorized("Session has expired".to_string()));
            }
            None => return Err(DomainError::Unauthorized("Not signed in".to_string())),
        };

        match self.guardians.get_guardian(&session.guardian_id).await? {
            Some(guardian) => Ok(guardian),
            None => {
                warn!("Session refers to missing guardian {}", session.guardian_id);
                self.revoke(token);
                Err(DomainError::Unauthorized("Not signed in".to_string()))
            }
        }
    }

    /// Revoke a session. Returns false if the token was unknown.
    pub async fn sign_out(&self, token: &str) -> bool {
        let revoked = self.revoke(token);
        if revoked {
            info!("Session signed out");
        }
        revoked
    }

    pub async fn update_display_name(&self, guardian_id: &str, display_name: &str) -> DomainResult<Guardian> {
        let display_name = validate_display_name(display_name)?;

        let mut guardian = self
            .guardians
            .get_guardian(guardian_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Guardian", guardian_id))?;
        guardian.display_name = display_name;
        self.guardians.update_guardian(&guardian).await?;

        info!("Updated display name of guardian {}", guardian.id);
        Ok(guardian)
    }

    fn revoke(&self, token: &str) -> bool {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.remove(token).is_some()
    }
}
