use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        claims::Role,
        password::{Hasher, PasswordError},
        repo::{InsertUserError, UserRepo},
        repo_types::{NewUser, User},
    },
    error::AppError,
};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("User with this email already exists")]
    DuplicateEmail,
    #[error("Password must be at least 6 characters")]
    WeakPassword,
    #[error("Please provide a valid email")]
    InvalidEmail,
    #[error("Please provide {0}")]
    MissingField(&'static str),
    #[error("Admin accounts cannot be created through signup")]
    AdminSignupForbidden,
    #[error("User not found")]
    UnknownUser,
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl From<CredentialError> for AppError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::UnknownUser => AppError::not_found(e.to_string()),
            CredentialError::Password(inner) => AppError::Internal(inner.into()),
            CredentialError::Store(inner) => AppError::Internal(inner),
            other => AppError::validation(other.to_string()),
        }
    }
}

/// Outcome of admin provisioning: a brand-new account or an elevated one.
#[derive(Debug)]
pub enum Provisioned {
    Created(User),
    Elevated(User),
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Identity lookups and credential checks over a `UserRepo`.
#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserRepo>,
    hasher: Hasher,
}

impl CredentialStore {
    pub fn new(users: Arc<dyn UserRepo>, hasher: Hasher) -> Self {
        Self { users, hasher }
    }

    fn validate_new(name: &str, email: &str, password: &str) -> Result<(), CredentialError> {
        if name.trim().is_empty() {
            return Err(CredentialError::MissingField("a name"));
        }
        if email.is_empty() {
            return Err(CredentialError::MissingField("an email"));
        }
        if password.is_empty() {
            return Err(CredentialError::MissingField("a password"));
        }
        if !is_valid_email(email) {
            return Err(CredentialError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CredentialError::WeakPassword);
        }
        Ok(())
    }

    pub async fn create_identity(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User, CredentialError> {
        let email = normalize_email(email);
        Self::validate_new(name, &email, password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            warn!(%email, "email already registered");
            return Err(CredentialError::DuplicateEmail);
        }

        let password_hash = self.hasher.hash(password)?;
        let user = self
            .users
            .insert(NewUser {
                name: name.trim().to_string(),
                email,
                password_hash,
                role,
            })
            .await
            .map_err(|e| match e {
                InsertUserError::DuplicateEmail => CredentialError::DuplicateEmail,
                InsertUserError::Other(e) => CredentialError::Store(e),
            })?;

        info!(user_id = %user.id, email = %user.email, role = %user.role, "identity created");
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, CredentialError> {
        Ok(self.users.find_by_email(&normalize_email(email)).await?)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, CredentialError> {
        Ok(self.users.find_by_id(id).await?)
    }

    /// `None` for unknown email, wrong password or an unreadable stored hash;
    /// the caller cannot tell these apart.
    pub async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, CredentialError> {
        let email = normalize_email(email);
        let Some(user) = self.users.find_by_email(&email).await? else {
            debug!(%email, "login unknown email");
            return Ok(None);
        };

        match self.hasher.verify(password, &user.password_hash) {
            Ok(true) => Ok(Some(user)),
            Ok(false) => {
                debug!(user_id = %user.id, "login invalid password");
                Ok(None)
            }
            Err(e) => {
                error!(error = %e, user_id = %user.id, "stored password hash unreadable");
                Ok(None)
            }
        }
    }

    /// Idempotent: an existing admin is returned as-is.
    pub async fn promote_to_admin(&self, email: &str) -> Result<User, CredentialError> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or(CredentialError::UnknownUser)?;
        if user.role == Role::Admin {
            return Ok(user);
        }
        let user = self.users.set_role(user.id, Role::Admin).await?;
        info!(user_id = %user.id, "user promoted to admin");
        Ok(user)
    }

    /// Creates an admin account, or elevates the existing account with this
    /// email. The supplied password is validated but never replaces the
    /// stored hash of an existing account.
    pub async fn provision_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Provisioned, CredentialError> {
        Self::validate_new(name, &normalize_email(email), password)?;

        if self.find_by_email(email).await?.is_some() {
            return self.promote_to_admin(email).await.map(Provisioned::Elevated);
        }

        match self.create_identity(name, email, password, Role::Admin).await {
            Ok(user) => Ok(Provisioned::Created(user)),
            // lost a race with a concurrent signup
            Err(CredentialError::DuplicateEmail) => {
                self.promote_to_admin(email).await.map(Provisioned::Elevated)
            }
            Err(e) => Err(e),
        }
    }
}
