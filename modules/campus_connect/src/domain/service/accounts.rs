use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::validation::{normalize_email, required};
use super::{db_err, Service};
use crate::contract::model::{AuthSession, Caller, NewAccount, Role, User};
use crate::domain::error::DomainError;
use crate::domain::repo::UserRecord;

impl Service {
    /// Self-service sign-up for students and faculty. Returns a fresh credential.
    #[instrument(
        name = "campus_connect.service.register_account",
        skip(self, account),
        fields(role = %account.role)
    )]
    pub async fn register_account(&self, account: NewAccount) -> Result<AuthSession, DomainError> {
        if account.role == Role::Admin {
            return Err(DomainError::validation("role", "must be student or faculty"));
        }
        let user = self.create_account(account).await?;
        info!(user_id = %user.id, "account registered");
        self.session_for(user)
    }

    #[instrument(name = "campus_connect.service.login", skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, DomainError> {
        let email = email.trim().to_lowercase();
        let Some(record) = self
            .users
            .find_by_email(&email)
            .await
            .map_err(db_err)?
        else {
            debug!("login for unknown email");
            return Err(DomainError::InvalidLogin);
        };

        let ok = self
            .hasher
            .verify(password, &record.password_hash)
            .await
            .map_err(db_err)?;
        if !ok {
            debug!(user_id = %record.user.id, "login with wrong password");
            return Err(DomainError::InvalidLogin);
        }
        self.session_for(record.user)
    }

    #[instrument(name = "campus_connect.service.current_user", skip(self), fields(user_id = %caller.user_id))]
    pub async fn current_user(&self, caller: &Caller) -> Result<User, DomainError> {
        self.users
            .find_by_id(caller.user_id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::user_not_found(caller.user_id))
    }

    /// Creates the admin account unless the email is already taken.
    /// Returns whether an account was created.
    #[instrument(name = "campus_connect.service.ensure_admin", skip(self, name, password))]
    pub async fn ensure_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<bool, DomainError> {
        let email = normalize_email(email)?;
        if let Some(existing) = self.users.find_by_email(&email).await.map_err(db_err)? {
            if existing.user.role != Role::Admin {
                warn!(user_id = %existing.user.id, "bootstrap admin email belongs to a non-admin account");
            }
            return Ok(false);
        }

        let account = NewAccount {
            name: name.to_string(),
            email,
            password: password.to_string(),
            role: Role::Admin,
        };
        match self.create_account(account).await {
            Ok(user) => {
                info!(user_id = %user.id, "bootstrap admin created");
                Ok(true)
            }
            // Lost a race with another instance creating the same account.
            Err(DomainError::EmailAlreadyExists { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn create_account(&self, account: NewAccount) -> Result<User, DomainError> {
        let name = required("name", &account.name)?;
        let email = normalize_email(&account.email)?;
        self.validate_password(&account.password)?;

        let password_hash = self
            .hasher
            .hash(&account.password)
            .await
            .map_err(db_err)?;

        let user = User {
            id: Uuid::new_v4(),
            name,
            email,
            role: account.role,
            created_at: Utc::now(),
        };
        let inserted = self
            .users
            .insert(UserRecord {
                user: user.clone(),
                password_hash,
            })
            .await
            .map_err(db_err)?;
        if !inserted {
            return Err(DomainError::email_already_exists(user.email));
        }
        Ok(user)
    }

    fn session_for(&self, user: User) -> Result<AuthSession, DomainError> {
        let (token, expires_at) = self.tokens.issue(&user)?;
        Ok(AuthSession {
            token,
            expires_at,
            user,
        })
    }
}
