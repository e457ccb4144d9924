//! Account lifecycle service.
//!
//! State machine: `PendingActivation` (`active = false`, activation code
//! present) transitions to `Active` (`active = true`, code cleared) when
//! the code is consumed. A changed email returns the account to
//! `PendingActivation` with a fresh code.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use metagram_common::{AppError, AppResult, IdGenerator};
use metagram_db::{
    entities::user::{self, Role, roles_json},
    repositories::{MessageRepository, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::attachment::AttachmentService;
use crate::services::captcha::CaptchaService;
use crate::services::mailer::Mailer;

/// Account lifecycle service.
#[derive(Clone)]
pub struct AccountService {
    user_repo: UserRepository,
    message_repo: MessageRepository,
    attachments: AttachmentService,
    mailer: Mailer,
    captcha: CaptchaService,
    id_gen: IdGenerator,
}

/// Input for registering a new account.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 128))]
    pub username: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(email)]
    pub email: Option<String>,

    /// Captcha response token from the registration form.
    pub captcha_token: String,
}

/// Input for updating one's own profile.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileInput {
    /// New password; empty or absent means no change.
    pub password: Option<String>,

    /// New email; absent means no change.
    #[validate(email)]
    pub email: Option<String>,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub fn new(
        user_repo: UserRepository,
        message_repo: MessageRepository,
        attachments: AttachmentService,
        mailer: Mailer,
        captcha: CaptchaService,
    ) -> Self {
        Self {
            user_repo,
            message_repo,
            attachments,
            mailer,
            captcha,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new account in `PendingActivation`.
    ///
    /// Captcha, field validation, and the duplicate-username check all
    /// run before any state change. The duplicate check is a fast path;
    /// the store's unique index catches registrations racing past it.
    pub async fn register(&self, input: RegisterInput) -> AppResult<user::Model> {
        if !self.captcha.verify(&input.captcha_token).await? {
            return Err(AppError::CaptchaRejected);
        }

        input.validate()?;
        if input.username.trim().is_empty() {
            return Err(AppError::Validation("Please, fill the username.".to_string()));
        }

        if self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::DuplicateUsername(input.username));
        }

        let password_hash = hash_password(&input.password)?;
        let activation_code = self.id_gen.generate_token();

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username),
            password_hash: Set(password_hash),
            email: Set(input.email),
            active: Set(false),
            activation_code: Set(Some(activation_code)),
            roles: Set(roles_json(&[Role::User])),
            ..Default::default()
        };

        let created = self.user_repo.create(model).await?;
        tracing::info!(user_id = %created.id, username = %created.username, "User registered");

        self.send_activation_mail(&created).await;
        Ok(created)
    }

    /// Consume an activation code.
    ///
    /// A miss covers both unknown and already-consumed codes: the code
    /// is cleared on success and can never be reused.
    pub async fn activate(&self, code: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_activation_code(code)
            .await?
            .ok_or(AppError::ActivationCodeNotFound)?;

        let mut active: user::ActiveModel = user.into();
        active.active = Set(true);
        active.activation_code = Set(None);
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        let activated = self.user_repo.update(active).await?;
        tracing::info!(user_id = %activated.id, "User activated");
        Ok(activated)
    }

    /// Authenticate by username and password.
    ///
    /// Both failure modes are collapsed into an opaque failure upstream;
    /// the distinction here exists only for logging and tests.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::UserNotFound(username.to_string()))?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }
        Ok(user)
    }

    /// Update one's own profile (password and/or email).
    ///
    /// A changed email issues a fresh activation code and returns the
    /// account to `PendingActivation`; the verification mail is
    /// fire-and-forget. Passwords are hashed here exactly as on
    /// registration.
    pub async fn update_profile(
        &self,
        user_id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<user::Model> {
        input.validate()?;

        let user = self.user_repo.get_by_id(user_id).await?;
        let email_changed = input.email.is_some() && input.email != user.email;
        let username = user.username.clone();

        let mut active: user::ActiveModel = user.into();
        let mut new_code = None;

        if email_changed {
            active.email = Set(input.email.clone());
            if input.email.as_deref().is_some_and(|e| !e.is_empty()) {
                let code = self.id_gen.generate_token();
                active.active = Set(false);
                active.activation_code = Set(Some(code.clone()));
                new_code = Some(code);
            }
        }

        if let Some(password) = input.password.as_deref().filter(|p| !p.trim().is_empty()) {
            if password.len() < 8 {
                return Err(AppError::Validation("Password too short.".to_string()));
            }
            active.password_hash = Set(hash_password(password)?);
        }

        active.updated_at = Set(Some(chrono::Utc::now().into()));
        let updated = self.user_repo.update(active).await?;

        if let (Some(email), Some(code)) = (updated.email.as_deref(), new_code.as_deref()) {
            if let Err(e) = self.mailer.send_activation(email, &username, code).await {
                tracing::warn!(error = %e, user_id = %updated.id, "Failed to send email-change verification");
            }
        }

        Ok(updated)
    }

    /// Delete an account, cascading over everything it owns.
    ///
    /// Blob-removal failures are logged and do not block the cascade; a
    /// message row that cannot be deleted aborts the whole operation so
    /// that no message ever outlives its author. Likes and subscriptions
    /// fall to the store's foreign-key cascades.
    pub async fn delete_account(&self, user_id: &str) -> AppResult<()> {
        let user = self.user_repo.get_by_id(user_id).await?;

        let messages = self.message_repo.find_all_by_author(&user.id).await?;
        for message in &messages {
            if let Some(ref filename) = message.filename {
                if let Err(e) = self.attachments.remove(filename).await {
                    tracing::warn!(
                        error = %e,
                        message_id = %message.id,
                        filename = %filename,
                        "Failed to remove attachment during account deletion"
                    );
                }
            }
            self.message_repo.delete(&message.id).await.map_err(|e| {
                AppError::CascadeDelete(format!(
                    "message {} could not be deleted: {e}",
                    message.id
                ))
            })?;
        }

        self.user_repo.delete(&user.id).await?;
        tracing::info!(user_id = %user.id, messages = messages.len(), "Account deleted");
        Ok(())
    }

    /// Delete any account. Admin only.
    pub async fn admin_delete_user(&self, actor_id: &str, user_id: &str) -> AppResult<()> {
        self.require_admin(actor_id).await?;
        self.delete_account(user_id).await
    }

    /// Replace a user's role set. Admin only.
    ///
    /// The username is immutable after creation, so this is the whole
    /// admin-edit surface.
    pub async fn set_roles(
        &self,
        actor_id: &str,
        user_id: &str,
        roles: &[Role],
    ) -> AppResult<user::Model> {
        self.require_admin(actor_id).await?;

        let user = self.user_repo.get_by_id(user_id).await?;
        let mut active: user::ActiveModel = user.into();
        active.roles = Set(roles_json(roles));
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// List users (paginated, newest first).
    pub async fn list_users(&self, limit: u64, offset: u64) -> AppResult<Vec<user::Model>> {
        self.user_repo.list(limit, offset).await
    }

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(user_id).await
    }

    async fn require_admin(&self, actor_id: &str) -> AppResult<()> {
        let actor = self.user_repo.get_by_id(actor_id).await?;
        if !actor.is_admin() {
            return Err(AppError::Forbidden("Admin role required".to_string()));
        }
        Ok(())
    }

    async fn send_activation_mail(&self, user: &user::Model) {
        let (Some(email), Some(code)) = (user.email.as_deref(), user.activation_code.as_deref())
        else {
            return;
        };
        if let Err(e) = self.mailer.send_activation(email, &user.username, code).await {
            tracing::warn!(error = %e, user_id = %user.id, "Failed to send activation email");
        }
    }
}

/// Hash a password with argon2.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
