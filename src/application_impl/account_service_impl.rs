use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;
use uuid::Uuid;

pub struct RealAccountService {
    user_repo: Arc<dyn UserRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
}

impl RealAccountService {
    pub fn new(user_repo: Arc<dyn UserRepo>, credential_hasher: Arc<dyn CredentialHasher>) -> Self {
        Self {
            user_repo,
            credential_hasher,
        }
    }

    fn require_fields(fields: &[(&str, &str)]) -> Result<(), AuthError> {
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(AuthError::Validation(format!("{name} is required")));
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl AccountService for RealAccountService {
    async fn register(&self, request: RegisterInput) -> Result<PublicUser, AuthError> {
        Self::require_fields(&[
            ("username", &request.username),
            ("email", &request.email),
            ("full_name", &request.full_name),
            ("password", &request.password),
        ])?;

        let username = request.username.trim().to_lowercase();
        let email = request.email.trim().to_string();

        if self.user_repo.username_exists(&username).await?
            || self.user_repo.email_exists(&email).await?
        {
            return Err(AuthError::UserExists);
        }

        let password_hash = self
            .credential_hasher
            .hash_password(&request.password)
            .await?;
        let user_id = UserId(Uuid::new_v4());

        self.user_repo
            .create(NewUser {
                user_id,
                username,
                email,
                full_name: request.full_name.trim().to_string(),
                avatar_url: request.avatar_url,
                cover_image_url: request.cover_image_url,
                password_hash,
            })
            .await?;

        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::PrincipalNotFound)?;
        Ok(user.into())
    }

    async fn change_password(
        &self,
        user_id: UserId,
        request: ChangePasswordInput,
    ) -> Result<(), AuthError> {
        Self::require_fields(&[
            ("old_password", &request.old_password),
            ("new_password", &request.new_password),
        ])?;

        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::PrincipalNotFound)?;

        let ok = self
            .credential_hasher
            .verify_password(&request.old_password, &user.password_hash)
            .await?;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        let hash = self
            .credential_hasher
            .hash_password(&request.new_password)
            .await?;
        self.user_repo.set_password_hash(user_id, &hash).await
    }

    async fn update_account(
        &self,
        user_id: UserId,
        request: UpdateAccountInput,
    ) -> Result<PublicUser, AuthError> {
        Self::require_fields(&[
            ("username", &request.username),
            ("email", &request.email),
            ("full_name", &request.full_name),
        ])?;

        let current = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::PrincipalNotFound)?;

        let username = request.username.trim().to_lowercase();
        let email = request.email.trim().to_string();

        // Uniqueness checks only for fields that actually change, so a user
        // can resubmit their own current values.
        if username != current.username && self.user_repo.username_exists(&username).await? {
            return Err(AuthError::UserExists);
        }
        if email != current.email && self.user_repo.email_exists(&email).await? {
            return Err(AuthError::UserExists);
        }

        self.user_repo
            .update_profile(user_id, &username, &email, request.full_name.trim())
            .await?;

        let updated = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::PrincipalNotFound)?;
        Ok(updated.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::Argon2PasswordHasher;
    use crate::infra_memory::MemoryStore;

    fn service() -> (RealAccountService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let service = RealAccountService::new(store.clone(), Arc::new(Argon2PasswordHasher));
        (service, store)
    }

    fn register_input(username: &str, email: &str) -> RegisterInput {
        RegisterInput {
            username: username.to_string(),
            email: email.to_string(),
            full_name: "Some Body".to_string(),
            password: "initial-pass".to_string(),
            avatar_url: None,
            cover_image_url: None,
        }
    }

    #[tokio::test]
    async fn register_lowercases_username_and_rejects_duplicates() {
        let (service, _store) = service();

        let user = service
            .register(register_input("Bob", "bob@example.com"))
            .await
            .unwrap();
        assert_eq!(user.username, "bob");

        let dup_name = service
            .register(register_input("bob", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(dup_name, AuthError::UserExists));

        let dup_email = service
            .register(register_input("carol", "bob@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(dup_email, AuthError::UserExists));
    }

    #[tokio::test]
    async fn register_rejects_blank_fields() {
        let (service, _store) = service();

        let err = service
            .register(register_input("  ", "bob@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[tokio::test]
    async fn change_password_requires_matching_old_password() {
        let (service, _store) = service();
        let user = service
            .register(register_input("bob", "bob@example.com"))
            .await
            .unwrap();

        let err = service
            .change_password(
                user.user_id,
                ChangePasswordInput {
                    old_password: "wrong".to_string(),
                    new_password: "next-pass".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        service
            .change_password(
                user.user_id,
                ChangePasswordInput {
                    old_password: "initial-pass".to_string(),
                    new_password: "next-pass".to_string(),
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn update_account_allows_own_values_but_not_taken_ones() {
        let (service, _store) = service();
        let bob = service
            .register(register_input("bob", "bob@example.com"))
            .await
            .unwrap();
        service
            .register(register_input("carol", "carol@example.com"))
            .await
            .unwrap();

        // Resubmitting unchanged values is fine.
        let same = service
            .update_account(
                bob.user_id,
                UpdateAccountInput {
                    username: "bob".to_string(),
                    email: "bob@example.com".to_string(),
                    full_name: "Robert".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(same.full_name, "Robert");

        let taken = service
            .update_account(
                bob.user_id,
                UpdateAccountInput {
                    username: "carol".to_string(),
                    email: "bob@example.com".to_string(),
                    full_name: "Robert".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(taken, AuthError::UserExists));
    }
}
