use std::{collections::HashSet, sync::Arc};

use domain::{
    Credentials, DomainError, NewUser, PasswordPolicy, User, UserEmail, UserId, Username,
};
use tracing::{error, info, warn};

use crate::{
    error::ApplicationError,
    lookup::Lookup,
    password::PasswordHasher,
    repository::UserRepository,
    token::{Session, TokenIssuer},
};

#[derive(Debug, Clone)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// 整体替换用户状态，密码会重新哈希
#[derive(Debug, Clone)]
pub struct UpdateUserRequest {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password: String,
}

pub struct UserServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub token_issuer: Arc<dyn TokenIssuer>,
    pub password_policy: PasswordPolicy,
}

pub struct UserService {
    deps: UserServiceDependencies,
}

impl UserService {
    pub fn new(deps: UserServiceDependencies) -> Self {
        Self { deps }
    }

    /// 用户名存在且密码哈希匹配才算成功，其余情况一律 `Authentication`
    pub async fn authenticate(&self, credentials: Credentials) -> Result<User, ApplicationError> {
        let user = self
            .deps
            .user_repository
            .find_by_username(&credentials.username)
            .await?
            .ok_or(ApplicationError::Authentication)?;

        let password_ok = self
            .deps
            .password_hasher
            .verify(&credentials.password, &user.password)
            .await
            .unwrap_or_else(|err| {
                error!(user_id = %user.id, %err, "stored password hash cannot be verified");
                false
            });
        if !password_ok {
            warn!(username = %credentials.username, "password mismatch");
            return Err(ApplicationError::Authentication);
        }

        Ok(user)
    }

    /// 认证并签发会话令牌；认证失败时不会调用令牌签发
    pub async fn login(&self, credentials: Credentials) -> Result<Session, ApplicationError> {
        let user = self.authenticate(credentials).await?;
        let token = self.deps.token_issuer.issue_token(&user)?;
        info!(user_id = %user.id, "user logged in");
        Ok(Session { user, token })
    }

    pub async fn add(&self, request: RegisterUserRequest) -> Result<User, ApplicationError> {
        let username = Username::parse(request.username)?;
        let email = UserEmail::parse(request.email)?;
        self.deps.password_policy.check(&request.password)?;

        let password = self.deps.password_hasher.hash(&request.password).await?;
        let stored = self
            .deps
            .user_repository
            .create(NewUser::new(username, email, password))
            .await?;

        info!(user_id = %stored.id, username = %stored.username, "user registered");
        Ok(stored)
    }

    pub async fn find_all(&self) -> Result<HashSet<User>, ApplicationError> {
        let users = self.deps.user_repository.find_all().await?;
        Ok(users.into_iter().collect())
    }

    pub async fn get_by_username(&self, username: &str) -> Result<User, ApplicationError> {
        self.deps
            .user_repository
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UserNotFound.into())
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Lookup<User>, ApplicationError> {
        if id <= 0 {
            warn!(id, "id must be greater than 0");
            return Ok(Lookup::InvalidKey);
        }

        self.deps
            .user_repository
            .find_by_id(UserId::new(id))
            .await?
            .map(Lookup::Found)
            .ok_or_else(|| DomainError::UserNotFound.into())
    }

    pub async fn remove(&self, id: i32) -> Result<(), ApplicationError> {
        self.deps.user_repository.delete_by_id(UserId::new(id)).await?;
        info!(user_id = id, "user removed");
        Ok(())
    }

    pub async fn update(&self, request: UpdateUserRequest) -> Result<User, ApplicationError> {
        if request.id <= 0 {
            return Err(DomainError::invalid_argument("id", "must be greater than 0").into());
        }
        let username = Username::parse(request.username)?;
        let email = UserEmail::parse(request.email)?;
        self.deps.password_policy.check(&request.password)?;

        let password = self.deps.password_hasher.hash(&request.password).await?;
        let user = User {
            id: UserId::new(request.id),
            username,
            email,
            password,
        };

        Ok(self.deps.user_repository.save(user).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use domain::{PasswordHash, RepositoryError};

    use super::*;
    use crate::{
        password::{MockPasswordHasher, PasswordHasherError},
        repository::MockUserRepository,
        services::test_support::{sample_user, PrefixHasher},
        token::{MockTokenIssuer, TokenError},
    };

    fn service(repo: MockUserRepository, issuer: MockTokenIssuer) -> UserService {
        UserService::new(UserServiceDependencies {
            user_repository: Arc::new(repo),
            password_hasher: Arc::new(PrefixHasher),
            token_issuer: Arc::new(issuer),
            password_policy: PasswordPolicy::default(),
        })
    }

    fn register_request() -> RegisterUserRequest {
        RegisterUserRequest {
            username: "auser".to_string(),
            email: "auser@dat.boi".to_string(),
            password: "Project2Team6!".to_string(),
        }
    }

    #[tokio::test]
    async fn authenticate_success_returns_stored_user() {
        let expected = sample_user(1, "auser", "Project2Team6!");
        let stored = expected.clone();
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username()
            .withf(|username| username == "auser")
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));

        let svc = service(repo, MockTokenIssuer::new());
        let actual = svc
            .authenticate(Credentials::new("auser", "Project2Team6!"))
            .await
            .unwrap();

        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn authenticate_wrong_password_fails() {
        let stored = sample_user(1, "auser", "Project2Team6!");
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username()
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));

        let svc = service(repo, MockTokenIssuer::new());
        let err = svc
            .authenticate(Credentials::new("auser", "wrongpass"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::Authentication));
    }

    #[tokio::test]
    async fn unverifiable_stored_hash_fails_authentication() {
        let stored = sample_user(1, "auser", "Project2Team6!");
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username()
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));
        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_verify()
            .times(1)
            .returning(|_, _| Err(PasswordHasherError::verify_error("invalid hash")));
        let mut issuer = MockTokenIssuer::new();
        issuer.expect_issue_token().never();

        let svc = UserService::new(UserServiceDependencies {
            user_repository: Arc::new(repo),
            password_hasher: Arc::new(hasher),
            token_issuer: Arc::new(issuer),
            password_policy: PasswordPolicy::default(),
        });
        let err = svc
            .login(Credentials::new("auser", "Project2Team6!"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::Authentication));
    }

    #[tokio::test]
    async fn authenticate_unknown_username_fails() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username().times(1).returning(|_| Ok(None));

        let svc = service(repo, MockTokenIssuer::new());
        let err = svc
            .authenticate(Credentials::new("nobody", "Project2Team6!"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::Authentication));
    }

    #[tokio::test]
    async fn login_issues_token_after_successful_authentication() {
        let stored = sample_user(1, "auser", "Project2Team6!");
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username()
            .returning(move |_| Ok(Some(stored.clone())));
        let mut issuer = MockTokenIssuer::new();
        issuer
            .expect_issue_token()
            .withf(|user| user.id == UserId::new(1))
            .times(1)
            .returning(|user| Ok(format!("token-for-{}", user.id)));

        let svc = service(repo, issuer);
        let session = svc
            .login(Credentials::new("auser", "Project2Team6!"))
            .await
            .unwrap();

        assert_eq!(session.token, "token-for-1");
        assert_eq!(session.user.username.as_str(), "auser");
    }

    #[tokio::test]
    async fn failed_login_never_issues_token() {
        let stored = sample_user(1, "auser", "Project2Team6!");
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username()
            .returning(move |_| Ok(Some(stored.clone())));
        let mut issuer = MockTokenIssuer::new();
        issuer.expect_issue_token().never();

        let svc = service(repo, issuer);
        let err = svc
            .login(Credentials::new("auser", "wrongpass"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::Authentication));
    }

    #[tokio::test]
    async fn login_propagates_token_failure() {
        let stored = sample_user(1, "auser", "Project2Team6!");
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username()
            .returning(move |_| Ok(Some(stored.clone())));
        let mut issuer = MockTokenIssuer::new();
        issuer
            .expect_issue_token()
            .returning(|_| Err(TokenError::Issue("signing key unavailable".into())));

        let svc = service(repo, issuer);
        let err = svc
            .login(Credentials::new("auser", "Project2Team6!"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::Token(_)));
    }

    #[tokio::test]
    async fn add_hashes_password_and_returns_assigned_id() {
        let mut repo = MockUserRepository::new();
        repo.expect_create()
            .withf(|new_user| {
                new_user.username.as_str() == "auser"
                    && new_user.password.as_str() == "hashed:Project2Team6!"
            })
            .times(1)
            .returning(|new_user| Ok(new_user.with_id(UserId::new(1))));

        let svc = service(repo, MockTokenIssuer::new());
        let user = svc.add(register_request()).await.unwrap();

        assert_eq!(user.id, UserId::new(1));
        assert_eq!(user.email.as_str(), "auser@dat.boi");
    }

    #[tokio::test]
    async fn add_rejects_invalid_input_without_persisting() {
        let mut repo = MockUserRepository::new();
        repo.expect_create().never();
        let svc = service(repo, MockTokenIssuer::new());

        let mut request = register_request();
        request.username = "1abc".to_string();
        let err = svc.add(request).await.unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::InvalidArgument { ref field, .. }) if field == "username"
        ));

        let mut request = register_request();
        request.password = "weak".to_string();
        let err = svc.add(request).await.unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::InvalidArgument { ref field, .. }) if field == "password"
        ));
    }

    #[tokio::test]
    async fn add_surfaces_uniqueness_conflict_from_persistence() {
        let mut repo = MockUserRepository::new();
        repo.expect_create()
            .returning(|_| Err(RepositoryError::conflict("username already taken")));

        let svc = service(repo, MockTokenIssuer::new());
        let err = svc.add(register_request()).await.unwrap_err();

        assert!(matches!(
            err,
            ApplicationError::Repository(RepositoryError::Conflict { .. })
        ));
    }

    #[tokio::test]
    async fn find_all_deduplicates() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_all().times(1).returning(|| {
            Ok(vec![
                sample_user(1, "auser", "Project2Team6!"),
                sample_user(2, "acarasimon96", "ChunChun~1"),
                sample_user(3, "itshector", "$wappiBo1"),
                sample_user(3, "itshector", "$wappiBo1"),
            ])
        });

        let svc = service(repo, MockTokenIssuer::new());
        let users = svc.find_all().await.unwrap();

        assert_eq!(users.len(), 3);
        assert!(users.contains(&sample_user(2, "acarasimon96", "ChunChun~1")));
    }

    #[tokio::test]
    async fn get_by_username_found_and_missing() {
        let stored = sample_user(1, "auser", "Project2Team6!");
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username()
            .withf(|username| username == "auser")
            .returning(move |_| Ok(Some(stored.clone())));
        repo.expect_find_by_username()
            .withf(|username| username == "ghost")
            .returning(|_| Ok(None));

        let svc = service(repo, MockTokenIssuer::new());
        assert_eq!(
            svc.get_by_username("auser").await.unwrap().username.as_str(),
            "auser"
        );
        let err = svc.get_by_username("ghost").await.unwrap_err();
        assert!(matches!(err, ApplicationError::Domain(DomainError::UserNotFound)));
    }

    #[tokio::test]
    async fn get_by_id_found() {
        let stored = sample_user(1, "auser", "Project2Team6!");
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .withf(|id| *id == UserId::new(1))
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));

        let svc = service(repo, MockTokenIssuer::new());
        let found = svc.get_by_id(1).await.unwrap().into_option().unwrap();
        assert_eq!(found.id, UserId::new(1));
    }

    #[tokio::test]
    async fn get_by_id_non_positive_short_circuits() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().never();

        let svc = service(repo, MockTokenIssuer::new());
        for id in [0, -1, i32::MIN] {
            assert_eq!(svc.get_by_id(id).await.unwrap(), Lookup::InvalidKey);
        }
    }

    #[tokio::test]
    async fn get_by_id_unknown_fails_with_not_found() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().times(1).returning(|_| Ok(None));

        let svc = service(repo, MockTokenIssuer::new());
        let err = svc.get_by_id(42).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn remove_delegates_to_persistence() {
        let mut repo = MockUserRepository::new();
        repo.expect_delete_by_id()
            .withf(|id| *id == UserId::new(1))
            .times(1)
            .returning(|_| Ok(()));
        repo.expect_delete_by_id()
            .withf(|id| *id == UserId::new(99))
            .returning(|_| Err(RepositoryError::NotFound));

        let svc = service(repo, MockTokenIssuer::new());
        svc.remove(1).await.unwrap();
        assert!(svc.remove(99).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn update_round_trip_preserves_id() {
        let mut repo = MockUserRepository::new();
        repo.expect_create()
            .returning(|new_user| Ok(new_user.with_id(UserId::new(1))));
        repo.expect_save().times(2).returning(|user| Ok(user));

        let svc = service(repo, MockTokenIssuer::new());
        let original = svc.add(register_request()).await.unwrap();

        let first = svc
            .update(UpdateUserRequest {
                id: original.id.value(),
                username: "auser".to_string(),
                email: "auser@dat.boi".to_string(),
                password: "someNewPa$$W0rd".to_string(),
            })
            .await
            .unwrap();
        let second = svc
            .update(UpdateUserRequest {
                id: first.id.value(),
                username: "auser".to_string(),
                email: "renamed@dat.boi".to_string(),
                password: "someNewPa$$W0rd".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(second.id, original.id);
        assert_ne!(first.password, original.password);
        assert_eq!(first.password, PasswordHash::new("hashed:someNewPa$$W0rd").unwrap());
        assert_ne!(second.email, original.email);
    }

    #[tokio::test]
    async fn update_rejects_non_positive_id() {
        let mut repo = MockUserRepository::new();
        repo.expect_save().never();

        let svc = service(repo, MockTokenIssuer::new());
        let err = svc
            .update(UpdateUserRequest {
                id: 0,
                username: "auser".to_string(),
                email: "auser@dat.boi".to_string(),
                password: "Project2Team6!".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::Domain(DomainError::InvalidArgument { .. })));
    }
}
