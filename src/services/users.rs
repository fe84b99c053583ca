use crate::{
    auth::AuthService,
    entities::{user, User, UserModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Account management: registration, lookup, partial update and soft delete.
#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    auth: Arc<AuthService>,
}

#[derive(Debug, Clone)]
pub struct CreateUserInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug)]
pub struct UserPage {
    pub users: Vec<UserModel>,
    pub total: u64,
}

impl UserService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        auth: Arc<AuthService>,
    ) -> Self {
        Self {
            db,
            event_sender,
            auth,
        }
    }

    /// Registers a new account. The password is stored as an argon2 hash.
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn create_user(&self, input: CreateUserInput) -> Result<UserModel, ServiceError> {
        let taken = User::find()
            .filter(
                user::Column::Username
                    .eq(input.username.clone())
                    .or(user::Column::Email.eq(input.email.clone())),
            )
            .one(&*self.db)
            .await?;

        if taken.is_some() {
            return Err(ServiceError::Conflict(
                "Username or email already exists".to_string(),
            ));
        }

        let hashed = self
            .auth
            .hash_password(&input.password)
            .map_err(|e| ServiceError::HashError(e.to_string()))?;

        let new_user = user::ActiveModel {
            username: Set(input.username),
            email: Set(input.email),
            password: Set(hashed),
            role: Set("user".to_string()),
            is_deleted: Set(false),
            ..Default::default()
        };

        let created = new_user.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::UserCreated(created.id))
            .await;

        info!("Created user {}", created.id);
        Ok(created)
    }

    pub async fn get_user(&self, id: i32) -> Result<UserModel, ServiceError> {
        User::find_by_id(id)
            .filter(user::Column::IsDeleted.eq(false))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, ServiceError> {
        Ok(User::find()
            .filter(user::Column::Email.eq(email))
            .filter(user::Column::IsDeleted.eq(false))
            .one(&*self.db)
            .await?)
    }

    /// All live accounts, unpaginated.
    pub async fn list_all(&self) -> Result<Vec<UserModel>, ServiceError> {
        Ok(User::find()
            .filter(user::Column::IsDeleted.eq(false))
            .order_by_asc(user::Column::Id)
            .all(&*self.db)
            .await?)
    }

    /// Paginated listing with optional username substring search.
    #[instrument(skip(self))]
    pub async fn list_users(
        &self,
        page: u64,
        per_page: u64,
        search: Option<&str>,
    ) -> Result<UserPage, ServiceError> {
        let mut query = User::find().filter(user::Column::IsDeleted.eq(false));

        if let Some(term) = search.filter(|s| !s.is_empty()) {
            query = query.filter(user::Column::Username.contains(term));
        }

        let total = query.clone().count(&*self.db).await?;

        let users = query
            .order_by_asc(user::Column::Id)
            .limit(per_page)
            .offset(page.saturating_sub(1) * per_page)
            .all(&*self.db)
            .await?;

        Ok(UserPage { users, total })
    }

    /// Partial update: only supplied fields change. A new password is
    /// re-hashed before storage.
    #[instrument(skip(self, input))]
    pub async fn update_user(
        &self,
        id: i32,
        input: UpdateUserInput,
    ) -> Result<UserModel, ServiceError> {
        let existing = self.get_user(id).await?;

        if let Some(username) = &input.username {
            let taken = User::find()
                .filter(user::Column::Username.eq(username.clone()))
                .filter(user::Column::Id.ne(id))
                .one(&*self.db)
                .await?;
            if taken.is_some() {
                return Err(ServiceError::Conflict(
                    "Username or email already exists".to_string(),
                ));
            }
        }

        if let Some(email) = &input.email {
            let taken = User::find()
                .filter(user::Column::Email.eq(email.clone()))
                .filter(user::Column::Id.ne(id))
                .one(&*self.db)
                .await?;
            if taken.is_some() {
                return Err(ServiceError::Conflict(
                    "Username or email already exists".to_string(),
                ));
            }
        }

        let mut active: user::ActiveModel = existing.into();
        if let Some(username) = input.username {
            active.username = Set(username);
        }
        if let Some(email) = input.email {
            active.email = Set(email);
        }
        if let Some(password) = input.password {
            let hashed = self
                .auth
                .hash_password(&password)
                .map_err(|e| ServiceError::HashError(e.to_string()))?;
            active.password = Set(hashed);
        }

        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::UserUpdated(updated.id))
            .await;

        Ok(updated)
    }

    /// Soft delete. The row stays in place and is excluded from reads.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: i32) -> Result<(), ServiceError> {
        let existing = self.get_user(id).await?;

        let mut active: user::ActiveModel = existing.into();
        active.is_deleted = Set(true);
        active.update(&*self.db).await?;

        self.event_sender.send_or_log(Event::UserDeleted(id)).await;

        info!("Soft-deleted user {}", id);
        Ok(())
    }
}
