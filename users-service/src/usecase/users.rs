//! The `users` component

use async_trait::async_trait;

use super::crud::DocumentCrud;
use super::UsecaseError;
use crate::adapters::Adapter;
use crate::entity::User;
use crate::pagination::{Page, Pagination};
use crate::registry::Component;

/// User management operations
#[async_trait]
pub trait UsersUsecase: Component + Send + Sync {
    /// One page of users in store order
    async fn get_all(&self, pagination: Pagination) -> Result<Page<User>, UsecaseError>;

    /// Create a user; the id and creation time are assigned by the store
    async fn create(&self, user: User) -> Result<User, UsecaseError>;

    /// Fetch a user by id
    async fn get_by_id(&self, id: &str) -> Result<User, UsecaseError>;

    /// Update name, email and age of the user identified by `user.id`
    async fn update_by_id(&self, user: User) -> Result<User, UsecaseError>;

    /// Delete a user by id
    async fn delete_by_id(&self, id: &str) -> Result<(), UsecaseError>;
}

/// Store-backed [`UsersUsecase`]
///
/// Built zero-valued by the registry factory; usable after [`Component::init`].
#[derive(Default)]
pub struct UsersComponent {
    crud: Option<DocumentCrud<User>>,
}

impl UsersComponent {
    fn crud(&self) -> Result<&DocumentCrud<User>, UsecaseError> {
        self.crud
            .as_ref()
            .ok_or(UsecaseError::NotInitialized(super::USERS))
    }
}

impl Component for UsersComponent {
    fn init(&mut self, adapter: &Adapter) -> Result<(), String> {
        self.crud = Some(DocumentCrud::new(adapter.users.clone()));
        Ok(())
    }
}

#[async_trait]
impl UsersUsecase for UsersComponent {
    async fn get_all(&self, pagination: Pagination) -> Result<Page<User>, UsecaseError> {
        self.crud()?.list(pagination).await
    }

    async fn create(&self, user: User) -> Result<User, UsecaseError> {
        self.crud()?.create(user).await
    }

    async fn get_by_id(&self, id: &str) -> Result<User, UsecaseError> {
        self.crud()?.get_by_id(id).await
    }

    async fn update_by_id(&self, user: User) -> Result<User, UsecaseError> {
        self.crud()?.update_by_id(&user.id, &user).await
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), UsecaseError> {
        self.crud()?.delete_by_id(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDatabase;
    use std::sync::Arc;
    use std::time::Duration;

    fn initialized() -> UsersComponent {
        let adapter = Adapter::with_timeout(
            Arc::new(MemoryDatabase::new()),
            "users",
            Duration::from_secs(5),
        );
        let mut component = UsersComponent::default();
        component.init(&adapter).unwrap();
        component
    }

    fn alice() -> User {
        User {
            name: "Alice Example".to_string(),
            email: "alice@example.com".to_string(),
            age: 30,
            ..User::default()
        }
    }

    #[tokio::test]
    async fn test_operations_fail_before_init() {
        let component = UsersComponent::default();
        let err = component.get_by_id("65f1c0a2b3d4e5f607182930").await.unwrap_err();
        assert_eq!(err, UsecaseError::NotInitialized("users"));
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let users = initialized();
        let created = users.create(alice()).await.unwrap();
        let fetched = users.get_by_id(&created.id).await.unwrap();

        assert_eq!(fetched.name, "Alice Example");
        assert_eq!(fetched.email, "alice@example.com");
        assert_eq!(fetched.age, 30);
    }

    #[tokio::test]
    async fn test_update_uses_id_from_record() {
        let users = initialized();
        let created = users.create(alice()).await.unwrap();

        let updated = users
            .update_by_id(User {
                id: created.id.clone(),
                age: 31,
                ..alice()
            })
            .await
            .unwrap();
        assert_eq!(updated.age, 31);

        let page = users.get_all(Pagination::default()).await.unwrap();
        assert_eq!(page.items.len(), 1);

        users.delete_by_id(&created.id).await.unwrap();
        assert!(users.get_all(Pagination::default()).await.unwrap().items.is_empty());
    }
}
