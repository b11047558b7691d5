// Users: admin user management plus the signed-in user's own account

use parking_lot::RwLock;
use tracing::{error, info};

use super::{DeleteConfirmation, LoadStatus, PendingDelete};
use crate::api::BookingApi;
use crate::error::{Error, Result};
use crate::models::{Role, User};
use crate::pagination::{total_pages, ListQuery};
use crate::validation::{validate_form, AccountForm, NewUserForm, UserUpdateForm};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserState {
    pub users: Vec<User>,
    pub current_user: Option<User>,
    pub total: u64,
    pub query: ListQuery,
    pub status: LoadStatus,
}

impl UserState {
    pub fn total_pages(&self) -> u64 {
        total_pages(self.total, self.query.limit)
    }
}

pub struct UserStore {
    api: BookingApi,
    state: RwLock<UserState>,
}

impl UserStore {
    pub fn new(api: BookingApi) -> Self {
        Self {
            api,
            state: RwLock::new(UserState::default()),
        }
    }

    pub fn snapshot(&self) -> UserState {
        self.state.read().clone()
    }

    pub fn set_page(&self, page: u32) {
        self.state.write().query.set_page(page);
    }

    pub fn set_search(&self, search: &str) {
        self.state.write().query.set_search(search);
    }

    fn fail(&self, e: &Error, fallback: &str) {
        self.state.write().status.fail(e.user_message(fallback));
    }

    pub async fn fetch_users(&self) -> Result<()> {
        let query = {
            let mut state = self.state.write();
            state.status.start();
            state.query.clone()
        };

        match self.api.list_users(&query).await {
            Ok(page) => {
                let mut state = self.state.write();
                state.users = page.items;
                state.total = page.total;
                state.status.succeed();
                Ok(())
            }
            Err(e) => {
                let e = Error::from(e);
                error!(error = %e, "fetch users failed");
                self.fail(&e, "Failed to fetch users");
                Err(e)
            }
        }
    }

    pub async fn create_user(&self, form: &NewUserForm) -> Result<User> {
        validate_form(form)?;

        let user = self.api.create_user(form).await.map_err(|e| {
            let e = Error::from(e);
            error!(error = %e, "create user failed");
            self.fail(&e, "Failed to create user");
            e
        })?;

        info!(user_id = user.id, role = %user.role, "user created");
        let _ = self.fetch_users().await;
        Ok(user)
    }

    pub async fn update_user(&self, id: i64, form: &UserUpdateForm) -> Result<User> {
        validate_form(form)?;

        let user = self.api.update_user(id, form).await.map_err(|e| {
            let e = Error::from(e);
            error!(id, error = %e, "update user failed");
            self.fail(&e, "Failed to update user");
            e
        })?;

        let _ = self.fetch_users().await;
        Ok(user)
    }

    pub async fn update_user_role(&self, id: i64, role: Role) -> Result<()> {
        self.api.update_user_role(id, role).await.map_err(|e| {
            let e = Error::from(e);
            error!(id, error = %e, "update user role failed");
            self.fail(&e, "Failed to update user role");
            e
        })?;

        info!(id, %role, "user role changed");
        let _ = self.fetch_users().await;
        Ok(())
    }

    pub fn request_delete(&self, id: i64) -> PendingDelete<User> {
        PendingDelete::new(id)
    }

    pub async fn delete_user(&self, confirmation: DeleteConfirmation<User>) -> Result<()> {
        let id = confirmation.id();
        self.api.delete_user(id).await.map_err(|e| {
            let e = Error::from(e);
            error!(id, error = %e, "delete user failed");
            self.fail(&e, "Failed to delete user");
            e
        })?;

        let _ = self.fetch_users().await;
        Ok(())
    }

    pub async fn fetch_current_user(&self) -> Result<User> {
        self.state.write().status.start();

        match self.api.current_user().await {
            Ok(user) => {
                let mut state = self.state.write();
                state.current_user = Some(user.clone());
                state.status.succeed();
                Ok(user)
            }
            Err(e) => {
                let e = Error::from(e);
                error!(error = %e, "fetch current user failed");
                self.fail(&e, "Failed to fetch profile");
                Err(e)
            }
        }
    }

    /// Save the signed-in user's own details. A blank password is dropped
    /// so the stored one is kept.
    pub async fn update_current_user(&self, form: AccountForm) -> Result<User> {
        let form = form.normalized();
        validate_form(&form)?;
        self.state.write().status.start();

        match self.api.update_current_user(&form).await {
            Ok(user) => {
                let mut state = self.state.write();
                state.current_user = Some(user.clone());
                state.status.succeed();
                Ok(user)
            }
            Err(e) => {
                let e = Error::from(e);
                error!(error = %e, "update profile failed");
                self.fail(&e, "Failed to update profile");
                Err(e)
            }
        }
    }
}
