// Dining venues

use parking_lot::RwLock;
use tracing::error;

use super::{DeleteConfirmation, LoadStatus, PendingDelete};
use crate::api::BookingApi;
use crate::error::{Error, Result};
use crate::models::Dining;
use crate::pagination::{total_pages, ListQuery};
use crate::validation::{validate_form, DiningForm};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiningState {
    pub dinings: Vec<Dining>,
    pub dining: Option<Dining>,
    pub total: u64,
    pub query: ListQuery,
    pub status: LoadStatus,
}

impl DiningState {
    pub fn total_pages(&self) -> u64 {
        total_pages(self.total, self.query.limit)
    }
}

pub struct DiningStore {
    api: BookingApi,
    state: RwLock<DiningState>,
}

impl DiningStore {
    pub fn new(api: BookingApi) -> Self {
        Self {
            api,
            state: RwLock::new(DiningState::default()),
        }
    }

    pub fn snapshot(&self) -> DiningState {
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

    pub async fn fetch_dinings(&self) -> Result<()> {
        let query = {
            let mut state = self.state.write();
            state.status.start();
            state.query.clone()
        };

        match self.api.list_dinings(&query).await {
            Ok(page) => {
                let mut state = self.state.write();
                state.dinings = page.items;
                state.total = page.total;
                state.status.succeed();
                Ok(())
            }
            Err(e) => {
                let e = Error::from(e);
                error!(error = %e, "fetch dinings failed");
                self.fail(&e, "Failed to fetch dinings");
                Err(e)
            }
        }
    }

    pub async fn fetch_dining_by_id(&self, id: i64) -> Result<Dining> {
        self.state.write().status.start();

        match self.api.get_dining(id).await {
            Ok(dining) => {
                let mut state = self.state.write();
                state.dining = Some(dining.clone());
                state.status.succeed();
                Ok(dining)
            }
            Err(e) => {
                let e = Error::from(e);
                error!(id, error = %e, "fetch dining failed");
                self.fail(&e, "Failed to fetch dining");
                Err(e)
            }
        }
    }

    pub async fn create_dining(&self, form: &DiningForm) -> Result<Dining> {
        validate_form(form)?;

        let created = self.api.create_dining(form).await.map_err(|e| {
            let e = Error::from(e);
            error!(error = %e, "create dining failed");
            self.fail(&e, "Failed to create dining");
            e
        })?;

        let _ = self.fetch_dinings().await;
        Ok(created)
    }

    pub async fn update_dining(&self, id: i64, form: &DiningForm) -> Result<Dining> {
        validate_form(form)?;

        let updated = self.api.update_dining(id, form).await.map_err(|e| {
            let e = Error::from(e);
            error!(id, error = %e, "update dining failed");
            self.fail(&e, "Failed to update dining");
            e
        })?;

        let _ = self.fetch_dinings().await;
        Ok(updated)
    }

    pub fn request_delete(&self, id: i64) -> PendingDelete<Dining> {
        PendingDelete::new(id)
    }

    pub async fn delete_dining(&self, confirmation: DeleteConfirmation<Dining>) -> Result<()> {
        let id = confirmation.id();
        self.api.delete_dining(id).await.map_err(|e| {
            let e = Error::from(e);
            error!(id, error = %e, "delete dining failed");
            self.fail(&e, "Failed to delete dining");
            e
        })?;

        let _ = self.fetch_dinings().await;
        Ok(())
    }
}
