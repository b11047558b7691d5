// Room type catalog: admin listing, detail view and the booking catalog

use parking_lot::RwLock;
use tracing::error;

use super::{DeleteConfirmation, LoadStatus, PendingDelete};
use crate::api::BookingApi;
use crate::error::{Error, Result};
use crate::models::RoomType;
use crate::pagination::{total_pages, ListQuery};
use crate::validation::{validate_form, RoomForm};

pub const ROOMS_PER_PAGE: u32 = 5;
// The booking flow needs every room type, not one admin page of them
pub const CATALOG_LIMIT: u32 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct RoomState {
    pub rooms: Vec<RoomType>,
    pub room: Option<RoomType>,
    pub catalog: Vec<RoomType>,
    pub total: u64,
    pub query: ListQuery,
    pub status: LoadStatus,
}

impl Default for RoomState {
    fn default() -> Self {
        Self {
            rooms: Vec::new(),
            room: None,
            catalog: Vec::new(),
            total: 0,
            query: ListQuery::with_limit(ROOMS_PER_PAGE),
            status: LoadStatus::default(),
        }
    }
}

impl RoomState {
    pub fn total_pages(&self) -> u64 {
        total_pages(self.total, self.query.limit)
    }
}

pub struct RoomStore {
    api: BookingApi,
    state: RwLock<RoomState>,
}

impl RoomStore {
    pub fn new(api: BookingApi) -> Self {
        Self {
            api,
            state: RwLock::new(RoomState::default()),
        }
    }

    pub fn snapshot(&self) -> RoomState {
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

    pub async fn fetch_rooms(&self) -> Result<()> {
        let query = {
            let mut state = self.state.write();
            state.status.start();
            state.query.clone()
        };

        match self.api.list_rooms(&query).await {
            Ok(page) => {
                let mut state = self.state.write();
                state.rooms = page.items;
                state.total = page.total;
                state.status.succeed();
                Ok(())
            }
            Err(e) => {
                let e = Error::from(e);
                error!(error = %e, "fetch rooms failed");
                self.fail(&e, "Failed to fetch rooms");
                Err(e)
            }
        }
    }

    // Every room type, for intersecting with availability results
    pub async fn fetch_catalog(&self) -> Result<Vec<RoomType>> {
        self.state.write().status.start();

        match self.api.list_rooms(&ListQuery::with_limit(CATALOG_LIMIT)).await {
            Ok(page) => {
                let mut state = self.state.write();
                state.catalog = page.items.clone();
                state.status.succeed();
                Ok(page.items)
            }
            Err(e) => {
                let e = Error::from(e);
                error!(error = %e, "fetch room catalog failed");
                self.fail(&e, "Failed to fetch rooms");
                Err(e)
            }
        }
    }

    pub async fn fetch_room_by_id(&self, id: i64) -> Result<RoomType> {
        {
            let mut state = self.state.write();
            state.status.start();
            state.room = None;
        }

        match self.api.get_room(id).await {
            Ok(room) => {
                let mut state = self.state.write();
                state.room = Some(room.clone());
                state.status.succeed();
                Ok(room)
            }
            Err(e) => {
                let e = Error::from(e);
                error!(id, error = %e, "fetch room failed");
                self.fail(&e, "Failed to fetch room details");
                Err(e)
            }
        }
    }

    pub async fn create_room(&self, form: &RoomForm) -> Result<RoomType> {
        validate_form(form)?;

        let created = self.api.create_room(form).await.map_err(|e| {
            let e = Error::from(e);
            error!(error = %e, "create room failed");
            self.fail(&e, "Failed to create room");
            e
        })?;

        self.refresh_after_change().await;
        Ok(created)
    }

    pub async fn update_room(&self, id: i64, form: &RoomForm) -> Result<RoomType> {
        validate_form(form)?;

        let updated = self.api.update_room(id, form).await.map_err(|e| {
            let e = Error::from(e);
            error!(id, error = %e, "update room failed");
            self.fail(&e, "Failed to update room");
            e
        })?;

        {
            let mut state = self.state.write();
            if state.room.as_ref().map_or(false, |r| r.id == id) {
                state.room = Some(updated.clone());
            }
        }
        self.refresh_after_change().await;
        Ok(updated)
    }

    pub fn request_delete(&self, id: i64) -> PendingDelete<RoomType> {
        PendingDelete::new(id)
    }

    pub async fn delete_room(&self, confirmation: DeleteConfirmation<RoomType>) -> Result<()> {
        let id = confirmation.id();
        self.api.delete_room(id).await.map_err(|e| {
            let e = Error::from(e);
            error!(id, error = %e, "delete room failed");
            self.fail(&e, "Failed to delete room");
            e
        })?;

        {
            let mut state = self.state.write();
            if state.room.as_ref().map_or(false, |r| r.id == id) {
                state.room = None;
            }
            state.catalog.retain(|r| r.id != id);
        }
        self.refresh_after_change().await;
        Ok(())
    }

    // Reload the admin page, plus the catalog once something has loaded it
    async fn refresh_after_change(&self) {
        let _ = self.fetch_rooms().await;
        let catalog_loaded = !self.state.read().catalog.is_empty();
        if catalog_loaded {
            let _ = self.fetch_catalog().await;
        }
    }
}
