// Meeting rooms and event spaces

use parking_lot::RwLock;
use tracing::error;

use super::{DeleteConfirmation, LoadStatus, PendingDelete};
use crate::api::BookingApi;
use crate::error::{Error, Result};
use crate::models::MeetingEvent;
use crate::pagination::{total_pages, ListQuery};
use crate::validation::{validate_form, MeetingEventForm};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeetingEventState {
    pub items: Vec<MeetingEvent>,
    pub total: u64,
    pub query: ListQuery,
    pub status: LoadStatus,
}

impl MeetingEventState {
    pub fn total_pages(&self) -> u64 {
        total_pages(self.total, self.query.limit)
    }
}

pub struct MeetingEventStore {
    api: BookingApi,
    state: RwLock<MeetingEventState>,
}

impl MeetingEventStore {
    pub fn new(api: BookingApi) -> Self {
        Self {
            api,
            state: RwLock::new(MeetingEventState::default()),
        }
    }

    pub fn snapshot(&self) -> MeetingEventState {
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

    pub async fn fetch_meetings_events(&self) -> Result<()> {
        let query = {
            let mut state = self.state.write();
            state.status.start();
            state.query.clone()
        };

        match self.api.list_meetings_events(&query).await {
            Ok(page) => {
                let mut state = self.state.write();
                state.items = page.items;
                state.total = page.total;
                state.status.succeed();
                Ok(())
            }
            Err(e) => {
                let e = Error::from(e);
                error!(error = %e, "fetch meetings and events failed");
                self.fail(&e, "Failed to fetch meetings and events");
                Err(e)
            }
        }
    }

    pub async fn create_meeting_event(&self, form: &MeetingEventForm) -> Result<MeetingEvent> {
        validate_form(form)?;

        let created = self.api.create_meeting_event(form).await.map_err(|e| {
            let e = Error::from(e);
            error!(error = %e, "create meeting/event failed");
            self.fail(&e, "Failed to create meeting/event");
            e
        })?;

        let _ = self.fetch_meetings_events().await;
        Ok(created)
    }

    pub async fn update_meeting_event(
        &self,
        id: i64,
        form: &MeetingEventForm,
    ) -> Result<MeetingEvent> {
        validate_form(form)?;

        let updated = self
            .api
            .update_meeting_event(id, form)
            .await
            .map_err(|e| {
                let e = Error::from(e);
                error!(id, error = %e, "update meeting/event failed");
                self.fail(&e, "Failed to update meeting/event");
                e
            })?;

        let _ = self.fetch_meetings_events().await;
        Ok(updated)
    }

    pub fn request_delete(&self, id: i64) -> PendingDelete<MeetingEvent> {
        PendingDelete::new(id)
    }

    pub async fn delete_meeting_event(
        &self,
        confirmation: DeleteConfirmation<MeetingEvent>,
    ) -> Result<()> {
        let id = confirmation.id();
        self.api.delete_meeting_event(id).await.map_err(|e| {
            let e = Error::from(e);
            error!(id, error = %e, "delete meeting/event failed");
            self.fail(&e, "Failed to delete meeting/event");
            e
        })?;

        let _ = self.fetch_meetings_events().await;
        Ok(())
    }
}
