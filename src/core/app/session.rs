use super::{App, AppError};
use crate::core::message::Message;
use crate::core::session::{Session, SessionId};
use crate::core::session_store::StoreError;

impl App {
    /// Start a fresh session and make it active.
    pub fn new_session(&mut self) -> Result<&Session, AppError> {
        Ok(self.store.create_session()?)
    }

    /// Activate `id` and return its messages.
    pub fn select_session(&mut self, id: &SessionId) -> Result<&[Message], AppError> {
        self.store
            .load_session(id)
            .ok_or_else(|| AppError::Store(StoreError::NotFound(id.clone())))
    }

    /// Activate the session at `index` in the listing (zero-based).
    pub fn select_session_at(&mut self, index: usize) -> Result<&[Message], AppError> {
        let id = self.session_id_at(index)?;
        self.select_session(&id)
    }

    /// Rename a session; blank titles are ignored and reported as `false`.
    pub fn rename_session(&mut self, id: &SessionId, title: &str) -> Result<bool, AppError> {
        Ok(self.store.rename_session(id, title)?)
    }

    pub fn rename_active_session(&mut self, title: &str) -> Result<bool, AppError> {
        let Some(id) = self.store.active_id().cloned() else {
            return Ok(false);
        };
        self.rename_session(&id, title)
    }

    pub fn delete_session(&mut self, id: &SessionId) -> Result<(), AppError> {
        Ok(self.store.delete_session(id)?)
    }

    pub fn delete_session_at(&mut self, index: usize) -> Result<(), AppError> {
        let id = self.session_id_at(index)?;
        self.delete_session(&id)
    }

    pub fn session_id_at(&self, index: usize) -> Result<SessionId, AppError> {
        self.store
            .list_sessions()
            .get(index)
            .map(|session| session.id.clone())
            .ok_or_else(|| {
                AppError::Store(StoreError::NotFound(SessionId::new(format!(
                    "#{}",
                    index + 1
                ))))
            })
    }

    /// Zero-based position of the active session in the listing.
    pub fn active_index(&self) -> Option<usize> {
        let active = self.store.active_id()?;
        self.store
            .list_sessions()
            .iter()
            .position(|session| &session.id == active)
    }
}
