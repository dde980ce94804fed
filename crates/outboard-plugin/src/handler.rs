//! Host-side component handler.
//!
//! The edit controller reports user edits here. Edits accumulate in a
//! pending batch until the next processing call drains them, so the audio
//! side sees one logical automation stream no matter how many realtime
//! instances replay it.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{CallResult, ResultCode};
use crate::protocol::ParameterChanges;

/// Restart request flags a plugin may raise through the handler.
pub mod restart {
    pub const RELOAD_COMPONENT: u32 = 1 << 0;
    pub const IO_CHANGED: u32 = 1 << 1;
    pub const PARAM_VALUES_CHANGED: u32 = 1 << 2;
    pub const LATENCY_CHANGED: u32 = 1 << 3;
}

#[derive(Default)]
struct HandlerState {
    pending: Option<ParameterChanges>,
    editing: Vec<u32>,
    restart_flags: u32,
}

#[derive(Default)]
pub struct ComponentHandler {
    state: Mutex<HandlerState>,
}

impl ComponentHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn begin_edit(&self, param_id: u32) -> CallResult {
        let mut state = self.state.lock();
        if !state.editing.contains(&param_id) {
            state.editing.push(param_id);
        }
        Ok(())
    }

    /// Record a normalized value for the next processing call.
    pub fn perform_edit(&self, param_id: u32, value: f64) -> CallResult {
        if !(0.0..=1.0).contains(&value) {
            return Err(ResultCode::InvalidArgument);
        }
        let mut state = self.state.lock();
        state
            .pending
            .get_or_insert_with(ParameterChanges::new)
            .add_change(param_id, 0, value);
        Ok(())
    }

    pub fn end_edit(&self, param_id: u32) -> CallResult {
        let mut state = self.state.lock();
        match state.editing.iter().position(|id| *id == param_id) {
            Some(index) => {
                state.editing.swap_remove(index);
                Ok(())
            }
            None => Err(ResultCode::False),
        }
    }

    pub fn is_editing(&self, param_id: u32) -> bool {
        self.state.lock().editing.contains(&param_id)
    }

    pub fn restart_component(&self, flags: u32) -> CallResult {
        self.state.lock().restart_flags |= flags;
        Ok(())
    }

    pub fn take_restart_flags(&self) -> u32 {
        std::mem::take(&mut self.state.lock().restart_flags)
    }

    /// Drain the batch accumulated since the last call.
    ///
    /// Returns `None` when no edit happened in between.
    pub fn pending_changes(&self) -> Option<Arc<ParameterChanges>> {
        self.state.lock().pending.take().map(Arc::new)
    }

    pub fn has_pending_changes(&self) -> bool {
        self.state.lock().pending.is_some()
    }

    /// Discard pending edits without delivering them.
    pub fn flush(&self) {
        self.state.lock().pending = None;
    }
}
