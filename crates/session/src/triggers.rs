//! User-input triggers recorded between checkpoints
//!
//! Triggers are stored relative to the bounds of the last screenshot taken,
//! and dropped when they fall outside of it.

use tracing::debug;
use vizcheck_common::{Location, MouseAction, Region, Trigger};

/// Ordered queue of pending triggers plus the reference bounds used to
/// normalize them
#[derive(Debug, Clone, Default)]
pub struct TriggerRecorder {
    bounds: Option<Region>,
    pending: Vec<Trigger>,
}

impl TriggerRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds of the last screenshot, if a checkpoint has run
    pub fn reference_bounds(&self) -> Option<Region> {
        self.bounds
    }

    pub fn set_reference_bounds(&mut self, bounds: Option<Region>) {
        self.bounds = bounds;
    }

    pub fn pending(&self) -> &[Trigger] {
        &self.pending
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Record a keyboard trigger. Returns whether it was queued.
    pub fn add_keyboard_trigger(&mut self, control: Region, text: &str) -> bool {
        let Some(bounds) = self.bounds else {
            debug!("Ignoring keyboard trigger '{}' (no screenshot)", text);
            return false;
        };

        let control = if control.width > 0 && control.height > 0 {
            let visible = control.intersection(&bounds);
            if visible.is_empty() {
                debug!("Ignoring keyboard trigger '{}' (out of bounds)", text);
                return false;
            }
            match visible.relative_to(bounds.location()) {
                Some(relative) => relative,
                None => {
                    debug!("Ignoring keyboard trigger '{}' (coordinates out of range)", text);
                    return false;
                }
            }
        } else {
            Region::EMPTY
        };

        debug!("Adding keyboard trigger '{}' at {}", text, control);
        self.pending.push(Trigger::Text {
            control,
            text: text.to_string(),
        });
        true
    }

    /// Record a mouse trigger. `cursor` is relative to `control`.
    /// Returns whether it was queued.
    pub fn add_mouse_trigger(&mut self, action: MouseAction, control: Region, cursor: Location) -> bool {
        let Some(bounds) = self.bounds else {
            debug!("Ignoring {:?} (no screenshot)", action);
            return false;
        };

        let Some(cursor) = cursor.offset(control.left as i64, control.top as i64) else {
            debug!("Ignoring {:?} (cursor out of range)", action);
            return false;
        };
        if !bounds.contains(cursor) {
            debug!("Ignoring {:?} at ({}, {}) (out of bounds)", action, cursor.x, cursor.y);
            return false;
        }

        let visible = control.intersection(&bounds);
        let translated = cursor.relative_to(bounds.location()).and_then(|cursor| {
            let control = if visible.is_empty() {
                Region::new(cursor.x, cursor.y, 0, 0)
            } else {
                visible.relative_to(bounds.location())?
            };
            Some((cursor, control))
        });
        let Some((cursor, control)) = translated else {
            debug!("Ignoring {:?} (coordinates out of range)", action);
            return false;
        };

        debug!("Adding {:?} trigger at ({}, {})", action, cursor.x, cursor.y);
        self.pending.push(Trigger::Mouse {
            action,
            control,
            location: cursor,
        });
        true
    }
}
