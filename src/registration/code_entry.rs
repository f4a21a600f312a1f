//! Verification code entry widget.
//!
//! A fixed number of single-digit slots. Every mutating handler returns an
//! [`Emission`] carrying the joined value; `complete` is set exactly when
//! every slot holds a digit. Focus changes go through a [`FocusTarget`] so the
//! rendering layer decides what "focus" means.

/// Default number of slots, matching the server's 6-digit codes.
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Capability to move input focus to a slot.
pub trait FocusTarget {
    fn focus_slot(&mut self, index: usize);
}

/// Focus target that just remembers the focused slot for the renderer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SlotCursor {
    index: usize,
}

impl SlotCursor {
    pub fn index(&self) -> usize {
        self.index
    }
}

impl FocusTarget for SlotCursor {
    fn focus_slot(&mut self, index: usize) {
        self.index = index;
    }
}

/// Value published to the parent after a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emission {
    pub value: String,
    pub complete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowDirection {
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct CodeEntry<F: FocusTarget = SlotCursor> {
    slots: Vec<Option<char>>,
    focus: F,
}

impl CodeEntry<SlotCursor> {
    pub fn new(length: usize) -> Self {
        Self::with_focus_target(length, SlotCursor::default())
    }
}

impl Default for CodeEntry<SlotCursor> {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_LENGTH)
    }
}

impl<F: FocusTarget> CodeEntry<F> {
    pub fn with_focus_target(length: usize, focus: F) -> Self {
        Self {
            slots: vec![None; length.max(1)],
            focus,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn slots(&self) -> &[Option<char>] {
        &self.slots
    }

    pub fn focus_target(&self) -> &F {
        &self.focus
    }

    /// Joined non-empty slots, in order.
    pub fn value(&self) -> String {
        self.slots.iter().flatten().collect()
    }

    pub fn is_complete(&self) -> bool {
        let value = self.value();
        value.chars().count() == self.len() && value.chars().all(|c| c.is_ascii_digit())
    }

    fn emit(&self) -> Emission {
        Emission {
            value: self.value(),
            complete: self.is_complete(),
        }
    }

    fn focus_at(&mut self, index: usize) {
        self.focus.focus_slot(index.min(self.len() - 1));
    }

    /// Repopulate from an externally supplied value.
    ///
    /// Values longer than the slot count are ignored and `false` is returned.
    /// Nothing is emitted: the parent already owns this value.
    pub fn set_value(&mut self, value: &str) -> bool {
        if value.chars().count() > self.len() {
            log::debug!("Ignoring code value longer than {} slots", self.len());
            return false;
        }
        let mut chars = value.chars();
        for slot in &mut self.slots {
            *slot = chars.next();
        }
        true
    }

    /// Input arriving in a single slot. Non-numeric input leaves the slot as it was.
    pub fn on_character_entered(&mut self, index: usize, raw: &str) -> Emission {
        if index >= self.len() || !raw.chars().all(|c| c.is_ascii_digit()) {
            return self.emit();
        }

        // A slot holds one digit; if more slipped through, the newest wins.
        let digit = raw.chars().last();
        self.slots[index] = digit;
        if digit.is_some() && index + 1 < self.len() {
            self.focus_at(index + 1);
        }
        self.emit()
    }

    pub fn on_backspace(&mut self, index: usize) -> Emission {
        if index >= self.len() {
            return self.emit();
        }

        if self.slots[index].is_none() && index > 0 {
            self.slots[index - 1] = None;
            self.focus_at(index - 1);
        } else {
            self.slots[index] = None;
        }
        self.emit()
    }

    pub fn on_arrow_key(&mut self, direction: ArrowDirection, index: usize) {
        match direction {
            ArrowDirection::Left if index > 0 => self.focus_at(index - 1),
            ArrowDirection::Right if index + 1 < self.len() => self.focus_at(index + 1),
            _ => {}
        }
    }

    /// Distribute pasted text across the slots, keeping digits only.
    pub fn on_paste(&mut self, text: &str) -> Emission {
        let mut digits = text.chars().filter(char::is_ascii_digit);
        for slot in &mut self.slots {
            *slot = digits.next();
        }

        let target = self
            .slots
            .iter()
            .position(Option::is_none)
            .unwrap_or(self.len() - 1);
        self.focus_at(target);
        self.emit()
    }

    pub fn clear(&mut self) -> Emission {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.focus_at(0);
        self.emit()
    }

    pub fn focus(&mut self) {
        self.focus_at(0);
    }
}
