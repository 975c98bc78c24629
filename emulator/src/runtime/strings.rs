use std::cmp::Ordering;

use super::fault::FaultKind;
use crate::constants::{Operand, MAX_STRING_LEN, STRING_TABLE_SIZE};

/// Check that a string fits in a string table slot
pub(crate) fn check_length(text: &str) -> Result<(), FaultKind> {
    let length = text.chars().count();
    if length > MAX_STRING_LEN {
        Err(FaultKind::StringTooLong { length })
    } else {
        Ok(())
    }
}

/// Fixed-capacity table of bounded-length strings
///
/// Empty slots read as the empty string.
#[derive(Clone, PartialEq, Eq)]
pub struct StringTable {
    slots: Box<[Option<String>]>,
}

impl Default for StringTable {
    fn default() -> Self {
        Self {
            slots: vec![None; STRING_TABLE_SIZE].into_boxed_slice(),
        }
    }
}

impl std::fmt::Debug for StringTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(
                self.slots
                    .iter()
                    .enumerate()
                    .filter_map(|(i, s)| s.as_ref().map(|s| (i, s))),
            )
            .finish()
    }
}

impl StringTable {
    fn slot(&self, idx: Operand) -> Result<Option<&str>, FaultKind> {
        usize::try_from(idx)
            .ok()
            .and_then(|i| self.slots.get(i))
            .map(Option::as_deref)
            .ok_or(FaultKind::StringIndexOutOfRange(idx))
    }

    /// Get the string in a slot
    ///
    /// # Errors
    ///
    /// Fails with [`FaultKind::StringIndexOutOfRange`] if the index is not in the table.
    pub fn get(&self, idx: Operand) -> Result<&str, FaultKind> {
        Ok(self.slot(idx)?.unwrap_or_default())
    }

    /// Check whether a slot was ever written
    #[must_use]
    pub fn is_empty_slot(&self, idx: Operand) -> bool {
        matches!(self.slot(idx), Ok(None))
    }

    /// Set the string in a slot
    ///
    /// # Errors
    ///
    /// Fails with [`FaultKind::StringIndexOutOfRange`] if the index is not in the table, or with
    /// [`FaultKind::StringTooLong`] if the string has more than 128 characters. The table is left
    /// untouched on error.
    pub fn set(&mut self, idx: Operand, text: &str) -> Result<(), FaultKind> {
        let slot = usize::try_from(idx)
            .ok()
            .and_then(|i| self.slots.get_mut(i))
            .ok_or(FaultKind::StringIndexOutOfRange(idx))?;
        check_length(text)?;
        *slot = Some(text.to_owned());
        Ok(())
    }

    /// Lexicographically compare the strings referenced by two indices
    ///
    /// # Errors
    ///
    /// Fails with [`FaultKind::StringIndexOutOfRange`] if any of the indices is not in the table.
    pub fn compare(&self, a: Operand, b: Operand) -> Result<Ordering, FaultKind> {
        Ok(self.get(a)?.cmp(self.get(b)?))
    }
}
