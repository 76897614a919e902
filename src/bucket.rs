//! Fixed-size buckets of fingerprint/value slots.

use crate::fingerprint::Fingerprint;

/// One storage cell. Empty when its fingerprint is the empty marker.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Slot {
    fingerprint: Fingerprint,
    value: f64,
}

impl Slot {
    fn empty(fingerprint_len: usize) -> Self {
        Self {
            fingerprint: Fingerprint::empty(fingerprint_len),
            value: 0.0,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.fingerprint.is_empty()
    }

    fn set(&mut self, fingerprint: Fingerprint, value: f64) {
        self.fingerprint = fingerprint;
        self.value = value;
    }
}

/// An ordered group of slots addressed by a single bucket index.
#[derive(Debug, Clone)]
pub(crate) struct Bucket {
    slots: Box<[Slot]>,
}

impl Bucket {
    pub(crate) fn new(bucket_size: usize, fingerprint_len: usize) -> Self {
        Self {
            slots: vec![Slot::empty(fingerprint_len); bucket_size].into_boxed_slice(),
        }
    }

    /// First-fit placement. Returns `false` if every slot is occupied.
    pub(crate) fn add(&mut self, fingerprint: Fingerprint, value: f64) -> bool {
        match self.slots.iter_mut().find(|slot| slot.is_empty()) {
            Some(slot) => {
                slot.set(fingerprint, value);
                true
            }
            None => false,
        }
    }

    pub(crate) fn contains(&self, fingerprint: Fingerprint) -> bool {
        self.slots.iter().any(|slot| slot.fingerprint == fingerprint)
    }

    /// Value of the first slot holding `fingerprint`.
    pub(crate) fn get(&self, fingerprint: Fingerprint) -> Option<f64> {
        self.slots
            .iter()
            .find(|slot| slot.fingerprint == fingerprint)
            .map(|slot| slot.value)
    }

    pub(crate) fn count(&self, fingerprint: Fingerprint) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.fingerprint == fingerprint)
            .count()
    }

    /// Empty the first slot holding `fingerprint`.
    pub(crate) fn delete(&mut self, fingerprint: Fingerprint) -> bool {
        match self
            .slots
            .iter_mut()
            .find(|slot| slot.fingerprint == fingerprint)
        {
            Some(slot) => {
                *slot = Slot::empty(fingerprint.len());
                true
            }
            None => false,
        }
    }

    /// Overwrite slot `position` and hand back whatever it held before.
    pub(crate) fn swap(
        &mut self,
        position: usize,
        fingerprint: Fingerprint,
        value: f64,
    ) -> (Fingerprint, f64) {
        let slot = &mut self.slots[position];
        let previous = (slot.fingerprint, slot.value);
        slot.set(fingerprint, value);
        previous
    }

    pub(crate) fn is_full(&self) -> bool {
        self.slots.iter().all(|slot| !slot.is_empty())
    }

    pub(crate) fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.is_empty()).count()
    }

    /// Empty every slot, returning how many were occupied.
    pub(crate) fn clear(&mut self) -> usize {
        let mut removed = 0;
        for slot in self.slots.iter_mut().filter(|slot| !slot.is_empty()) {
            *slot = Slot::empty(slot.fingerprint.len());
            removed += 1;
        }
        removed
    }
}
