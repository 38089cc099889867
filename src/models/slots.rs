use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::slot::{MAX_DAYS_BEFORE, ReminderSlot};

pub const SLOT_COUNT: usize = 3;

/// Stable position of a slot inside its owner's collection. Positions carry no ordering
/// meaning; they only identify a slot while it is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SlotPosition {
    First,
    Second,
    Third,
}

impl SlotPosition {
    pub const ALL: [SlotPosition; SLOT_COUNT] =
        [SlotPosition::First, SlotPosition::Second, SlotPosition::Third];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Up to three reminder slots belonging to one owner (a person, or the account templates).
/// Any subset of the positions may be populated.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReminderSlots {
    slots: [Option<ReminderSlot>; SLOT_COUNT],
}

impl ReminderSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fills positions in order. Slots beyond the third are dropped.
    pub fn from_slots(slots: impl IntoIterator<Item = ReminderSlot>) -> Self {
        let mut result = Self::new();
        for (position, slot) in SlotPosition::ALL.into_iter().zip(slots) {
            result.set(position, slot);
        }
        result
    }

    pub fn get(&self, position: SlotPosition) -> Option<&ReminderSlot> {
        self.slots[position.index()].as_ref()
    }

    /// Replaces whatever is stored at `position`, returning the previous slot.
    ///
    /// Offsets are not checked against the other slots here; callers offer only
    /// [`ReminderSlots::selectable_days`] to the user.
    pub fn set(&mut self, position: SlotPosition, slot: ReminderSlot) -> Option<ReminderSlot> {
        self.slots[position.index()].replace(slot)
    }

    pub fn clear(&mut self, position: SlotPosition) -> Option<ReminderSlot> {
        self.slots[position.index()].take()
    }

    /// Populated slots with their positions, in position order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotPosition, &ReminderSlot)> {
        SlotPosition::ALL
            .into_iter()
            .filter_map(|position| self.get(position).map(|slot| (position, slot)))
    }

    pub fn count_used(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Populated slots, largest offset first. Equal offsets keep position order.
    pub fn sorted_descending_by_days_before(&self) -> Vec<(SlotPosition, &ReminderSlot)> {
        let mut sorted: Vec<_> = self.iter().collect();
        sorted.sort_by(|(_, a), (_, b)| b.days_before.cmp(&a.days_before));
        sorted
    }

    /// Offsets held by every populated slot except the one at `exclude`.
    /// `None`, or a position holding no slot, yields the offsets of all populated slots.
    pub fn used_days_excluding(&self, exclude: Option<SlotPosition>) -> BTreeSet<u8> {
        self.iter()
            .filter(|(position, _)| Some(*position) != exclude)
            .map(|(_, slot)| slot.days_before.get())
            .collect()
    }

    /// Offsets an editor may offer for the slot at `editing`. The slot's current offset is
    /// always included so that keeping it unchanged stays valid.
    pub fn selectable_days(&self, editing: Option<SlotPosition>) -> Vec<u8> {
        let used = self.used_days_excluding(editing);
        let current = editing
            .and_then(|position| self.get(position))
            .map(|slot| slot.days_before.get());

        (0..=MAX_DAYS_BEFORE)
            .filter(|days| Some(*days) == current || !used.contains(days))
            .collect()
    }
}
