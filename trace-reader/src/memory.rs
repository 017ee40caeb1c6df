use super::{EventSource, EventView, ReaderError};
use bege_common::EntryIndex;

/// Events held in memory, used by the simulator and in tests.
#[derive(Default, Debug, Clone)]
pub struct InMemorySource {
    events: Vec<EventView>,
}

impl InMemorySource {
    pub fn new(events: Vec<EventView>) -> Self {
        Self { events }
    }

    pub fn push(&mut self, event: EventView) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[EventView] {
        &self.events
    }
}

impl EventSource for InMemorySource {
    fn entry_count(&self) -> usize {
        self.events.len()
    }

    fn entry(&mut self, entry: EntryIndex) -> Result<EventView, ReaderError> {
        self.events
            .get(entry)
            .cloned()
            .ok_or(ReaderError::EntryOutOfRange {
                entry,
                count: self.events.len(),
            })
    }
}

impl FromIterator<EventView> for InMemorySource {
    fn from_iter<T: IntoIterator<Item = EventView>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
