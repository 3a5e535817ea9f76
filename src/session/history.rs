//! Generated thumbnails of the current session, newest first.

use crate::media::EncodedImage;
use serde::{Deserialize, Serialize};

/// Opaque, session-unique identifier of a history entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryId(String);

impl HistoryId {
    /// Creates a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// The identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HistoryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for HistoryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for HistoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A thumbnail together with the subject photo it was made from.
///
/// The original subject never changes after creation; edits only swap
/// `image`, and they always use the original subject as the face reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    id: HistoryId,
    image: EncodedImage,
    original_subject: EncodedImage,
}

impl HistoryEntry {
    /// Creates an entry.
    pub fn new(id: HistoryId, image: EncodedImage, original_subject: EncodedImage) -> Self {
        Self {
            id,
            image,
            original_subject,
        }
    }

    /// Entry identifier.
    pub fn id(&self) -> &HistoryId {
        &self.id
    }

    /// Current thumbnail.
    pub fn image(&self) -> &EncodedImage {
        &self.image
    }

    /// Subject photo used for identity preservation.
    pub fn original_subject(&self) -> &EncodedImage {
        &self.original_subject
    }
}

/// Unbounded, most-recent-first list of entries with unique ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `entry` at the front. Returns false, leaving the history
    /// untouched, if its id is already present.
    pub fn prepend(&mut self, entry: HistoryEntry) -> bool {
        if self.contains(entry.id()) {
            return false;
        }
        self.entries.insert(0, entry);
        true
    }

    /// Removes the entry with `id`, keeping the order of the rest.
    pub fn delete(&mut self, id: &HistoryId) -> Option<HistoryEntry> {
        let pos = self.entries.iter().position(|e| e.id() == id)?;
        Some(self.entries.remove(pos))
    }

    /// Swaps the thumbnail of entry `id`. Returns false if it does not exist.
    pub(crate) fn replace_image(&mut self, id: &HistoryId, image: EncodedImage) -> bool {
        match self.entries.iter_mut().find(|e| e.id() == id) {
            Some(entry) => {
                entry.image = image;
                true
            }
            None => false,
        }
    }

    /// Looks up an entry.
    pub fn get(&self, id: &HistoryId) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    /// True if an entry with `id` exists.
    pub fn contains(&self, id: &HistoryId) -> bool {
        self.get(id).is_some()
    }

    /// Entries, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::ImageFormat;

    fn entry(id: &str, tag: u8) -> HistoryEntry {
        HistoryEntry::new(
            HistoryId::from(id),
            EncodedImage::new(vec![0xFF, 0xD8, 0xFF, tag], ImageFormat::Jpeg),
            EncodedImage::new(vec![0x89, 0x50, 0x4E, 0x47, tag], ImageFormat::Png),
        )
    }

    fn ids(history: &History) -> Vec<&str> {
        history.iter().map(|e| e.id().as_str()).collect()
    }

    #[test]
    fn test_prepend_is_most_recent_first() {
        let mut history = History::new();
        assert!(history.prepend(entry("1", 1)));
        assert!(history.prepend(entry("2", 2)));
        assert!(history.prepend(entry("3", 3)));
        assert_eq!(ids(&history), vec!["3", "2", "1"]);
    }

    #[test]
    fn test_prepend_rejects_duplicate_id() {
        let mut history = History::new();
        history.prepend(entry("1", 1));
        assert!(!history.prepend(entry("1", 9)));
        assert_eq!(history.len(), 1);
        assert_eq!(history.get(&"1".into()).unwrap().image().data()[3], 1);
    }

    #[test]
    fn test_delete_single_entry() {
        let mut history = History::new();
        history.prepend(entry("1", 1));
        let removed = history.delete(&"1".into()).unwrap();
        assert_eq!(removed.id().as_str(), "1");
        assert!(history.is_empty());
    }

    #[test]
    fn test_delete_keeps_relative_order() {
        let mut history = History::new();
        for (i, id) in ["a", "b", "c", "d"].iter().enumerate() {
            history.prepend(entry(id, i as u8));
        }
        history.delete(&"c".into());
        assert_eq!(ids(&history), vec!["d", "b", "a"]);
        assert!(history.delete(&"zzz".into()).is_none());
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_replace_image_keeps_id_and_subject() {
        let mut history = History::new();
        history.prepend(entry("1", 1));
        history.prepend(entry("2", 2));
        let before = history.get(&"1".into()).unwrap().clone();

        let new_image = EncodedImage::new(vec![0xFF, 0xD8, 0xFF, 42], ImageFormat::Jpeg);
        assert!(history.replace_image(&"1".into(), new_image.clone()));

        let after = history.get(&"1".into()).unwrap();
        assert_eq!(after.image(), &new_image);
        assert_eq!(after.original_subject(), before.original_subject());
        assert_eq!(history.get(&"2".into()).unwrap(), &entry("2", 2));
        assert_eq!(ids(&history), vec!["2", "1"]);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(HistoryId::generate(), HistoryId::generate());
    }
}
