//! A single saved note, kept in the key-value store.

use anyhow::{Context, Result, bail};

use crate::constants::NOTE_KEY;
use crate::store::KeyValueStore;

/// Save a note. Surrounding whitespace is trimmed and empty notes rejected.
pub fn save_note<S: KeyValueStore + ?Sized>(store: &mut S, text: &str) -> Result<String> {
    let note = text.trim();
    if note.is_empty() {
        bail!("Please enter a message");
    }
    store.set(NOTE_KEY, note).context("Failed to save message")?;
    Ok(note.to_string())
}

/// The saved note, if there is one.
pub fn note<S: KeyValueStore + ?Sized>(store: &S) -> Option<String> {
    store.get(NOTE_KEY).filter(|note| !note.is_empty())
}
