//! Typed fetches through serde.
//!
//! A document's attribute map is decoded with `serde_json`. Single fetches
//! treat a record that does not decode as absent; batch fetches skip bad
//! records and report them next to the decoded items.

use serde::de::DeserializeOwned;

use docshelf_core::{Document, Query};

use crate::error::Result;
use crate::handle::Documents;

/// A record left out of a batch decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub id: String,
    pub reason: String,
}

/// Outcome of decoding a batch of documents.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    /// Successfully decoded records, in fetch order.
    pub items: Vec<T>,
    /// Records that did not decode.
    pub skipped: Vec<SkippedRecord>,
}

impl<T> Decoded<T> {
    /// Whether every record decoded.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

impl<T> Default for Decoded<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

/// Decode every document, skipping and reporting the ones that fail.
pub fn decode_documents<T, I>(documents: I) -> Decoded<T>
where
    T: DeserializeOwned,
    I: IntoIterator<Item = Document>,
{
    let mut decoded = Decoded::default();
    for document in documents {
        match document.decode::<T>() {
            Ok(item) => decoded.items.push(item),
            Err(e) => {
                tracing::warn!(id = %document.id, error = %e, "skipping record that does not decode");
                decoded.skipped.push(SkippedRecord {
                    id: document.id,
                    reason: e.to_string(),
                });
            }
        }
    }
    decoded
}

/// Typed fetch operations for any handle.
pub trait DecodeExt: Documents {
    /// Fetch and decode one document.
    ///
    /// `Ok(None)` when the document is absent or does not decode.
    fn fetch_as<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>> {
        let Some(document) = self.fetch(id)? else {
            return Ok(None);
        };
        match document.decode::<T>() {
            Ok(item) => Ok(Some(item)),
            Err(e) => {
                tracing::warn!(id, error = %e, "document does not decode; treating as absent");
                Ok(None)
            }
        }
    }

    /// Fetch and decode one document, failing with `DecodeFailure` on a
    /// mismatch.
    fn try_fetch_as<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>> {
        match self.fetch(id)? {
            Some(document) => Ok(Some(document.decode::<T>()?)),
            None => Ok(None),
        }
    }

    /// Fetch and decode every match.
    fn fetch_all_as<T, Q>(&self, query: Q) -> Result<Decoded<T>>
    where
        T: DeserializeOwned,
        Q: Into<Query>,
    {
        Ok(decode_documents(self.fetch_all(query)?))
    }
}

impl<D: Documents + ?Sized> DecodeExt for D {}
