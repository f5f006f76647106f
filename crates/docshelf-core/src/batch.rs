//! Write batches.
//!
//! A batch is applied by the engine in one transaction: readers see either
//! none of its writes or all of them.

use crate::error::Result;
use crate::types::Document;

/// One write inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Upsert a document by id.
    Save(Document),
    /// Delete a document by id. Absent ids are a no-op.
    Delete(String),
}

/// An ordered list of writes applied atomically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    ops: Vec<WriteOp>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// A batch saving every document, in order.
    pub fn saving<I>(documents: I) -> Self
    where
        I: IntoIterator<Item = Document>,
    {
        Self {
            ops: documents.into_iter().map(WriteOp::Save).collect(),
        }
    }

    /// A batch deleting every id, in order.
    pub fn deleting<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ops: ids.into_iter().map(|id| WriteOp::Delete(id.into())).collect(),
        }
    }

    pub fn save(mut self, document: Document) -> Self {
        self.ops.push(WriteOp::Save(document));
        self
    }

    pub fn delete(mut self, id: impl Into<String>) -> Self {
        self.ops.push(WriteOp::Delete(id.into()));
        self
    }

    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Validate every document before anything is written.
    pub fn validate(&self) -> Result<()> {
        self.ops.iter().try_for_each(|op| match op {
            WriteOp::Save(document) => document.validate(),
            WriteOp::Delete(_) => Ok(()),
        })
    }
}

/// Outcome of an applied batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Documents written.
    pub saved: usize,
    /// Documents that existed and were removed.
    pub deleted: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    #[test]
    fn test_builder_keeps_order() {
        let batch = Batch::new()
            .save(Document::new("1"))
            .delete("2")
            .save(Document::new("3"));

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.ops()[1], WriteOp::Delete("2".to_string()));
    }

    #[test]
    fn test_validate_rejects_empty_id() {
        let batch = Batch::saving([Document::new("ok"), Document::new("")]);
        assert_eq!(batch.validate(), Err(CoreError::EmptyDocumentId));

        let deletes = Batch::deleting(["a", "b"]);
        assert!(deletes.validate().is_ok());
        assert!(Batch::new().is_empty());
    }
}
