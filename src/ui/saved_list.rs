use std::fmt;

use crate::document::{Document, DocumentId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedListRow {
    pub id: DocumentId,
    pub title: String,
    pub date: String,
    pub editing: bool,
}

/// Display rows for the saved documents panel, in store order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedList {
    pub rows: Vec<SavedListRow>,
}

impl SavedList {
    pub fn from_documents(docs: &[Document], date_format: &str, editing: Option<&DocumentId>) -> Self {
        let rows = docs
            .iter()
            .map(|doc| SavedListRow {
                id: doc.id.clone(),
                title: doc.title.clone(),
                date: doc.display_date(date_format),
                editing: editing == Some(&doc.id),
            })
            .collect();
        Self { rows }
    }

    /// The panel is hidden while there is nothing saved.
    pub fn is_visible(&self) -> bool {
        !self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for SavedList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            let marker = if row.editing { '*' } else { ' ' };
            writeln!(f, "{marker} {:<14} {:<10} {}", row.id, row.date, row.title)?;
        }
        Ok(())
    }
}
