//! Embedded-collection edit rules
//!
//! Pure functions over in-memory documents. They define the outcome of every
//! likes/comments/experience/education edit: the in-memory store applies them
//! directly under its lock, and the MongoDB store uses them to explain why a
//! guarded atomic update matched nothing.

pub mod post;
pub mod profile;

use bson::oid::ObjectId;

use crate::db::schemas::{Comment, Education, Experience};
use crate::types::ConnectorError;

/// Embedded entries addressed by their own immutable id
pub trait Keyed {
    fn key(&self) -> &ObjectId;
}

impl Keyed for Comment {
    fn key(&self) -> &ObjectId {
        &self._id
    }
}

impl Keyed for Experience {
    fn key(&self) -> &ObjectId {
        &self._id
    }
}

impl Keyed for Education {
    fn key(&self) -> &ObjectId {
        &self._id
    }
}

/// Newest entries go first
pub fn prepend<T>(seq: &mut Vec<T>, entry: T) {
    seq.insert(0, entry);
}

/// Locate an entry by id without removing it
pub fn find_by_key<'a, T: Keyed>(
    seq: &'a [T],
    key: &ObjectId,
    what: &str,
) -> Result<(usize, &'a T), ConnectorError> {
    seq.iter()
        .enumerate()
        .find(|(_, entry)| entry.key() == key)
        .ok_or_else(|| ConnectorError::NotFound(format!("No such {}", what)))
}

/// Remove exactly the entry with `key`; a missing key is `NotFound`
pub fn remove_by_key<T: Keyed>(
    seq: &mut Vec<T>,
    key: &ObjectId,
    what: &str,
) -> Result<T, ConnectorError> {
    let (position, _) = find_by_key(seq, key, what)?;
    Ok(seq.remove(position))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn experience(title: &str) -> Experience {
        Experience {
            _id: ObjectId::new(),
            title: title.into(),
            company: "Acme".into(),
            location: None,
            from: "2020-01-01".into(),
            to: None,
            current: false,
            description: None,
        }
    }

    #[test]
    fn test_prepend_puts_entry_first() {
        let mut seq = vec![experience("old")];
        prepend(&mut seq, experience("new"));
        assert_eq!(seq[0].title, "new");
        assert_eq!(seq.len(), 2);
    }

    #[test]
    fn test_remove_by_key_removes_only_match() {
        let keep = experience("keep");
        let drop = experience("drop");
        let drop_id = drop._id;
        let mut seq = vec![keep.clone(), drop, experience("also keep")];

        let removed = remove_by_key(&mut seq, &drop_id, "experience").unwrap();
        assert_eq!(removed.title, "drop");
        assert_eq!(seq.len(), 2);
        assert_eq!(seq[0], keep);
    }

    #[test]
    fn test_remove_missing_key_is_not_found_and_leaves_sequence() {
        let mut seq = vec![experience("A")];
        let before = seq.clone();

        let result = remove_by_key(&mut seq, &ObjectId::new(), "experience");
        assert!(matches!(result, Err(ConnectorError::NotFound(_))));
        assert_eq!(seq, before);
    }
}
