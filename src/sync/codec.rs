use uuid::Uuid;

use crate::index::{BlockMetadata, BlockRecord};

/// Pack one block of text and its vector into a record under a fresh id.
///
/// Ids are UUID v4 and never reused; re-encoding the same block yields a
/// new identity.
#[inline]
pub fn encode(title: &str, text: &str, vector: Vec<f32>) -> BlockRecord {
    BlockRecord {
        id: Uuid::new_v4().to_string(),
        vector,
        metadata: BlockMetadata {
            text: text.to_string(),
            title: title.to_string(),
        },
    }
}

/// Unpack the `(title, text)` a match carries, treating absent metadata
/// as empty rather than failing.
#[inline]
pub fn decode(metadata: Option<&BlockMetadata>) -> (String, String) {
    metadata.map_or_else(
        || (String::new(), String::new()),
        |m| (m.title.clone(), m.text.clone()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_assigns_fresh_ids() {
        let a = encode("Groceries", "buy milk", vec![0.1, 0.2]);
        let b = encode("Groceries", "buy milk", vec![0.1, 0.2]);

        assert_ne!(a.id, b.id);
        assert_eq!(a.metadata.title, "Groceries");
        assert_eq!(a.metadata.text, "buy milk");
        assert_eq!(a.vector, vec![0.1, 0.2]);

        Uuid::parse_str(&a.id).expect("id should be a valid UUID");
    }

    #[test]
    fn decode_reads_metadata_fields() {
        let record = encode("Errands", "post office", vec![0.5]);
        let (title, text) = decode(Some(&record.metadata));

        assert_eq!(title, "Errands");
        assert_eq!(text, "post office");
    }

    #[test]
    fn decode_tolerates_missing_metadata() {
        let (title, text) = decode(None);

        assert_eq!(title, "");
        assert_eq!(text, "");
    }
}
