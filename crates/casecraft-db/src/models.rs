//! Rust models matching the database schema.

use casecraft_common::ImageId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for an uploaded image.
///
/// The file itself is not owned by the store; `filepath` is recorded as given
/// and never checked against the filesystem.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Image {
    pub id: ImageId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker. Set once; rows with a value are hidden from
    /// normal reads.
    pub deleted_at: Option<DateTime<Utc>>,
    pub filename: String,
    pub filepath: String,
}

impl Image {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_serialization() {
        let now = Utc::now();
        let image = Image {
            id: ImageId::from(3),
            created_at: now,
            updated_at: now,
            deleted_at: None,
            filename: "a.png".to_string(),
            filepath: "/imgs/a.png".to_string(),
        };

        let json = serde_json::to_value(&image).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["filename"], "a.png");
        assert!(json["deleted_at"].is_null());

        let back: Image = serde_json::from_value(json).unwrap();
        assert_eq!(back, image);
        assert!(!back.is_deleted());
    }
}
