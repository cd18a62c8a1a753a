use heropick_core::Entity;
use serde::{Deserialize, Serialize};

/// One record of `heroes.json`. Older catalogs spell the image field
/// `imageRef`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub name: String,
    #[serde(rename = "imageUrl", alias = "imageRef")]
    pub image_url: String,
}

impl From<CatalogRecord> for Entity {
    fn from(record: CatalogRecord) -> Self {
        Entity::new(record.name, record.image_url)
    }
}
