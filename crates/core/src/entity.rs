use serde::{Deserialize, Serialize};

/// A catalog hero. Identity is the name; the image reference is carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(rename = "imageUrl", alias = "imageRef", alias = "image_ref", default)]
    pub image_ref: String,
}

impl Entity {
    pub fn new(name: impl Into<String>, image_ref: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image_ref: image_ref.into(),
        }
    }

    pub fn same_as(&self, other: &Entity) -> bool {
        self.name == other.name
    }
}
