use crate::Entity;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("catalog not found at {0}")]
    Missing(String),
    #[error("failed to read catalog: {0}")]
    Io(String),
    #[error("malformed catalog: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogState {
    Loading,
    Ready(Vec<Entity>),
    Failed(LoadError),
}

impl CatalogState {
    pub fn entities(&self) -> &[Entity] {
        match self {
            Self::Ready(entities) => entities,
            Self::Loading | Self::Failed(_) => &[],
        }
    }

    pub fn error(&self) -> Option<&LoadError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn find(&self, name: &str) -> Option<&Entity> {
        self.entities().iter().find(|entity| entity.name == name)
    }
}
