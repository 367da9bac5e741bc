use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which encoder produced a vector. Stored in the collection's `type` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modality {
    Text,
    Image,
}

impl Modality {
    /// The modality a query in `self` is matched against.
    pub fn opposite(self) -> Modality {
        match self {
            Modality::Text => Modality::Image,
            Modality::Image => Modality::Text,
        }
    }

    /// Value of the `type` property in the store.
    pub fn as_type_tag(&self) -> &'static str {
        match self {
            Modality::Text => "Text",
            Modality::Image => "Image",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_type_tag())
    }
}

impl FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Modality::Text),
            "image" => Ok(Modality::Image),
            _ => Err(format!("Unknown modality: {s}")),
        }
    }
}
