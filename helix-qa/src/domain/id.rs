use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($name:ident, $prefix:expr) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn generate() -> Self {
                let uuid = uuid::Uuid::new_v4();
                let hash = blake3::hash(uuid.as_bytes());
                let hex = hex::encode(&hash.as_bytes()[..4]);
                Self(format!("{}-{}", $prefix, hex))
            }

            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(DocId, "doc");
define_id!(ChunkId, "chk");

impl ChunkId {
    /// Chunk identity is positional: the owning document plus the ordinal.
    pub fn for_chunk(doc_id: &DocId, ordinal: usize) -> Self {
        Self(format!("{doc_id}#{ordinal}"))
    }
}
