//! Identifiers for assets, layers and keyframes.
//!
//! Ids are opaque strings so that project files written by other tools load
//! verbatim. Fresh ids are random v4 UUIDs.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Mint a new random id.
            pub fn fresh() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Id of an asset in the project tree.
    AssetId
);
string_id!(
    /// Id of a layer, unique within its composition.
    LayerId
);
string_id!(
    /// Id of a keyframe, used to delete or drag a key by identity.
    KeyframeId
);
