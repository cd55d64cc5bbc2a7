//! Strongly typed run identifier and the station enum.
//!
//! `RunId` is the zero-based row position of a run in its parameter table.
//! The inner integer is `pub` so it can be written straight into output
//! tables, but callers should prefer `.index()` when indexing `Vec`s.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
        #[serde(transparent)]
        $vis struct $name(pub $inner);

        impl $name {
            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Row position of a run in its sweep table.  Max ~4.3 billion runs.
    pub struct RunId(u32);
}

// ── Station ───────────────────────────────────────────────────────────────────

/// One of the two linked bike stations.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Station {
    Mailly,
    Moulin,
}

impl Station {
    /// Both stations in table order (Mailly first).
    pub const ALL: [Station; 2] = [Station::Mailly, Station::Moulin];

    /// Lowercase label used as the `station` column of tidy tables.
    pub fn as_str(self) -> &'static str {
        match self {
            Station::Mailly => "mailly",
            Station::Moulin => "moulin",
        }
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
