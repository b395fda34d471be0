use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Source,
    Track,
    Clip,
    Effect,
}

impl EntityKind {
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Track => "track",
            Self::Clip => "clip",
            Self::Effect => "effect",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Strategy {
    Random,
    Sequential { next: u64 },
}

/// Hands out opaque ids of the form `<kind>-<suffix>`.
///
/// Ids carry no meaning beyond uniqueness; callers must never parse them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    strategy: Strategy,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::random()
    }
}

impl IdAllocator {
    #[must_use]
    pub const fn random() -> Self {
        Self {
            strategy: Strategy::Random,
        }
    }

    /// Deterministic ids (`clip-1`, `track-2`, ...) shared across all kinds.
    #[must_use]
    pub const fn sequential() -> Self {
        Self {
            strategy: Strategy::Sequential { next: 1 },
        }
    }

    pub fn allocate(&mut self, kind: EntityKind) -> String {
        match &mut self.strategy {
            Strategy::Random => format!("{}-{}", kind.prefix(), Uuid::new_v4().simple()),
            Strategy::Sequential { next } => {
                let id = format!("{}-{next}", kind.prefix());
                *next += 1;
                id
            }
        }
    }

    /// Allocates until `taken` reports the id as free.
    pub fn allocate_unused(&mut self, kind: EntityKind, taken: impl Fn(&str) -> bool) -> String {
        loop {
            let id = self.allocate(kind);
            if !taken(&id) {
                return id;
            }
        }
    }
}
