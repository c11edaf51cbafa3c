//! Session lifecycle states

use std::fmt;

/// `Created -> Active -> {Committed | RolledBack | Abandoned} -> Closed`
///
/// A committed or rolled-back session may begin another unit of work, which
/// takes it back to `Active`. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Created,
    Active,
    Committed,
    RolledBack,
    /// Closed or dropped with a transaction still open; it was rolled back
    Abandoned,
    Closed,
}

impl SessionState {
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Whether `begin` is allowed from this state
    #[must_use]
    pub fn can_begin(&self) -> bool {
        matches!(self, Self::Created | Self::Committed | Self::RolledBack)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Active => "active",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
            Self::Abandoned => "abandoned",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
