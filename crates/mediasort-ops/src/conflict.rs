//! Collision policy for occupied destinations.

use serde::{Deserialize, Serialize};

use mediasort_core::SortConfig;

/// What to do when a file already exists at the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CollisionPolicy {
    /// Leave the existing file and fail the candidate.
    #[default]
    Refuse,
    /// Always replace the existing file.
    Overwrite,
    /// Replace only if the incoming file is strictly larger.
    OverwriteIfLarger,
}

impl CollisionPolicy {
    /// Derive the policy from the overwrite flags.
    pub fn from_config(config: &SortConfig) -> Self {
        if config.overwrite {
            Self::Overwrite
        } else if config.overwrite_if_larger {
            Self::OverwriteIfLarger
        } else {
            Self::Refuse
        }
    }

    /// Whether an existing file of `existing_size` bytes may be replaced by
    /// an incoming file of `incoming_size` bytes.
    pub fn allows_replace(&self, existing_size: u64, incoming_size: u64) -> bool {
        match self {
            Self::Refuse => false,
            Self::Overwrite => true,
            Self::OverwriteIfLarger => incoming_size > existing_size,
        }
    }
}

impl std::fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Refuse => write!(f, "refuse"),
            Self::Overwrite => write!(f, "overwrite"),
            Self::OverwriteIfLarger => write!(f, "overwrite if larger"),
        }
    }
}
