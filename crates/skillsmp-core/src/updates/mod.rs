//! Update checks for installed skills.
//!
//! A check walks the registry, consults the [`UpdateCache`] to decide which
//! skills need a remote lookup, and classifies each skill with
//! [`compare_versions`].

mod cache;
mod checker;
mod version;

pub use cache::{CacheEntry, FRESHNESS_WINDOW_SECS, UpdateCache};
pub use checker::{CheckOptions, MissingSkill, SkillCheck, SkillCheckError, UpdateChecker, UpdateReport};
pub use version::{UpdateStatus, compare_versions};
