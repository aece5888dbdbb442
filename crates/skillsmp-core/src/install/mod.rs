//! Installing packaged skills into the local registry.
//!
//! Archives are unpacked into a hidden staging directory inside the registry
//! and only moved into place once they have been validated, so a failed
//! install never leaves a partial skill behind.

mod archive;
mod installer;
mod source;

pub use archive::{ArchiveKind, extract, locate_skill_root};
pub use installer::{ArchiveInstaller, InstallOptions, InstalledSkill, SkillInstaller, UpdatePlan};
pub use source::{InstallSource, infer_download_url};
