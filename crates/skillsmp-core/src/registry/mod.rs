//! The local registry of installed skills.

mod scanner;

pub use scanner::SkillRegistry;
