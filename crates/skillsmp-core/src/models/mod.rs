mod remote;
mod skill;

pub use remote::{
    ApiEnvelope, ApiErrorBody, RemoteSkill, SearchPage, SearchQuery, SemanticResults, SortBy,
};
pub use skill::{SKILL_DESCRIPTOR, SkillDescriptor, SkillRecord, slugify};
