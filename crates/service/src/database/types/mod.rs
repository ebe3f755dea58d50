mod daudit_kind;
mod dgrant_level;
mod duuid;

pub use daudit_kind::DAuditKind;
pub use dgrant_level::DGrantLevel;
pub use duuid::DUuid;
