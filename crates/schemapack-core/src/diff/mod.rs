pub mod engine;
pub mod human_summary;
pub mod model;

pub use engine::{diff_definitions, diff_package};
pub use human_summary::render_human_summary;
pub use model::{
    DiffStatus, DiffSummary, FieldChange, GroupDiff, PackageDiff, PortSchemaDiff,
    RelationshipDiff, SchemaDiff, ValueChange,
};
