pub mod definition;
pub mod library;
pub mod live;
pub mod manifest;

pub use definition::{
    ConstructSchema, FieldSchema, PackageDefinition, PortConfig, PortSchema, SchemaGroup,
    SchemaRelationship,
};
pub use library::{LibraryEntry, LibraryEntrySummary, LibraryVersion};
pub use live::{Lineage, LivePackage};
pub use manifest::{ManifestEntry, PackageManifest};
