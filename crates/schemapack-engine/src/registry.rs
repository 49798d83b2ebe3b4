//! Bundled package registry
//!
//! Definitions are read from `*.json`, `*.yaml` and `*.yml` files in one
//! directory. Every definition is validated on load; a file that fails to
//! parse or validate fails the whole load.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use schemapack_core::errors::{ExError, ExErrorKind};
use schemapack_core::model::PackageDefinition;
use schemapack_core::rules::validate_definition;

/// Bundled package definitions keyed by package id
#[derive(Debug, Clone, Default)]
pub struct PackageRegistry {
    packages: BTreeMap<String, PackageDefinition>,
}

impl PackageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every definition file in `dir`. A missing directory yields an
    /// empty registry.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory cannot be listed, `InvalidInput` for an
    /// unparseable file, a validation error for an invalid definition, and
    /// `AlreadyExists` when two files declare the same package id.
    pub fn load_dir(dir: &Path) -> Result<Self, ExError> {
        let mut registry = Self::new();
        if !dir.exists() {
            tracing::debug!(dir = %dir.display(), "package directory missing; registry empty");
            return Ok(registry);
        }

        let mut paths: Vec<_> = fs::read_dir(dir)
            .map_err(|e| io_error(dir, e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && Format::of(path).is_some())
            .collect();
        paths.sort();

        for path in paths {
            registry.insert(load_file(&path)?)?;
        }

        tracing::debug!(dir = %dir.display(), packages = registry.len(), "registry loaded");
        Ok(registry)
    }

    /// Build a registry from in-memory definitions, validating each
    ///
    /// # Errors
    ///
    /// Same as [`PackageRegistry::load_dir`] minus the file errors.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = PackageDefinition>,
    ) -> Result<Self, ExError> {
        let mut registry = Self::new();
        for definition in definitions {
            validate_definition(&definition)?;
            registry.insert(definition)?;
        }
        Ok(registry)
    }

    fn insert(&mut self, definition: PackageDefinition) -> Result<(), ExError> {
        if self.packages.contains_key(&definition.id) {
            return Err(ExError::new(ExErrorKind::AlreadyExists)
                .with_op("registry_load")
                .with_package_id(definition.id.clone())
                .with_message("package id declared by more than one definition"));
        }
        self.packages.insert(definition.id.clone(), definition);
        Ok(())
    }

    pub fn get(&self, package_id: &str) -> Option<&PackageDefinition> {
        self.packages.get(package_id)
    }

    /// Package ids in sorted order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn of(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            _ => None,
        }
    }
}

/// Parse and validate one definition file
///
/// # Errors
///
/// Returns `InvalidInput` for an unsupported extension or a parse failure,
/// `Io` if the file cannot be read, and the validation error otherwise.
pub fn load_file(path: &Path) -> Result<PackageDefinition, ExError> {
    let format = Format::of(path).ok_or_else(|| {
        ExError::new(ExErrorKind::InvalidInput)
            .with_op("load_definition")
            .with_message(format!(
                "{}: expected a .json, .yaml or .yml file",
                path.display()
            ))
    })?;

    let content = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    let parse_error = |reason: String| {
        ExError::new(ExErrorKind::InvalidInput)
            .with_op("load_definition")
            .with_message(format!("{}: {}", path.display(), reason))
    };
    let definition: PackageDefinition = match format {
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
        Format::Yaml => serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
    };

    validate_definition(&definition)?;
    Ok(definition)
}

fn io_error(path: &Path, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op("load_definition")
        .with_message(format!("{}: {}", path.display(), err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemapack_core::model::ConstructSchema;

    #[test]
    fn test_format_by_extension() {
        assert_eq!(Format::of(Path::new("a/b.json")), Some(Format::Json));
        assert_eq!(Format::of(Path::new("b.yml")), Some(Format::Yaml));
        assert_eq!(Format::of(Path::new("b.YAML")), None);
        assert_eq!(Format::of(Path::new("README")), None);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let def = PackageDefinition::new("p1", "P").with_schema(ConstructSchema::new("a", "A"));
        let err = PackageRegistry::from_definitions(vec![def.clone(), def]).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::AlreadyExists);
    }

    #[test]
    fn test_invalid_definition_rejected() {
        let def = PackageDefinition::new("p1", "");
        let err = PackageRegistry::from_definitions(vec![def]).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidDefinition);
    }
}
