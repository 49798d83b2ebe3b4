use std::fs;
use std::path::Path;

use rusqlite::Connection;
use schemapack_engine::{apply_engine_command, EngineCommand, EngineCommandResult, EngineConfig};
use schemapack_engine::PackageRegistry;
use tempfile::TempDir;

#[allow(dead_code)]
pub const INFRA_JSON: &str = r##"{
  "id": "pkg-infra",
  "name": "Infrastructure",
  "color": "#336699",
  "schemaGroups": [
    { "id": "g-root", "name": "Infra" },
    { "id": "g-compute", "name": "Compute", "parentId": "g-root", "color": "red" }
  ],
  "schemas": [
    {
      "type": "svc",
      "displayName": "Service",
      "groupId": "g-compute",
      "fields": [
        { "name": "port", "type": "number" },
        { "name": "name", "type": "string", "required": true }
      ],
      "ports": []
    }
  ],
  "portSchemas": [],
  "schemaRelationships": []
}"##;

#[allow(dead_code)]
pub const QUEUE_YAML: &str = r#"
id: pkg-queue
name: Queues
schemas:
  - type: queue
    displayName: Queue
    fields:
      - name: capacity
        type: number
    ports: []
"#;

/// A package directory with one JSON and one YAML definition
#[allow(dead_code)]
pub fn package_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "infra.json", INFRA_JSON);
    write(dir.path(), "queue.yaml", QUEUE_YAML);
    write(dir.path(), "notes.txt", "ignored");
    dir
}

#[allow(dead_code)]
pub fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

#[allow(dead_code)]
pub fn migrated() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    schemapack_store::migrations::apply_migrations(&mut conn).unwrap();
    conn
}

/// Engine fixture: migrated in-memory store plus the bundled packages
#[allow(dead_code)]
pub struct Harness {
    pub conn: Connection,
    pub registry: PackageRegistry,
    pub config: EngineConfig,
    _packages: TempDir,
}

#[allow(dead_code)]
impl Harness {
    pub fn new() -> Self {
        let packages = package_dir();
        let registry = PackageRegistry::load_dir(packages.path()).unwrap();
        Self {
            conn: migrated(),
            registry,
            config: EngineConfig::for_document("doc-1"),
            _packages: packages,
        }
    }

    pub fn run(&mut self, cmd: EngineCommand) -> EngineCommandResult {
        self.try_run(cmd).unwrap()
    }

    pub fn try_run(
        &mut self,
        cmd: EngineCommand,
    ) -> Result<EngineCommandResult, schemapack_core::ExError> {
        apply_engine_command(cmd, &mut self.conn, &self.registry, &self.config)
    }
}
