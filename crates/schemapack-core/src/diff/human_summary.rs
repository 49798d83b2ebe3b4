//! Human-readable summary renderer for package diffs.

use crate::diff::model::{DiffStatus, PackageDiff};

/// Render a Markdown/text summary of a [`PackageDiff`].
///
/// Informational only; output order follows the (sorted) structured diff.
pub fn render_human_summary(diff: &PackageDiff) -> String {
    let mut out = String::new();

    out.push_str(&format!("## Package Diff: {}\n\n", diff.package_id));
    out.push_str(&format!(
        "**Old hash**: `{}`  \n**New hash**: `{}`\n\n",
        short(&diff.old_hash),
        short(&diff.new_hash)
    ));
    out.push_str(&format!(
        "**Summary**: {} added, {} removed, {} modified\n\n",
        diff.summary.added, diff.summary.removed, diff.summary.modified
    ));

    if !diff.has_changes() {
        out.push_str("_No changes detected._\n");
        return out;
    }

    if !diff.schemas.is_empty() {
        out.push_str("### Schemas\n\n");
        for schema in &diff.schemas {
            out.push_str(&format!(
                "- {} `{}`\n",
                marker(schema.status),
                schema.schema_type
            ));
            for field in schema.field_changes.iter().flatten() {
                match &field.detail {
                    Some(detail) => out.push_str(&format!(
                        "  - {} field `{}`: {}\n",
                        marker(field.status),
                        field.field_name,
                        detail
                    )),
                    None => out.push_str(&format!(
                        "  - {} field `{}`\n",
                        marker(field.status),
                        field.field_name
                    )),
                }
            }
            if let Some(props) = &schema.property_changes {
                out.push_str(&format!("  - changed: {}\n", props.join(", ")));
            }
        }
        out.push('\n');
    }

    if !diff.port_schemas.is_empty() {
        out.push_str("### Port Schemas\n\n");
        for port in &diff.port_schemas {
            out.push_str(&format!("- {} `{}`\n", marker(port.status), port.id));
        }
        out.push('\n');
    }

    if !diff.schema_groups.is_empty() {
        out.push_str("### Groups\n\n");
        for group in &diff.schema_groups {
            out.push_str(&format!("- {} `{}`", marker(group.status), group.name));
            if let Some(color) = &group.color {
                out.push_str(&format!(
                    " color: {} → {}",
                    color.from.as_deref().unwrap_or("none"),
                    color.to.as_deref().unwrap_or("none")
                ));
            }
            if let Some(parent) = &group.has_parent {
                out.push_str(if parent.to {
                    " (now nested)"
                } else {
                    " (now top-level)"
                });
            }
            out.push('\n');
        }
        out.push('\n');
    }

    if !diff.schema_relationships.is_empty() {
        out.push_str("### Relationships\n\n");
        for rel in &diff.schema_relationships {
            out.push_str(&format!("- {} `{}`", marker(rel.status), rel.key));
            if let Some(change) = &rel.source_port_id {
                out.push_str(&format!(" sourcePortId: {} → {}", change.from, change.to));
            }
            if let Some(change) = &rel.target_port_id {
                out.push_str(&format!(" targetPortId: {} → {}", change.from, change.to));
            }
            out.push('\n');
        }
        out.push('\n');
    }

    out
}

fn marker(status: DiffStatus) -> &'static str {
    match status {
        DiffStatus::Added => "**+**",
        DiffStatus::Removed => "**-**",
        DiffStatus::Modified => "**~**",
    }
}

/// First 12 characters of a digest
fn short(digest: &str) -> &str {
    digest.get(..12).unwrap_or(digest)
}
