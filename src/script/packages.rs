//! Installation snippets for a recipe's additional downloads

use super::templates::{render, Placeholder, INSTALL_PACKAGE};
use super::DeferredFailure;
use crate::model::{AdditionalDownload, FileType};
use std::collections::HashMap;
use tracing::warn;

/// Install commands for every download, plus any problem that was turned
/// into a failing shell line instead of an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageSection {
    pub script: String,
    pub failures: Vec<DeferredFailure>,
}

/// Renders one install snippet per download in recipe order.
///
/// A download missing a field its type needs becomes a single failing line
/// and the rest are still rendered. An unrecognized file type stops
/// processing after its failing line.
pub fn install_packages(downloads: &[AdditionalDownload]) -> PackageSection {
    let mut section = PackageSection::default();
    let mut lines = Vec::with_capacity(downloads.len());

    for (index, download) in downloads.iter().enumerate() {
        let file_name = if download.file_name.is_empty() {
            format!("package-{}", index)
        } else {
            download.file_name.clone()
        };

        if let FileType::Unknown(kind) = &download.file_type {
            let failure = DeferredFailure::package(
                &download.uri,
                format!("Unknown file type '{}' for package {}", kind, download.uri),
            );
            warn!(uri = %download.uri, file_type = %kind, "Unknown download type, skipping remaining packages");
            lines.push(failure.shell_line());
            section.failures.push(failure);
            break;
        }

        let missing = match &download.file_type {
            FileType::Tar if download.binary_path.is_empty() => Some("binary path"),
            FileType::Executable if download.file_name.is_empty() => Some("file name"),
            FileType::Rpm if download.package_name.is_empty() => Some("package name"),
            _ => None,
        };
        if let Some(field) = missing {
            let failure = DeferredFailure::package(
                &download.uri,
                format!(
                    "The {} was not specified for {} package {}",
                    field, download.file_type, download.uri
                ),
            );
            warn!(uri = %download.uri, field, "Download is missing a required field");
            lines.push(failure.shell_line());
            section.failures.push(failure);
            continue;
        }

        let values = HashMap::from([
            ("URI", download.uri.as_str()),
            ("FILENAME", file_name.as_str()),
            ("SHA256", download.sha256.as_str()),
            ("TYPE", download.file_type.as_str()),
            ("BINARY_PATH", download.binary_path.as_str()),
            ("PACKAGE_NAME", download.package_name.as_str()),
        ]);
        lines.push(render(INSTALL_PACKAGE, Placeholder::Single, &values));
    }

    section.script = lines.join("\n");
    section
}
