//! Model discovery: find `*.model.json` declarations under a namespace, in directory trees and in
//! zip archives. Unreadable or malformed declarations are skipped, never fatal.

use crate::config::{ModelDeclaration, ReconcileSettings};
use crate::error::DiscoveryError;
use crate::registry::ModelRegistry;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use walkdir::WalkDir;
use zip::ZipArchive;

/// File suffix of a model declaration.
pub const MODEL_SUFFIX: &str = ".model.json";

/// Search every root of the settings' search path and collect declarations into a new registry.
pub fn discover(settings: &ReconcileSettings) -> ModelRegistry {
    let mut registry = ModelRegistry::new();
    for root in &settings.search_path {
        discover_root(root, &settings.namespace, &mut registry);
    }
    tracing::info!(
        namespace = %settings.namespace,
        models = registry.len(),
        skipped = registry.skipped().len(),
        "model discovery finished"
    );
    registry
}

/// Search one root: a directory is walked, a file is opened as a zip archive.
pub fn discover_root(root: &Path, namespace: &str, registry: &mut ModelRegistry) {
    if root.is_dir() {
        scan_directory(root, namespace, registry);
    } else if root.is_file() {
        scan_archive(root, namespace, registry);
    } else {
        tracing::warn!(root = %root.display(), "model search root does not exist, skipping");
    }
}

/// Walk `root/<namespace path>` recursively for model declarations.
pub fn scan_directory(root: &Path, namespace: &str, registry: &mut ModelRegistry) {
    let ns_path = namespace.replace('.', "/");
    let dir = root.join(&ns_path);
    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "no models under namespace directory");
        return;
    }
    for entry in WalkDir::new(&dir).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                registry.skip(path, e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let relative: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let Some(name) = qualified_name(&relative.join("/")) else {
            continue;
        };
        match read_declaration_file(entry.path(), &name) {
            Ok(decl) => registry.register(name, decl),
            Err(e) => registry.skip(name, e),
        }
    }
}

/// Iterate archive entries under the namespace path prefix for model declarations.
pub fn scan_archive(path: &Path, namespace: &str, registry: &mut ModelRegistry) {
    let display = path.display().to_string();
    let file = match File::open(path) {
        Ok(f) => f,
        Err(source) => {
            registry.skip(display.clone(), DiscoveryError::Io { path: display, source });
            return;
        }
    };
    let mut archive = match ZipArchive::new(file) {
        Ok(a) => a,
        Err(source) => {
            registry.skip(display.clone(), DiscoveryError::Archive { path: display, source });
            return;
        }
    };
    let prefix = format!("{}/", namespace.replace('.', "/"));
    for i in 0..archive.len() {
        let mut entry = match archive.by_index(i) {
            Ok(e) => e,
            Err(source) => {
                registry.skip(
                    format!("{}#{}", display, i),
                    DiscoveryError::Archive {
                        path: display.clone(),
                        source,
                    },
                );
                continue;
            }
        };
        let entry_name = entry.name().trim_start_matches('/').to_string();
        if entry.is_dir() || !entry_name.starts_with(&prefix) {
            continue;
        }
        let Some(name) = qualified_name(&entry_name) else {
            continue;
        };
        let mut json = String::new();
        if let Err(source) = entry.read_to_string(&mut json) {
            registry.skip(
                name,
                DiscoveryError::Io {
                    path: format!("{}!{}", display, entry_name),
                    source,
                },
            );
            continue;
        }
        match parse_declaration(&name, &json) {
            Ok(decl) => registry.register(name, decl),
            Err(e) => registry.skip(name, e),
        }
    }
}

/// `models/test/Test2.model.json` -> `models.test.Test2`. None when the path is not a declaration.
pub fn qualified_name(relative_path: &str) -> Option<String> {
    let stem = relative_path.strip_suffix(MODEL_SUFFIX)?;
    if stem.is_empty() || stem.ends_with('/') {
        return None;
    }
    Some(stem.replace('/', "."))
}

fn read_declaration_file(path: &Path, name: &str) -> Result<ModelDeclaration, DiscoveryError> {
    let json = std::fs::read_to_string(path).map_err(|source| DiscoveryError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_declaration(name, &json)
}

fn parse_declaration(name: &str, json: &str) -> Result<ModelDeclaration, DiscoveryError> {
    serde_json::from_str(json).map_err(|source| DiscoveryError::Parse {
        name: name.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const USERS: &str = r#"{ "table": "users", "fields": [
        { "name": "id", "column": { "name": "id", "type": "int", "length": 11, "key": true } }
    ] }"#;

    const ORDERS: &str = r#"{ "table": "orders", "fields": [
        { "name": "total", "column": { "name": "total", "type": "decimal", "length": 10 } }
    ] }"#;

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    #[test]
    fn qualified_name_from_relative_path() {
        assert_eq!(
            qualified_name("models/test/Test2.model.json").as_deref(),
            Some("models.test.Test2")
        );
        assert_eq!(qualified_name("models/test/Test2.json"), None);
        assert_eq!(qualified_name("models/.model.json"), None);
    }

    #[test]
    fn walks_directory_recursively() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "models/Users.model.json", USERS);
        write(tmp.path(), "models/shop/Orders.model.json", ORDERS);
        write(tmp.path(), "models/README.md", "not a model");
        write(tmp.path(), "other/Ignored.model.json", USERS);

        let mut reg = ModelRegistry::new();
        scan_directory(tmp.path(), "models", &mut reg);

        let names: Vec<_> = reg.iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names, vec!["models.Users", "models.shop.Orders"]);
        assert!(reg.skipped().is_empty());
    }

    #[test]
    fn malformed_declaration_is_skipped_not_fatal() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "models/Broken.model.json", "{ not json");
        write(tmp.path(), "models/Users.model.json", USERS);

        let mut reg = ModelRegistry::new();
        scan_directory(tmp.path(), "models", &mut reg);

        assert!(reg.get("models.Users").is_some());
        assert_eq!(reg.skipped().len(), 1);
        assert_eq!(reg.skipped()[0].name, "models.Broken");
    }

    #[test]
    fn scans_archive_entries_under_prefix() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("app.zip");
        let mut zip = ZipWriter::new(File::create(&path).unwrap());
        let opts = SimpleFileOptions::default();
        zip.add_directory("app/models/", opts).unwrap();
        zip.start_file("app/models/Users.model.json", opts).unwrap();
        zip.write_all(USERS.as_bytes()).unwrap();
        zip.start_file("app/models/shop/Orders.model.json", opts).unwrap();
        zip.write_all(ORDERS.as_bytes()).unwrap();
        zip.start_file("/app/models/Legacy.model.json", opts).unwrap();
        zip.write_all(USERS.as_bytes()).unwrap();
        zip.start_file("app/modelsextra/Nope.model.json", opts).unwrap();
        zip.write_all(USERS.as_bytes()).unwrap();
        zip.start_file("app/models/Bad.model.json", opts).unwrap();
        zip.write_all(br#"{ "table": 5 }"#).unwrap();
        zip.finish().unwrap();

        let mut reg = ModelRegistry::new();
        scan_archive(&path, "app.models", &mut reg);

        let names: Vec<_> = reg.iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(
            names,
            vec!["app.models.Legacy", "app.models.Users", "app.models.shop.Orders"]
        );
        assert_eq!(reg.skipped().len(), 1);
        assert_eq!(reg.skipped()[0].name, "app.models.Bad");
    }

    #[test]
    fn directory_and_archive_yield_same_models() {
        let tmp = TempDir::new().unwrap();
        let exploded = tmp.path().join("exploded");
        write(&exploded, "models/Users.model.json", USERS);
        let archive = tmp.path().join("models.zip");
        let mut zip = ZipWriter::new(File::create(&archive).unwrap());
        zip.start_file("models/Users.model.json", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(USERS.as_bytes()).unwrap();
        zip.finish().unwrap();

        let mut from_dir = ModelRegistry::new();
        discover_root(&exploded, "models", &mut from_dir);
        let mut from_zip = ModelRegistry::new();
        discover_root(&archive, "models", &mut from_zip);

        assert_eq!(from_dir.get("models.Users"), from_zip.get("models.Users"));
        assert!(from_dir.get("models.Users").is_some());
    }

    #[test]
    fn unreadable_archive_and_missing_root_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let bogus = tmp.path().join("bogus.zip");
        std::fs::write(&bogus, b"not a zip").unwrap();
        let settings = ReconcileSettings::new(
            "models",
            vec![bogus, tmp.path().join("missing")],
        )
        .unwrap();
        let reg = discover(&settings);
        assert!(reg.is_empty());
        assert_eq!(reg.skipped().len(), 1);
    }
}
