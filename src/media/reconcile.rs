//! Reconciling the declared manifest with the media tree on disk.
//!
//! For every folder under the media root, each kind (images, videos,
//! audio) is taken from the manifest when the manifest lists something for
//! it, and from a scan of the folder otherwise. Declared lists win so a
//! curated order or subset survives. Keys present only in the manifest are
//! kept. All paths come out as `<prefix>/<folder>/<basename>`, and running
//! the reconciliation on its own output changes nothing.

use std::path::PathBuf;

use super::{
    discover_folders, scan_folder, Manifest, ManifestError, MediaEntry, MediaKind, ScannedMedia,
};
use crate::config::ReconcileConfig;
use crate::services::backup;

/// Outcome of a reconciliation.
#[derive(Debug, Clone)]
pub struct ReconcileReport {
    /// The reconciled manifest
    pub manifest: Manifest,
    /// Folders found under the media root, sorted
    pub folders: Vec<String>,
    /// Folders whose files were scanned for at least one kind
    pub scanned: Vec<String>,
    /// Manifest keys with no folder on disk
    pub preserved: Vec<String>,
    /// Backup written before the manifest was replaced (set by [`run`])
    pub backup: Option<PathBuf>,
    /// Whether [`run`] wrote content different from what it read
    pub changed: bool,
}

/// Final path segment of a manifest item, or `None` if it has no usable
/// file name.
///
/// Items containing `/` are split on `/` only, so a file name with a
/// backslash in it survives. Items without any `/` are treated as Windows
/// paths and split on `\`. Empty and `.` segments are skipped; `..` has no
/// file name.
///
/// `/abs/a.png`, `C:\old\a.png`, `x/./a.png` and `a.png/` all give `a.png`.
pub fn basename(item: &str) -> Option<&str> {
    let separator = if item.contains('/') { '/' } else { '\\' };
    item.rsplit(separator)
        .find(|segment| !segment.is_empty() && *segment != ".")
        .filter(|segment| *segment != "..")
}

/// Build `<prefix>/<folder>/<name>`.
pub fn media_path(prefix: &str, folder: &str, name: &str) -> String {
    if prefix.is_empty() {
        format!("{folder}/{name}")
    } else {
        format!("{prefix}/{folder}/{name}")
    }
}

/// Re-home declared items under `<prefix>/<folder>/`, keeping their order.
///
/// Any directory part of an item is discarded. This cannot be undone, and
/// two items with the same basename collapse to the same path. Items with
/// no file name are dropped.
pub fn normalize_items(prefix: &str, folder: &str, items: &[String]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match basename(item) {
            Some(name) => Some(media_path(prefix, folder, name)),
            None => {
                tracing::warn!("Dropping item without a file name in {}: {:?}", folder, item);
                None
            }
        })
        .collect()
}

/// Normalize every list of an entry under `key`, passing links through.
fn normalize_entry(prefix: &str, key: &str, entry: &MediaEntry) -> MediaEntry {
    let mut out = MediaEntry {
        youtube: entry.youtube.clone(),
        ..Default::default()
    };
    for kind in MediaKind::ALL {
        out.set_items(kind, normalize_items(prefix, key, entry.items(kind)));
    }
    out
}

/// Reconcile a manifest against the media tree, without touching any file.
pub fn reconcile(
    input: &Manifest,
    config: &ReconcileConfig,
) -> Result<ReconcileReport, ManifestError> {
    let folders = discover_folders(&config.media_dir)?;
    let prefix = config.path_prefix.as_str();
    let empty = MediaEntry::default();

    let mut output = Manifest::default();
    let mut scanned_folders = Vec::new();

    for folder in &folders {
        let existing = input.get(folder).unwrap_or(&empty);
        let mut entry = MediaEntry {
            youtube: existing.youtube.clone(),
            ..Default::default()
        };

        // Scanned at most once, and only if some kind has nothing declared
        let mut scan: Option<ScannedMedia> = None;

        for kind in MediaKind::ALL {
            let declared = existing.items(kind);
            let items = if !declared.is_empty() {
                normalize_items(prefix, folder, declared)
            } else {
                if scan.is_none() {
                    let dir = config.media_dir.join(folder);
                    scan = Some(scan_folder(&dir, &config.extensions)?);
                    scanned_folders.push(folder.clone());
                }
                let names: &[String] = match &scan {
                    Some(scanned) => scanned.names(kind),
                    None => &[],
                };
                names
                    .iter()
                    .map(|name| media_path(prefix, folder, name))
                    .collect()
            };
            tracing::debug!("{}: {} {}", folder, items.len(), kind.as_str());
            entry.set_items(kind, items);
        }

        output.insert(folder.clone(), entry);
    }

    let mut preserved = Vec::new();
    for (key, entry) in &input.entries {
        if output.contains_key(key) {
            continue;
        }
        tracing::warn!("Preserving manifest-only key (no folder found): {}", key);
        output.insert(key.clone(), normalize_entry(prefix, key, entry));
        preserved.push(key.clone());
    }

    Ok(ReconcileReport {
        manifest: output,
        folders,
        scanned: scanned_folders,
        preserved,
        backup: None,
        changed: false,
    })
}

/// Reconcile the manifest file in place.
///
/// Both inputs must exist before anything happens. The manifest is parsed
/// and the new contents computed first; only then is the original copied
/// to its backup and replaced. A malformed manifest therefore aborts with
/// no file written.
pub fn run(config: &ReconcileConfig) -> Result<ReconcileReport, ManifestError> {
    let manifest_path = &config.manifest_path;
    if !manifest_path.is_file() {
        return Err(ManifestError::ManifestNotFound(manifest_path.clone()));
    }
    if !config.media_dir.is_dir() {
        return Err(ManifestError::MediaDirNotFound(config.media_dir.clone()));
    }

    let input = Manifest::load(manifest_path)?;

    let mut report = reconcile(&input, config)?;
    report.changed = report.manifest != input;

    let backup = backup::create_backup(manifest_path, &config.backup_suffix).map_err(|e| {
        ManifestError::Backup {
            path: manifest_path.clone(),
            source: e,
        }
    })?;
    report.backup = Some(backup);

    report.manifest.save(manifest_path)?;

    if report.changed {
        tracing::info!(
            "{} updated with normalized paths and entries for all {} media folders",
            manifest_path.display(),
            report.folders.len()
        );
    } else {
        tracing::info!("{} already up to date", manifest_path.display());
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestTree;
    use serde_json::Value;
    use std::fs;

    fn output_json(tree: &TestTree) -> Value {
        serde_json::from_str(&tree.manifest_text().unwrap()).unwrap()
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("a.png"), Some("a.png"));
        assert_eq!(basename("media/old/a.png"), Some("a.png"));
        assert_eq!(basename("/var/www/media/drug1/a.png"), Some("a.png"));
        assert_eq!(basename("C:\\legacy\\a.png"), Some("a.png"));
        assert_eq!(basename("x/./a.png"), Some("a.png"));
        assert_eq!(basename("dir/a.png/"), Some("a.png"));
        assert_eq!(basename("a.png/."), Some("a.png"));
    }

    #[test]
    fn test_basename_keeps_backslash_after_slash() {
        assert_eq!(basename("media/X/a\\b.png"), Some("a\\b.png"));
    }

    #[test]
    fn test_basename_without_file_name() {
        assert_eq!(basename(""), None);
        assert_eq!(basename("."), None);
        assert_eq!(basename("dir/"), Some("dir"));
        assert_eq!(basename("/"), None);
        assert_eq!(basename("x/.."), None);
    }

    #[test]
    fn test_normalize_items_drops_items_without_file_name() {
        let items = vec!["".to_string(), "a.png".to_string(), "/".to_string()];
        assert_eq!(normalize_items("media", "X", &items), vec!["media/X/a.png"]);
    }

    #[test]
    fn test_normalize_items_rehomes_legacy_paths() {
        let items = vec![
            "/abs/path/front.png".to_string(),
            "media/other/back.png".to_string(),
            "side.png".to_string(),
        ];
        assert_eq!(
            normalize_items("media", "drug1", &items),
            vec!["media/drug1/front.png", "media/drug1/back.png", "media/drug1/side.png"]
        );
    }

    #[test]
    fn test_media_path_without_prefix() {
        assert_eq!(media_path("", "drug1", "a.png"), "drug1/a.png");
    }

    #[test]
    fn test_empty_list_is_filled_from_disk() {
        let tree = TestTree::new().unwrap();
        tree.add_file("X", "b.jpg").unwrap();
        tree.add_file("X", "a.png").unwrap();
        let input = Manifest::parse(r#"{"X": {"images": []}}"#, tree.root()).unwrap();

        let report = reconcile(&input, &tree.reconcile_config()).unwrap();

        let entry = report.manifest.get("X").unwrap();
        assert_eq!(entry.images, vec!["media/X/a.png", "media/X/b.jpg"]);
        assert!(entry.videos.is_empty());
        assert!(entry.audio.is_empty());
        assert_eq!(report.scanned, vec!["X"]);
    }

    #[test]
    fn test_declared_list_wins_over_disk() {
        let tree = TestTree::new().unwrap();
        tree.add_file("X", "real.png").unwrap();
        let input = Manifest::parse(
            r#"{"X": {"images": ["old/dir/missing.png", "other.png"]}}"#,
            tree.root(),
        )
        .unwrap();

        let report = reconcile(&input, &tree.reconcile_config()).unwrap();

        let entry = report.manifest.get("X").unwrap();
        assert_eq!(entry.images, vec!["media/X/missing.png", "media/X/other.png"]);
    }

    #[test]
    fn test_kinds_resolve_independently() {
        let tree = TestTree::new().unwrap();
        tree.add_file("X", "a.png").unwrap();
        tree.add_file("X", "clip.mov").unwrap();
        tree.add_file("X", "voice.OGG").unwrap();
        let input = Manifest::parse(r#"{"X": {"images": ["curated.png"]}}"#, tree.root()).unwrap();

        let report = reconcile(&input, &tree.reconcile_config()).unwrap();

        let entry = report.manifest.get("X").unwrap();
        assert_eq!(entry.images, vec!["media/X/curated.png"]);
        assert_eq!(entry.videos, vec!["media/X/clip.mov"]);
        assert_eq!(entry.audio, vec!["media/X/voice.OGG"]);
    }

    #[test]
    fn test_fully_declared_folder_is_not_scanned() {
        let tree = TestTree::new().unwrap();
        tree.add_folder("X").unwrap();
        let input = Manifest::parse(
            r#"{"X": {"images": ["a.png"], "videos": ["b.mp4"], "audio": ["c.mp3"]}}"#,
            tree.root(),
        )
        .unwrap();

        let report = reconcile(&input, &tree.reconcile_config()).unwrap();
        assert!(report.scanned.is_empty());
    }

    #[test]
    fn test_folder_without_entry_gets_one() {
        let tree = TestTree::new().unwrap();
        tree.add_file("new_drug", "label.webp").unwrap();
        tree.add_file("new_drug", "readme.txt").unwrap();
        tree.add_folder("empty_drug").unwrap();

        let report = reconcile(&Manifest::default(), &tree.reconcile_config()).unwrap();

        assert_eq!(report.folders, vec!["empty_drug", "new_drug"]);
        assert_eq!(
            report.manifest.get("new_drug").unwrap().images,
            vec!["media/new_drug/label.webp"]
        );
        assert_eq!(report.manifest.get("empty_drug"), Some(&MediaEntry::default()));
    }

    #[test]
    fn test_youtube_passes_through() {
        let tree = TestTree::new().unwrap();
        tree.add_folder("X").unwrap();
        let input = Manifest::parse(
            r#"{"X": {"youtube": ["https://youtu.be/a?t=1", "dQw4w9WgXcQ"]}}"#,
            tree.root(),
        )
        .unwrap();

        let report = reconcile(&input, &tree.reconcile_config()).unwrap();
        assert_eq!(
            report.manifest.get("X").unwrap().youtube,
            vec!["https://youtu.be/a?t=1", "dQw4w9WgXcQ"]
        );
    }

    #[test]
    fn test_manifest_only_key_is_preserved() {
        let tree = TestTree::new().unwrap();
        tree.add_folder("X").unwrap();
        let input = Manifest::parse(
            r#"{"Y": {"images": ["/old/y.png"], "audio": null, "youtube": ["v1"]}}"#,
            tree.root(),
        )
        .unwrap();

        let report = reconcile(&input, &tree.reconcile_config()).unwrap();

        assert_eq!(report.preserved, vec!["Y"]);
        let entry = report.manifest.get("Y").unwrap();
        assert_eq!(entry.images, vec!["media/Y/y.png"]);
        assert!(entry.audio.is_empty());
        assert_eq!(entry.youtube, vec!["v1"]);
        assert!(report.manifest.contains_key("X"));
    }

    #[test]
    fn test_custom_prefix() {
        let tree = TestTree::new().unwrap();
        tree.add_file("X", "a.png").unwrap();
        let mut config = tree.reconcile_config();
        config.path_prefix = "static/media".to_string();

        let report = reconcile(&Manifest::default(), &config).unwrap();
        assert_eq!(
            report.manifest.get("X").unwrap().images,
            vec!["static/media/X/a.png"]
        );
    }

    #[test]
    fn test_run_writes_sorted_manifest_and_backup() {
        let tree = TestTree::new().unwrap();
        tree.add_file("b_drug", "b.png").unwrap();
        tree.add_file("a_drug", "a.mp3").unwrap();
        let original = r#"{"z_only": {"images": ["z.png"]}, "b_drug": {}}"#;
        tree.write_manifest(original).unwrap();

        let report = run(&tree.reconcile_config()).unwrap();

        let backup = report.backup.clone().unwrap();
        assert_eq!(fs::read_to_string(backup).unwrap(), original);
        assert!(report.changed);

        let json = output_json(&tree);
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["a_drug", "b_drug", "z_only"]);
        assert_eq!(json["a_drug"]["audio"][0], "media/a_drug/a.mp3");
        assert_eq!(json["b_drug"]["images"][0], "media/b_drug/b.png");
        assert_eq!(json["z_only"]["images"][0], "media/z_only/z.png");
    }

    #[test]
    fn test_run_every_path_matches_folder_layout() {
        let tree = TestTree::new().unwrap();
        tree.add_file("d1", "x.PNG").unwrap();
        tree.add_file("d1", "y.mkv").unwrap();
        tree.add_file("d2", "z.wav").unwrap();
        tree.write_manifest(r#"{"d2": {"images": ["/elsewhere/q.gif"]}}"#).unwrap();

        run(&tree.reconcile_config()).unwrap();

        let json = output_json(&tree);
        for folder in ["d1", "d2"] {
            let entry = &json[folder];
            for kind in ["images", "videos", "audio"] {
                for item in entry[kind].as_array().unwrap() {
                    let item = item.as_str().unwrap();
                    let rest = item.strip_prefix(&format!("media/{folder}/")).unwrap();
                    assert!(!rest.contains('/'), "unexpected path {item}");
                }
            }
        }
    }

    #[test]
    fn test_run_is_idempotent() {
        let tree = TestTree::new().unwrap();
        tree.add_file("d1", "a.png").unwrap();
        tree.add_file("d1", "b.MP4").unwrap();
        tree.add_file("d2", "c.flac").unwrap();
        tree.write_manifest(
            r#"{
                "orphan": {"videos": ["C:\\old\\v.mp4"], "youtube": ["y"]},
                "d2": {"images": ["legacy/i.jpg"]}
            }"#,
        )
        .unwrap();

        run(&tree.reconcile_config()).unwrap();
        let first = tree.manifest_text().unwrap();

        let report = run(&tree.reconcile_config()).unwrap();
        let second = tree.manifest_text().unwrap();

        assert_eq!(first, second);
        assert!(!report.changed);
    }

    #[test]
    fn test_run_is_idempotent_for_items_without_file_name() {
        let tree = TestTree::new().unwrap();
        tree.add_folder("X").unwrap();
        tree.write_manifest(r#"{"X": {"images": ["", ".", "dir/", "kept.png"]}}"#).unwrap();

        run(&tree.reconcile_config()).unwrap();
        let first = tree.manifest_text().unwrap();
        run(&tree.reconcile_config()).unwrap();
        let second = tree.manifest_text().unwrap();

        assert_eq!(first, second);
        let json = output_json(&tree);
        assert_eq!(json["X"]["images"], serde_json::json!(["media/X/dir", "media/X/kept.png"]));
    }

    #[test]
    fn test_run_is_idempotent_for_backslash_file_names() {
        let tree = TestTree::new().unwrap();
        tree.add_file("X", "a\\b.png").unwrap();
        tree.write_manifest("{}").unwrap();

        run(&tree.reconcile_config()).unwrap();
        let first = tree.manifest_text().unwrap();
        let report = run(&tree.reconcile_config()).unwrap();
        let second = tree.manifest_text().unwrap();

        assert_eq!(first, second);
        assert!(!report.changed);
        assert_eq!(output_json(&tree)["X"]["images"][0], "media/X/a\\b.png");
    }

    #[test]
    fn test_run_missing_manifest() {
        let tree = TestTree::new().unwrap();

        let err = run(&tree.reconcile_config()).unwrap_err();
        assert!(matches!(err, ManifestError::ManifestNotFound(_)));
    }

    #[test]
    fn test_run_missing_media_dir() {
        let tree = TestTree::empty().unwrap();
        tree.write_manifest("{}").unwrap();

        let err = run(&tree.reconcile_config()).unwrap_err();
        assert!(matches!(err, ManifestError::MediaDirNotFound(_)));
        assert!(!tree.root().join("media.json.bak").exists());
    }

    #[test]
    fn test_run_corrupt_manifest_touches_nothing() {
        let tree = TestTree::new().unwrap();
        tree.add_file("d1", "a.png").unwrap();
        tree.write_manifest("{ not json").unwrap();
        let config = tree.reconcile_config();

        let err = run(&config).unwrap_err();

        assert!(matches!(err, ManifestError::Parse { .. }));
        assert!(!tree.root().join("media.json.bak").exists());
        assert_eq!(tree.manifest_text().unwrap(), "{ not json");
    }
}
