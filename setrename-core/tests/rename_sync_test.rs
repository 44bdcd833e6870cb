use setrename_core::{
    rename_files, rename_files_with, CorrelationKey, KeyExtractor, MatchMode, ProcessFailure,
    ProcessWarning, RenameOptions, SetKind, SetManager, SetSize,
};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn touch(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, name).unwrap();
    path
}

fn file_names(dir: &Path) -> BTreeSet<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

fn set_of(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(ToString::to_string).collect()
}

#[test]
fn test_synced_folders_share_base_name_and_keep_extensions() {
    let temp_dir = TempDir::new().unwrap();
    let primary = temp_dir.path().join("photos");
    let synced = temp_dir.path().join("scans");
    fs::create_dir_all(&primary).unwrap();
    fs::create_dir_all(&synced).unwrap();

    let photo_42 = touch(&primary, "photo (42).jpg");
    let photo_7 = touch(&primary, "photo (7).jpg");
    touch(&synced, "scan (42).png");
    touch(&synced, "scan (7).png");

    let mut manager = SetManager::new();
    manager
        .add_set(SetSize::Two, vec![photo_42.clone(), photo_7.clone()])
        .unwrap();

    let report = rename_files(
        manager.get_all_sets(),
        &primary,
        &[synced.clone()],
        &RenameOptions::default(),
    )
    .unwrap();

    assert_eq!(file_names(&primary), set_of(&["set2-no1 (1).jpg", "set2-no1 (2).jpg"]));
    assert_eq!(file_names(&synced), set_of(&["set2-no1 (1).png", "set2-no1 (2).png"]));
    assert!(report.warnings.is_empty());

    // Member by member, primary folder first
    assert_eq!(
        report.pairs(),
        vec![
            (photo_42, primary.join("set2-no1 (1).jpg")),
            (synced.join("scan (42).png"), synced.join("set2-no1 (1).png")),
            (photo_7, primary.join("set2-no1 (2).jpg")),
            (synced.join("scan (7).png"), synced.join("set2-no1 (2).png")),
        ]
    );
    // Contents travel with the rename
    assert_eq!(
        fs::read_to_string(synced.join("set2-no1 (2).png")).unwrap(),
        "scan (7).png"
    );
}

#[test]
fn test_set1_numbering_spans_separate_additions() {
    let temp_dir = TempDir::new().unwrap();
    let primary = temp_dir.path();
    let first: Vec<PathBuf> = ["e (5).jpg", "a (1).jpg"]
        .iter()
        .map(|n| touch(primary, n))
        .collect();
    let second: Vec<PathBuf> = ["c (3).png", "b (2).webp", "d (4).pdf"]
        .iter()
        .map(|n| touch(primary, n))
        .collect();

    let mut manager = SetManager::new();
    manager.add_set(SetSize::One, first).unwrap();
    manager.add_set(SetSize::One, second).unwrap();

    let report = rename_files(manager.get_all_sets(), primary, &[], &RenameOptions::default())
        .unwrap();

    let renamed: Vec<(String, String)> = report
        .renamed
        .iter()
        .map(|r| {
            (
                r.from.file_name().unwrap().to_string_lossy().into_owned(),
                r.to.file_name().unwrap().to_string_lossy().into_owned(),
            )
        })
        .collect();
    assert_eq!(
        renamed,
        vec![
            ("e (5).jpg".to_string(), "set1 (1).jpg".to_string()),
            ("a (1).jpg".to_string(), "set1 (2).jpg".to_string()),
            ("c (3).png".to_string(), "set1 (3).png".to_string()),
            ("b (2).webp".to_string(), "set1 (4).webp".to_string()),
            ("d (4).pdf".to_string(), "set1 (5).pdf".to_string()),
        ]
    );
}

#[test]
fn test_file_without_id_is_skipped_with_warning() {
    let temp_dir = TempDir::new().unwrap();
    let primary = temp_dir.path();
    let loose = touch(primary, "cover.jpg");
    let a = touch(primary, "a (1).jpg");
    let b = touch(primary, "b (2).jpg");
    let c = touch(primary, "c (3).jpg");

    let mut manager = SetManager::new();
    manager.add_set(SetSize::Three, vec![a, loose.clone(), b]).unwrap();
    manager.add_set(SetSize::One, vec![c]).unwrap();

    let report = rename_files(manager.get_all_sets(), primary, &[], &RenameOptions::default())
        .unwrap();

    assert_eq!(report.processed(), 3);
    assert_eq!(
        report.warnings,
        vec![ProcessWarning::MissingKey { path: loose }]
    );
    assert_eq!(
        file_names(primary),
        set_of(&["cover.jpg", "set1 (1).jpg", "set3-no1 (1).jpg", "set3-no1 (3).jpg"])
    );
}

#[test]
fn test_unmatched_synced_folder_warns_and_continues() {
    let temp_dir = TempDir::new().unwrap();
    let primary = temp_dir.path().join("primary");
    let partial = temp_dir.path().join("partial");
    let full = temp_dir.path().join("full");
    for dir in [&primary, &partial, &full] {
        fs::create_dir_all(dir).unwrap();
    }

    let a = touch(&primary, "a (1).jpg");
    let b = touch(&primary, "b (2).jpg");
    touch(&partial, "a (1).png");
    touch(&full, "a (1).tif");
    touch(&full, "b (2).tif");

    let mut manager = SetManager::new();
    manager.add_set(SetSize::Two, vec![a, b]).unwrap();

    let report = rename_files(
        manager.get_all_sets(),
        &primary,
        &[partial.clone(), full.clone()],
        &RenameOptions::default(),
    )
    .unwrap();

    assert_eq!(report.processed(), 5);
    assert_eq!(
        report.warnings,
        vec![ProcessWarning::NoMatch {
            key: CorrelationKey::new("2"),
            folder: partial.clone(),
        }]
    );
    assert_eq!(file_names(&partial), set_of(&["set2-no1 (1).png"]));
    assert_eq!(
        file_names(&full),
        set_of(&["set2-no1 (1).tif", "set2-no1 (2).tif"])
    );
}

#[test]
fn test_renamed_outputs_are_not_matched_again() {
    // "set1 (1).jpg" carries ID 1 itself; it must not be picked up for member "x (1).jpg"
    let temp_dir = TempDir::new().unwrap();
    let primary = temp_dir.path();
    let first = touch(primary, "z (9).jpg");
    let second = touch(primary, "x (1).jpg");

    let mut manager = SetManager::new();
    manager.add_set(SetSize::One, vec![first, second]).unwrap();

    rename_files(manager.get_all_sets(), primary, &[], &RenameOptions::default()).unwrap();

    assert_eq!(file_names(primary), set_of(&["set1 (1).jpg", "set1 (2).jpg"]));
    assert_eq!(
        fs::read_to_string(primary.join("set1 (1).jpg")).unwrap(),
        "z (9).jpg"
    );
    assert_eq!(
        fs::read_to_string(primary.join("set1 (2).jpg")).unwrap(),
        "x (1).jpg"
    );
}

#[test]
fn test_duplicate_ids_use_first_file_by_name() {
    // Two files sharing an ID in one folder is undefined upstream; first by name wins here
    let temp_dir = TempDir::new().unwrap();
    let primary = temp_dir.path();
    let a = touch(primary, "a (3).jpg");
    touch(primary, "b (3).jpg");

    let mut manager = SetManager::new();
    manager.add_set(SetSize::One, vec![a]).unwrap();

    let report = rename_files(manager.get_all_sets(), primary, &[], &RenameOptions::default())
        .unwrap();

    assert_eq!(file_names(primary), set_of(&["b (3).jpg", "set1 (1).jpg"]));
    assert!(matches!(
        report.warnings.as_slice(),
        [ProcessWarning::DuplicateKey { kept, .. }] if kept == &primary.join("a (3).jpg")
    ));
}

#[test]
fn test_copy_mode_preserves_sources() {
    let temp_dir = TempDir::new().unwrap();
    let primary = temp_dir.path().join("photos");
    let synced = temp_dir.path().join("scans");
    let out = temp_dir.path().join("out");
    fs::create_dir_all(&primary).unwrap();
    fs::create_dir_all(&synced).unwrap();

    let photo = touch(&primary, "photo (42).jpg");
    touch(&synced, "scan (42).jpg");

    let mut manager = SetManager::new();
    manager.add_set(SetSize::One, vec![photo]).unwrap();

    let options = RenameOptions {
        output_dir: Some(out.clone()),
        match_mode: MatchMode::Identifier,
    };
    let report = rename_files(manager.get_all_sets(), &primary, &[synced.clone()], &options)
        .unwrap();

    assert_eq!(report.processed(), 2);
    assert_eq!(file_names(&primary), set_of(&["photo (42).jpg"]));
    assert_eq!(file_names(&synced), set_of(&["scan (42).jpg"]));
    assert_eq!(
        fs::read_to_string(out.join("set1 (1).jpg")).unwrap(),
        "photo (42).jpg"
    );
    assert_eq!(
        fs::read_to_string(out.join("scans").join("set1 (1).jpg")).unwrap(),
        "scan (42).jpg"
    );
}

#[test]
fn test_direct_mode_renames_paths_without_ids() {
    let temp_dir = TempDir::new().unwrap();
    let primary = temp_dir.path().join("photos");
    let synced = temp_dir.path().join("scans");
    fs::create_dir_all(&primary).unwrap();
    fs::create_dir_all(&synced).unwrap();

    let a = touch(&primary, "beach.jpg");
    let b = touch(&primary, "sunset.png");
    touch(&synced, "untouched (1).png");

    let mut manager = SetManager::new();
    manager.add_set(SetSize::Two, vec![a, b]).unwrap();

    let options = RenameOptions {
        output_dir: None,
        match_mode: MatchMode::Direct,
    };
    let report = rename_files(manager.get_all_sets(), &primary, &[synced.clone()], &options)
        .unwrap();

    assert_eq!(file_names(&primary), set_of(&["set2-no1 (1).jpg", "set2-no1 (2).png"]));
    assert_eq!(file_names(&synced), set_of(&["untouched (1).png"]));
    assert_eq!(
        report.warnings,
        vec![ProcessWarning::SyncIgnored { folder: synced }]
    );
}

#[test]
fn test_failure_reports_partial_progress() {
    let temp_dir = TempDir::new().unwrap();
    let primary = temp_dir.path();
    let a = touch(primary, "a (1).jpg");
    let b = touch(primary, "b (2).jpg");
    // Occupies the name the second member would get
    touch(primary, "set2-no1 (2).jpg");

    let mut manager = SetManager::new();
    manager.add_set(SetSize::Two, vec![a.clone(), b.clone()]).unwrap();

    let err = rename_files(manager.get_all_sets(), primary, &[], &RenameOptions::default())
        .unwrap_err();

    assert!(err.is_partial());
    assert_eq!(err.completed.len(), 1);
    assert_eq!(err.completed[0].from, a);
    match &err.failure {
        ProcessFailure::Transfer { from, to, .. } => {
            assert_eq!(from, &b);
            assert_eq!(to, &primary.join("set2-no1 (2).jpg"));
        },
        other => panic!("unexpected failure: {other:?}"),
    }
    // Committed work stays, nothing was overwritten
    assert!(primary.join("set2-no1 (1).jpg").exists());
    assert!(b.exists());
    assert_eq!(
        fs::read_to_string(primary.join("set2-no1 (2).jpg")).unwrap(),
        "set2-no1 (2).jpg"
    );
}

#[test]
fn test_failure_before_any_rename_is_not_partial() {
    let temp_dir = TempDir::new().unwrap();
    let primary = temp_dir.path().join("photos");
    fs::create_dir_all(&primary).unwrap();
    let a = touch(&primary, "a (1).jpg");
    let missing = temp_dir.path().join("missing");

    let mut manager = SetManager::new();
    manager.add_set(SetSize::One, vec![a.clone()]).unwrap();

    let err = rename_files(
        manager.get_all_sets(),
        &primary,
        &[missing.clone()],
        &RenameOptions::default(),
    )
    .unwrap_err();

    assert!(!err.is_partial());
    assert!(matches!(&err.failure, ProcessFailure::Scan { folder, .. } if folder == &missing));
    assert!(a.exists());
}

/// Keys taken from a leading number, e.g. `042_beach.jpg`
struct LeadingNumber;

impl KeyExtractor for LeadingNumber {
    fn extract(&self, file_name: &str) -> Option<CorrelationKey> {
        let digits: String = file_name.chars().take_while(char::is_ascii_digit).collect();
        (!digits.is_empty()).then(|| CorrelationKey::new(digits))
    }
}

#[test]
fn test_custom_key_extractor() {
    let temp_dir = TempDir::new().unwrap();
    let primary = temp_dir.path().join("photos");
    let synced = temp_dir.path().join("raw");
    fs::create_dir_all(&primary).unwrap();
    fs::create_dir_all(&synced).unwrap();

    let photo = touch(&primary, "042_beach.jpg");
    touch(&synced, "042.raw");

    let mut sets = std::collections::BTreeMap::new();
    sets.insert(
        SetKind::Numbered {
            size: SetSize::Two,
            index: 5,
        },
        vec![photo, primary.join("nothing.jpg")],
    );

    let report = rename_files_with(
        &sets,
        &primary,
        &[synced.clone()],
        &RenameOptions::default(),
        &LeadingNumber,
    )
    .unwrap();

    assert_eq!(report.processed(), 2);
    assert_eq!(file_names(&primary), set_of(&["set2-no5 (1).jpg"]));
    assert_eq!(file_names(&synced), set_of(&["set2-no5 (1).raw"]));
}
