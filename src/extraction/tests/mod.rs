use crate::config::UnsafeEntryPolicy;
use crate::error::{Error, ExtractionError};
use crate::extraction::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Create a ZIP archive containing the given entries (names ending in `/` are directories)
fn create_zip_archive(archive_path: &Path, entries: &[(&str, &[u8])]) {
    let file = std::fs::File::create(archive_path).unwrap();
    let mut writer = ::zip::ZipWriter::new(file);
    let options = ::zip::write::FileOptions::default()
        .compression_method(::zip::CompressionMethod::Deflated);
    for (name, content) in entries {
        if let Some(dir) = name.strip_suffix('/') {
            writer.add_directory(dir, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            std::io::Write::write_all(&mut writer, content).unwrap();
        }
    }
    writer.finish().unwrap();
}

/// Snapshot of every regular file under `dir`, keyed by relative path
fn read_tree(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e
                .path()
                .strip_prefix(dir)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/");
            (rel, std::fs::read(e.path()).unwrap())
        })
        .collect()
}

// ---------------------------------------------------------------------------
// extraction_dir_for
// ---------------------------------------------------------------------------

#[test]
fn test_extraction_dir_strips_zip_extension() {
    let dir = extraction_dir_for(Path::new("/data/downloads/diabetes_treatment_research.zip"))
        .unwrap();
    assert_eq!(
        dir,
        PathBuf::from("/data/downloads/diabetes_treatment_research")
    );
}

#[test]
fn test_extraction_dir_is_case_insensitive() {
    let dir = extraction_dir_for(Path::new("downloads/CANCER_research.ZIP")).unwrap();
    assert_eq!(dir, PathBuf::from("downloads/CANCER_research"));
}

#[test]
fn test_extraction_dir_only_strips_final_extension() {
    let dir = extraction_dir_for(Path::new("downloads/a.zip.zip")).unwrap();
    assert_eq!(dir, PathBuf::from("downloads/a.zip"));
}

#[test]
fn test_extraction_dir_rejects_other_suffixes() {
    for path in ["downloads/cancer_research", "downloads/cancer.7z", "downloads/.zip"] {
        let err = extraction_dir_for(Path::new(path)).unwrap_err();
        assert!(
            matches!(err, Error::Extraction(ExtractionError::InvalidPath { .. })),
            "{path} should be rejected, got {err:?}"
        );
    }
}

// ---------------------------------------------------------------------------
// ZipExtractor
// ---------------------------------------------------------------------------

#[test]
fn test_zip_round_trip_preserves_files_and_bytes() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("fixture.zip");
    let a = b"<clinical_study><id>NCT0001</id></clinical_study>".as_slice();
    let b = b"<clinical_study><id>NCT0002</id></clinical_study>".as_slice();
    create_zip_archive(&archive, &[("a.xml", a), ("b.xml", b)]);

    let dest = temp.path().join("fixture");
    let files = ZipExtractor::extract(&archive, &dest, UnsafeEntryPolicy::Reject).unwrap();

    assert_eq!(files, vec![dest.join("a.xml"), dest.join("b.xml")]);
    let tree = read_tree(&dest);
    assert_eq!(tree.len(), 2, "exactly the archived files: {:?}", tree.keys());
    assert_eq!(tree["a.xml"], a);
    assert_eq!(tree["b.xml"], b);
}

#[test]
fn test_zip_preserves_nested_paths_and_directories() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("nested.zip");
    create_zip_archive(
        &archive,
        &[
            ("empty/", b""),
            ("studies/2019/NCT1.xml", b"one"),
            ("studies/NCT2.xml", b"two"),
        ],
    );

    let dest = temp.path().join("nested");
    let files = ZipExtractor::extract(&archive, &dest, UnsafeEntryPolicy::Reject).unwrap();

    assert_eq!(files.len(), 2, "directories are not reported as files");
    assert!(dest.join("empty").is_dir());
    assert_eq!(std::fs::read(dest.join("studies/2019/NCT1.xml")).unwrap(), b"one");
    assert_eq!(std::fs::read(dest.join("studies/NCT2.xml")).unwrap(), b"two");
}

#[test]
fn test_zip_extract_into_existing_directory() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("again.zip");
    create_zip_archive(&archive, &[("a.xml", b"new")]);

    let dest = temp.path().join("again");
    std::fs::create_dir_all(&dest).unwrap();
    std::fs::write(dest.join("old.xml"), b"old").unwrap();

    ZipExtractor::extract(&archive, &dest, UnsafeEntryPolicy::Reject).unwrap();

    let tree = read_tree(&dest);
    assert_eq!(tree["a.xml"], b"new");
    assert_eq!(tree["old.xml"], b"old", "unrelated files are left in place");
}

#[test]
fn test_zip_rejects_parent_traversal_by_default() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("evil.zip");
    create_zip_archive(&archive, &[("ok.xml", b"ok"), ("../escape.xml", b"evil")]);

    let dest = temp.path().join("evil");
    let err = ZipExtractor::extract(&archive, &dest, UnsafeEntryPolicy::Reject).unwrap_err();

    match err {
        Error::Extraction(ExtractionError::UnsafeEntry { entry, .. }) => {
            assert_eq!(entry, "../escape.xml");
        }
        other => panic!("expected UnsafeEntry, got {other:?}"),
    }
    assert!(!temp.path().join("escape.xml").exists());
}

#[test]
fn test_zip_rejected_archive_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("evil.zip");
    create_zip_archive(
        &archive,
        &[("a.xml", b"a"), ("nested/", b""), ("nested/b.xml", b"b"), ("../escape.xml", b"evil")],
    );

    let dest = temp.path().join("evil");
    let result = ZipExtractor::extract(&archive, &dest, UnsafeEntryPolicy::Reject);

    assert!(result.is_err());
    assert!(!dest.exists(), "no partial result directory is left behind");
}

#[test]
fn test_zip_rejected_archive_leaves_existing_directory_untouched() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("evil.zip");
    create_zip_archive(&archive, &[("a.xml", b"new"), ("../escape.xml", b"evil")]);

    let dest = temp.path().join("evil");
    std::fs::create_dir(&dest).unwrap();
    std::fs::write(dest.join("old.xml"), b"old").unwrap();

    assert!(ZipExtractor::extract(&archive, &dest, UnsafeEntryPolicy::Reject).is_err());

    let tree = read_tree(&dest);
    assert_eq!(tree.len(), 1);
    assert_eq!(tree["old.xml"], b"old");
}

#[test]
fn test_zip_skip_policy_drops_unsafe_entries() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("mixed.zip");
    create_zip_archive(
        &archive,
        &[("ok.xml", b"ok"), ("../escape.xml", b"evil"), ("/abs.xml", b"evil")],
    );

    let dest = temp.path().join("mixed");
    let files = ZipExtractor::extract(&archive, &dest, UnsafeEntryPolicy::Skip).unwrap();

    assert_eq!(files, vec![dest.join("ok.xml")]);
    assert!(!temp.path().join("escape.xml").exists());
    assert_eq!(read_tree(&dest).len(), 1);
}

#[test]
fn test_zip_corrupt_archive_is_extraction_error() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("broken.zip");
    std::fs::write(&archive, b"<html>Service Unavailable</html>").unwrap();

    let err = ZipExtractor::extract(&archive, &temp.path().join("broken"), UnsafeEntryPolicy::Reject)
        .unwrap_err();

    assert!(
        matches!(err, Error::Extraction(ExtractionError::Corrupt { .. })),
        "got {err:?}"
    );
}

#[test]
fn test_zip_missing_archive_is_io_error() {
    let temp = TempDir::new().unwrap();
    let err = ZipExtractor::extract(
        &temp.path().join("absent.zip"),
        &temp.path().join("absent"),
        UnsafeEntryPolicy::Reject,
    )
    .unwrap_err();

    assert!(matches!(err, Error::Io(_)), "got {err:?}");
}

// ---------------------------------------------------------------------------
// extract_archive
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_extract_archive_reports_directory_name() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("diabetes_treatment_research.zip");
    create_zip_archive(&archive, &[("a.xml", b"a"), ("b.xml", b"b")]);

    let extracted = extract_archive(&archive, UnsafeEntryPolicy::Reject)
        .await
        .unwrap();

    assert_eq!(extracted.name, "diabetes_treatment_research");
    assert_eq!(
        extracted.directory,
        temp.path().join("diabetes_treatment_research")
    );
    assert_eq!(extracted.files.len(), 2);
    assert!(archive.exists(), "extraction itself never deletes the archive");
}

#[tokio::test]
async fn test_extract_archive_rejects_non_zip_before_touching_disk() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("results.tar");
    std::fs::write(&archive, b"data").unwrap();

    let err = extract_archive(&archive, UnsafeEntryPolicy::Reject)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Extraction(ExtractionError::InvalidPath { .. })
    ));
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 1);
}
