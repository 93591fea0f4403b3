//! Archive fixtures and mock registry helpers

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Registry download endpoint path
pub const DOWNLOAD_PATH: &str = "/ct2/results/download";

/// Two small study records, as found in a registry result bundle
pub const STUDY_A: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<clinical_study><id_info><nct_id>NCT00000102</nct_id></id_info></clinical_study>"#;

/// Second study record
pub const STUDY_B: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<clinical_study><id_info><nct_id>NCT00000104</nct_id></id_info></clinical_study>"#;

/// Build an in-memory ZIP archive from `(name, content)` pairs
pub fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// The standard two-study archive
pub fn study_archive() -> Vec<u8> {
    zip_bytes(&[("a.xml", STUDY_A), ("b.xml", STUDY_B)])
}

/// Write a criteria file into `dir` and return its path
pub fn write_criteria(dir: &Path, lines: &[&str]) -> PathBuf {
    let path = dir.join("params.txt");
    std::fs::write(&path, lines.join("\n")).unwrap();
    path
}

/// Serve `body` for the given (space-separated) search term
pub async fn mount_archive(server: &MockServer, term: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(DOWNLOAD_PATH))
        .and(query_param("term", term))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}

/// Serve an HTTP error status for the given search term
pub async fn mount_status(server: &MockServer, term: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(DOWNLOAD_PATH))
        .and(query_param("term", term))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Raw query strings of every request the server received, in order
pub async fn received_queries(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| r.url.query().unwrap_or_default().to_string())
        .collect()
}

/// Snapshot of every regular file under `dir`, keyed by relative path
pub fn read_tree(dir: &Path) -> BTreeMap<String, Vec<u8>> {
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
