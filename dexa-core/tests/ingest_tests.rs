use dexa_core::domain::*;
use dexa_core::ingest;
use dexa_core::profile::{ColumnKind, DatasetProfile};
use pretty_assertions::assert_eq;
use serde_json::json;

fn dataset_from(file_name: &str, bytes: &[u8]) -> Dataset {
    let user_id = UserId::new();
    let file = ingest::ingest(file_name, bytes, &UploadConfig::default()).unwrap();
    Dataset::new(NewDataset {
        user_id,
        name: file_name.to_string(),
        description: None,
        file_type: file.file_type,
        file_name: file_name.to_string(),
        size_bytes: file.size_bytes,
        checksum: file.checksum,
        columns: file.columns,
        row_count: file.row_count,
        sample: file.sample,
        full_content: file.full_content,
    })
}

// ===== CSV Tests =====

#[test]
fn test_csv_header_and_two_rows() {
    let file = ingest::ingest("abc.csv", b"a,b,c\n1,2,3\n4,5,6\n", &UploadConfig::default()).unwrap();

    assert_eq!(file.file_type, FileType::Csv);
    assert_eq!(file.columns, vec!["a", "b", "c"]);
    assert_eq!(file.row_count, 2);
    assert_eq!(file.sample.len(), 2);
}

#[test]
fn test_csv_sample_is_capped() {
    let mut content = String::from("id,label\n");
    for i in 0..12 {
        content.push_str(&format!("{},row{}\n", i, i));
    }
    let file = ingest::ingest("many.csv", content.as_bytes(), &UploadConfig::default()).unwrap();

    assert_eq!(file.row_count, 12);
    assert_eq!(file.sample.len(), 5);
    assert_eq!(file.sample[4].get("label"), Some(&json!("row4")));
}

#[test]
fn test_same_bytes_same_checksum() {
    let bytes = b"a,b\n1,2\n";
    let first = ingest::ingest("x.csv", bytes, &UploadConfig::default()).unwrap();
    let second = ingest::ingest("x.csv", bytes, &UploadConfig::default()).unwrap();
    assert_eq!(first.checksum, second.checksum);
}

#[test]
fn test_reupload_gets_its_own_blob_key() {
    let first = dataset_from("x.csv", b"a,b\n1,2\n");
    let second = dataset_from("x.csv", b"a,b\n1,2\n");

    assert_ne!(first.blob_key, second.blob_key);
    assert_eq!(first.blob_key, format!("{}/{}-x.csv", first.user_id, first.id));
}

#[test]
fn test_reupload_creates_distinct_dataset() {
    let first = dataset_from("x.csv", b"a,b\n1,2\n");
    let second = dataset_from("x.csv", b"a,b\n1,2\n");
    assert_ne!(first.id, second.id);
    assert_eq!(first.checksum, second.checksum);
}

// ===== JSON Tests =====

#[test]
fn test_json_records() {
    let file = ingest::ingest(
        "people.json",
        br#"[{"name": "ann", "age": 31}, {"name": "bob", "city": "Oslo"}]"#,
        &UploadConfig::default(),
    )
    .unwrap();

    assert_eq!(file.columns, vec!["name", "age", "city"]);
    assert_eq!(file.row_count, 2);
}

#[test]
fn test_malformed_json_keeps_the_upload() {
    let file = ingest::ingest("broken.json", b"{\"a\": ", &UploadConfig::default()).unwrap();
    assert!(file.columns.is_empty());
    assert_eq!(file.row_count, 0);
    assert_eq!(file.full_content.as_deref(), Some("{\"a\": "));
}

// ===== Profile Tests =====

#[test]
fn test_profile_uses_full_content() {
    let mut content = String::from("score\n");
    for i in 1..=10 {
        content.push_str(&format!("{}\n", i));
    }
    let dataset = dataset_from("scores.csv", content.as_bytes());
    let profile = DatasetProfile::from_dataset(&dataset);

    assert_eq!(profile.sample.len(), 5);
    assert_eq!(profile.summary[0].kind, ColumnKind::Numeric);
    assert_eq!(profile.summary[0].count, 10);
    assert_eq!(profile.summary[0].max, Some(10.0));
    assert_eq!(profile.summary[0].mean, Some(5.5));
}

#[test]
fn test_profile_falls_back_to_sample() {
    let mut dataset = dataset_from("s.csv", b"k,v\nx,1\ny,2\n");
    dataset.full_content = None;
    let profile = DatasetProfile::from_dataset(&dataset);

    assert_eq!(profile.summary[0].kind, ColumnKind::Text);
    assert_eq!(profile.summary[0].distinct, Some(2));
    assert!(profile.render().starts_with("Columns: [k, v]\nRows: 2\nSample: ["));
}

#[test]
fn test_excel_profile_is_empty() {
    let dataset = dataset_from("book.xls", &[0xd0, 0xcf, 0x11, 0xe0]);
    let profile = DatasetProfile::from_dataset(&dataset);
    assert!(profile.columns.is_empty());
    assert!(profile.render().ends_with("Summary: (no columns)"));
}
