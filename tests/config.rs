use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use gribfetch::config::Config;
use gribfetch::domain::SourceId;
use gribfetch::error::FetchError;

#[test]
fn load_reads_explicit_config_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("gribfetch.json");
    std::fs::write(
        &path,
        r#"{
            "save_dir": "/tmp/grib-data",
            "priority": ["Azure", "aws"],
            "grib_size_threshold": 500,
            "retention": [{"source": "nomads", "days": 7}]
        }"#,
    )
    .unwrap();

    let config = Config::load(Some(path.to_str().unwrap())).unwrap();
    assert_eq!(config.save_dir, Utf8PathBuf::from("/tmp/grib-data"));
    assert_eq!(
        config.priority,
        Some(vec![SourceId::from("azure"), SourceId::from("aws")])
    );
    assert_eq!(config.resolver.grib_size_threshold, 500);
    assert_eq!(config.resolver.retention[0].days, 7);
    // Fields absent from the file keep their defaults.
    assert_eq!(config.resolver.ping_before.len(), 1);
}

#[test]
fn load_fails_for_missing_explicit_path() {
    let err = Config::load(Some("/nonexistent/gribfetch.json")).unwrap_err();
    assert_matches!(err, FetchError::ConfigRead(_));
}

#[test]
fn load_fails_for_malformed_json() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("gribfetch.json");
    std::fs::write(&path, "{not json").unwrap();

    let err = Config::load(Some(path.to_str().unwrap())).unwrap_err();
    assert_matches!(err, FetchError::ConfigParse(_));
}
