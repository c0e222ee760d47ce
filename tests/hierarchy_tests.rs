use anyhow::Result;
use std::io::Write;
use tempfile::NamedTempFile;

use civic_relay::errors::HierarchyError;
use civic_relay::hierarchy::{ChannelId, LocationHierarchy};

const MAPPING: &str = r#"{
    "Ташкентская область": {
        "Чирчик": {"Навбахор": -1001000000001, "Гулистон": "-1001000000002"},
        "Ангрен": {"Тинчлик": "@angren_officer"}
    },
    "Самаркандская область": {
        "Самарканд": {"Регистан": 5550001}
    }
}"#;

fn write_mapping(content: &str) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content.as_bytes())?;
    Ok(file)
}

#[test]
fn test_load_from_file() -> Result<()> {
    let file = write_mapping(MAPPING)?;
    let hierarchy = LocationHierarchy::load(file.path())?;

    assert_eq!(
        hierarchy.region_names(),
        vec!["Ташкентская область", "Самаркандская область"]
    );
    assert_eq!(
        hierarchy.district_names("Ташкентская область"),
        Some(vec!["Чирчик".to_string(), "Ангрен".to_string()])
    );
    assert_eq!(
        hierarchy.neighborhood_names("Ташкентская область", "Чирчик"),
        Some(vec!["Навбахор".to_string(), "Гулистон".to_string()])
    );
    assert_eq!(hierarchy.destination_count(), 4);

    Ok(())
}

#[test]
fn test_resolve_leaf_kinds() -> Result<()> {
    let hierarchy = LocationHierarchy::from_json_str(MAPPING)?;

    assert_eq!(
        hierarchy.resolve("Ташкентская область", "Чирчик", "Навбахор"),
        Some(&ChannelId::Numeric(-1001000000001))
    );
    assert_eq!(
        hierarchy.resolve("Ташкентская область", "Чирчик", "Гулистон"),
        Some(&ChannelId::Numeric(-1001000000002))
    );
    assert_eq!(
        hierarchy.resolve("Ташкентская область", "Ангрен", "Тинчлик"),
        Some(&ChannelId::Username("@angren_officer".to_string()))
    );
    assert_eq!(
        hierarchy.resolve("Самаркандская область", "Самарканд", "Регистан"),
        Some(&ChannelId::Numeric(5550001))
    );

    Ok(())
}

#[test]
fn test_lookups_are_exact() -> Result<()> {
    let hierarchy = LocationHierarchy::from_json_str(MAPPING)?;

    assert!(hierarchy.region("ташкентская область").is_none());
    assert!(hierarchy.region(" Ташкентская область").is_none());
    assert!(hierarchy.district_names("Unknown").is_none());
    assert!(hierarchy
        .neighborhood_names("Самаркандская область", "Чирчик")
        .is_none());
    assert!(hierarchy
        .resolve("Самаркандская область", "Самарканд", "Навбахор")
        .is_none());

    Ok(())
}

#[test]
fn test_missing_file() {
    let result = LocationHierarchy::load("/nonexistent/mapping.json");
    assert!(matches!(result, Err(HierarchyError::Io { .. })));
}

#[test]
fn test_invalid_json() {
    let result = LocationHierarchy::from_json_str("{ not json");
    assert!(matches!(result, Err(HierarchyError::Json(_))));
}

#[test]
fn test_empty_levels_are_rejected() {
    let result = LocationHierarchy::from_json_str("{}");
    assert!(matches!(result, Err(HierarchyError::Empty { .. })));

    let result = LocationHierarchy::from_json_str(r#"{"North": {}}"#);
    match result {
        Err(HierarchyError::Empty { path }) => assert_eq!(path, "North"),
        other => panic!("unexpected result: {other:?}"),
    }

    let result = LocationHierarchy::from_json_str(r#"{"North": {"CityA": {}}}"#);
    match result {
        Err(HierarchyError::Empty { path }) => assert_eq!(path, "North / CityA"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_invalid_shapes_are_rejected() {
    for document in [
        r#"["North"]"#,
        r#"{"North": ["CityA"]}"#,
        r#"{"North": {"CityA": 1001}}"#,
        r#"{"North": {"CityA": {"ZoneX": 10.5}}}"#,
        r#"{"North": {"CityA": {"ZoneX": true}}}"#,
        r#"{"North": {"CityA": {"ZoneX": ""}}}"#,
        r#"{"North": {"CityA": {"ZoneX": null}}}"#,
        r#"{"North": {"CityA": {"ZoneX": "Навбахор канал"}}}"#,
        r#"{"North": {"CityA": {"ZoneX": "@bad name"}}}"#,
    ] {
        let result = LocationHierarchy::from_json_str(document);
        assert!(
            matches!(result, Err(HierarchyError::InvalidShape { .. })),
            "document {document} should be rejected, got {result:?}"
        );
    }
}

#[test]
fn test_invalid_leaf_names_path() {
    let result = LocationHierarchy::from_json_str(r#"{"North": {"CityA": {"ZoneX": false}}}"#);
    match result {
        Err(HierarchyError::InvalidShape { path, .. }) => {
            assert_eq!(path, "North / CityA / ZoneX")
        }
        other => panic!("unexpected result: {other:?}"),
    }
}
