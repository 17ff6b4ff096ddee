//! Loading description files and rendering the resulting trees.

use std::fs;
use std::path::PathBuf;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use srtree::application::{ApplicationError, Description, RenderSettings, TreeDisplay};
use srtree::domain::ContentValue;
use srtree::{CodedEntry, DocumentType, RelationshipType, TreeError, ValueType};

const MEASUREMENT_REPORT: &str = r#"
document_type = "comprehensive"

[[items]]
value_type = "CONTAINER"
concept = { code = "126000", scheme = "DCM", meaning = "Imaging Measurement Report" }

[[items.children]]
relationship = "HAS OBS CONTEXT"
value_type = "PNAME"
concept = { code = "121008", scheme = "DCM", meaning = "Person Observer Name" }
value = "Doe^Jane"

[[items.children]]
relationship = "CONTAINS"
value_type = "NUM"
concept = { code = "121206", scheme = "DCM", meaning = "Distance" }
value = "12.5"
units = { code = "mm", scheme = "UCUM", meaning = "millimeter" }

[[items.children.children]]
relationship = "HAS CONCEPT MOD"
value_type = "CODE"
concept = { code = "363698007", scheme = "SCT", meaning = "Finding Site" }
code = { code = "T-28000", scheme = "SRT", meaning = "Lung" }

[[items.children]]
relationship = "CONTAINS"
value_type = "DATE"
concept = { code = "111060", scheme = "DCM", meaning = "Study Date" }
value = "20240131"
"#;

struct DescriptionFile {
    _dir: TempDir,
    path: PathBuf,
}

fn write_description(content: &str) -> DescriptionFile {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.toml");
    fs::write(&path, content).unwrap();
    DescriptionFile { _dir: dir, path }
}

#[fixture]
fn measurement_report() -> DescriptionFile {
    write_description(MEASUREMENT_REPORT)
}

#[rstest]
fn given_measurement_report_when_loading_then_document_built(measurement_report: DescriptionFile) {
    // Act
    let tree = Description::load(&measurement_report.path)
        .unwrap()
        .build_document(DocumentType::Enhanced)
        .unwrap();

    // Assert
    assert_eq!(tree.document_type(), DocumentType::Comprehensive);
    assert_eq!(tree.count_nodes(), 5);
    assert_eq!(tree.depth(), 3);
    let (_, site) = tree.iter().nth(3).unwrap();
    assert_eq!(
        site.item().relationship_type(),
        RelationshipType::HasConceptMod
    );
    assert_eq!(
        site.item().value(),
        &ContentValue::Code(Some(CodedEntry::new("T-28000", "SRT", "Lung")))
    );
    let (_, date) = tree.iter().nth(4).unwrap();
    assert_eq!(date.item().value().to_string(), "20240131");
}

#[rstest]
fn given_measurement_report_when_rendering_then_outline_shows_nesting(
    measurement_report: DescriptionFile,
) {
    let tree = Description::load(&measurement_report.path)
        .unwrap()
        .build_document(DocumentType::default())
        .unwrap();
    let settings = RenderSettings {
        show_ids: false,
        ..RenderSettings::default()
    };

    let outline = tree.to_outline("report.toml", &settings).to_string();

    assert!(outline.contains("HAS OBS CONTEXT PNAME (121008,DCM,\"Person Observer Name\") = \"Doe^Jane\""));
    assert!(outline.contains("CONTAINS NUM (121206,DCM,\"Distance\") = \"12.5\" (mm,UCUM,\"millimeter\")"));
    assert!(!outline.contains("[1]"));
}

#[rstest]
fn given_num_in_basic_text_when_loading_then_rejected_with_location() {
    let file = write_description(
        r#"
document_type = "basic-text"

[[items]]
value_type = "CONTAINER"

[[items.children]]
relationship = "CONTAINS"
value_type = "NUM"
"#,
    );

    let err = Description::load(&file.path)
        .unwrap()
        .build_document(DocumentType::default())
        .unwrap_err();

    match err {
        ApplicationError::Item { location, source } => {
            assert_eq!(location, "items[0].children[0]");
            assert_eq!(
                source,
                TreeError::InvalidRelationshipOrValueType {
                    relationship: RelationshipType::Contains,
                    value_type: ValueType::Num
                }
            );
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[rstest]
#[case("value = \"not a number\"", "NUM")]
#[case("value = \"2024-13-45\"", "DATE")]
#[case("value = \"1..2\"", "UIDREF")]
fn given_bad_value_when_loading_then_invalid_value(#[case] value: &str, #[case] value_type: &str) {
    let file = write_description(&format!(
        "[[items]]\nvalue_type = \"CONTAINER\"\n\n[[items.children]]\nrelationship = \"CONTAINS\"\nvalue_type = \"{value_type}\"\n{value}\n"
    ));

    let err = Description::load(&file.path)
        .unwrap()
        .build_document(DocumentType::Comprehensive)
        .unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Item {
            source: TreeError::InvalidValue { .. },
            ..
        }
    ));
}

#[test]
fn given_two_top_level_items_when_building_document_then_second_rejected() {
    let description = Description::from_toml(
        "[[items]]\nvalue_type = \"CONTAINER\"\n\n[[items]]\nvalue_type = \"CONTAINER\"\n",
    )
    .unwrap();

    let document = description.build_document(DocumentType::default());
    let fragment = description.build_fragment();

    assert!(matches!(document, Err(ApplicationError::Item { ref location, .. }) if location == "items[1]"));
    assert_eq!(fragment.unwrap().top_level().count(), 2);
}

#[test]
fn given_missing_file_when_loading_then_io_error() {
    let err = Description::load(std::path::Path::new("/nonexistent/report.toml")).unwrap_err();

    assert!(matches!(err, ApplicationError::Io { .. }));
}

#[test]
fn given_num_with_units_and_qualifier_but_no_value_when_loading_then_measurement_unavailable() {
    let file = write_description(
        r#"
[[items]]
value_type = "CONTAINER"

[[items.children]]
relationship = "CONTAINS"
value_type = "NUM"
concept = { code = "121206", scheme = "DCM", meaning = "Distance" }
units = { code = "mm", scheme = "UCUM", meaning = "millimeter" }
qualifier = { code = "114006", scheme = "DCM", meaning = "Measurement failure" }
"#,
    );

    let tree = Description::load(&file.path)
        .unwrap()
        .build_document(DocumentType::Comprehensive)
        .unwrap();

    let (_, distance) = tree.iter().nth(1).unwrap();
    let numeric = distance.item().numeric_value().unwrap();
    assert_eq!(numeric.value(), "");
    assert_eq!(numeric.units().unwrap().code_value(), "mm");
    assert_eq!(numeric.qualifier().unwrap().code_value(), "114006");
}

#[test]
fn given_observed_datetime_when_loading_then_stored_and_rendered() {
    let file = write_description(
        r#"
[[items]]
value_type = "CONTAINER"

[[items.children]]
relationship = "CONTAINS"
value_type = "TEXT"
value = "No change"
observed = "2024-01-31T10:15:00"
"#,
    );

    let tree = Description::load(&file.path)
        .unwrap()
        .build_document(DocumentType::Comprehensive)
        .unwrap();

    let (_, finding) = tree.iter().nth(1).unwrap();
    let expected = chrono::NaiveDate::from_ymd_opt(2024, 1, 31)
        .and_then(|d| d.and_hms_opt(10, 15, 0))
        .unwrap();
    assert_eq!(finding.item().observation_datetime(), Some(expected));
    let outline = tree
        .to_outline("report.toml", &RenderSettings::default())
        .to_string();
    assert!(outline.contains("[2] CONTAINS TEXT = \"No change\" @ 20240131101500"));
}

#[test]
fn given_malformed_observed_datetime_when_loading_then_item_error() {
    let description = Description::from_toml(
        "[[items]]\nvalue_type = \"CONTAINER\"\nobserved = \"yesterday\"\n",
    )
    .unwrap();

    let err = description.build_document(DocumentType::default()).unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Item {
            source: TreeError::InvalidValue {
                value_type: ValueType::DateTime,
                ..
            },
            ..
        }
    ));
}
