// tests/pipeline_loading.rs

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use cascade::compile_pipeline;
use cascade::config::{load_and_validate, load_from_path, parse_str};
use cascade::dag::{GraphChecks, StructuralError};
use cascade::errors::CascadeError;
use cascade::fs::mock::MockFileSystem;
use cascade::fs::RealFileSystem;
use cascade::types::DocumentFormat;

const TWO_STEPS_YAML: &str = r#"
build:
  source_repo: app
  command: make build
  paths: [src, include]

test:
  source_repo: app
  source_path: services/api
  command: make test
  dependencies: [build]
"#;

fn mock_with(path: &str, contents: &str) -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file(path, contents);
    fs
}

#[test]
fn yaml_document_is_loaded_with_defaults() {
    let fs = mock_with("pipeline.yaml", TWO_STEPS_YAML);
    let def = load_and_validate(&fs, "pipeline.yaml").expect("valid pipeline");

    assert_eq!(def.len(), 2);

    let build = def.get("build").unwrap();
    assert_eq!(build.source_repo, "app");
    assert_eq!(build.source_path, "");
    assert!(build.dependencies.is_empty());
    assert_eq!(build.paths, vec!["src", "include"]);

    let test = def.get("test").unwrap();
    assert_eq!(test.source_path, "services/api");
    assert_eq!(test.dependencies, vec!["build"]);
    assert!(test.paths.is_empty());
}

#[test]
fn toml_document_is_selected_by_extension() {
    let fs = mock_with(
        "ci/pipeline.toml",
        r#"
[build]
source_repo = "app"
command = "make build"

[test]
source_repo = "app"
command = "make test"
dependencies = ["build"]
"#,
    );

    let def = load_and_validate(&fs, "ci/pipeline.toml").expect("valid pipeline");
    assert_eq!(def.sorted_names(), vec!["build", "test"]);
}

#[test]
fn unknown_field_is_a_decode_error() {
    let err = parse_str(
        "build:\n  source_repo: app\n  command: make\n  cmd: oops\n",
        DocumentFormat::Yaml,
    )
    .unwrap_err();
    assert!(matches!(err, CascadeError::YamlError(_)), "got {err:?}");
}

#[test]
fn non_mapping_document_is_a_decode_error() {
    let err = parse_str("- build\n- test\n", DocumentFormat::Yaml).unwrap_err();
    assert!(matches!(err, CascadeError::YamlError(_)), "got {err:?}");

    let err = parse_str("build = 3\n", DocumentFormat::Toml).unwrap_err();
    assert!(matches!(err, CascadeError::TomlError(_)), "got {err:?}");
}

#[test]
fn missing_file_is_reported() {
    let fs = MockFileSystem::new();
    let err = load_from_path(&fs, "nope.yaml").unwrap_err();
    assert!(err.to_string().contains("does not exist"), "got {err}");
}

#[test]
fn declaration_errors_surface_through_the_loader() {
    let fs = mock_with(
        "pipeline.yaml",
        "a:\n  source_repo: r\n  command: x\n  dependencies: [a, b]\n",
    );

    match load_and_validate(&fs, "pipeline.yaml") {
        Err(CascadeError::Declaration(report)) => {
            let lines: Vec<String> = report.issues().iter().map(|i| i.to_string()).collect();
            assert_eq!(
                lines,
                vec![
                    "a: has dependency on itself",
                    "a: declared dependency b is not defined",
                ]
            );
        }
        other => panic!("expected declaration error, got {other:?}"),
    }
}

#[test]
fn real_filesystem_reads_a_temp_file() {
    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .unwrap();
    write!(file, "{TWO_STEPS_YAML}").unwrap();

    let graph = compile_pipeline(&RealFileSystem, file.path(), &GraphChecks::default())
        .expect("pipeline should compile");
    assert_eq!(graph.len(), 2);
    assert_eq!(graph.by_name("test").unwrap().predecessors, vec![graph.id_of("build").unwrap()]);
}

#[test]
fn cycle_is_rejected_before_scheduling() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
a:
  source_repo: r
  command: echo a
  dependencies: [b]
b:
  source_repo: r
  command: echo b
  dependencies: [a]
"#
    )
    .unwrap();

    let err = compile_pipeline(&RealFileSystem, file.path(), &GraphChecks::default()).unwrap_err();

    match err.downcast_ref::<StructuralError>() {
        Some(StructuralError::Cycle { step }) => {
            assert!(step == "a" || step == "b");
            assert!(err.to_string().contains("cycle detected"));
        }
        other => panic!("expected cycle error, got {other:?}"),
    }
}

#[test]
fn disconnected_pipeline_is_rejected_unless_allowed() {
    let fs = mock_with(
        "p.yaml",
        "a:\n  source_repo: r\n  command: echo a\nb:\n  source_repo: r\n  command: echo b\n",
    );
    let path = Path::new("p.yaml");

    let err = compile_pipeline(&fs, path, &GraphChecks::default()).unwrap_err();
    assert_eq!(
        err.downcast_ref::<StructuralError>(),
        Some(&StructuralError::Disconnected {
            components: vec![vec!["a".to_string()], vec!["b".to_string()]],
        })
    );

    let relaxed = GraphChecks {
        require_connected: false,
    };
    let graph = compile_pipeline(&fs, path, &relaxed).expect("relaxed checks accept it");
    assert_eq!(graph.len(), 2);
}

#[test]
fn declaration_error_is_reachable_through_compile_context() {
    let fs = mock_with("p.yaml", "a:\n  command: echo a\n");

    let err = compile_pipeline(&fs, Path::new("p.yaml"), &GraphChecks::default()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CascadeError>(),
        Some(CascadeError::Declaration(_))
    ));
    assert!(format!("{err:#}").contains("a: missing entries: [source_repo]"));
}
