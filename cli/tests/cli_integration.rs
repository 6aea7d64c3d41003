use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const ONTOLOGY: &str = "@prefix : <https://example.org/rico#> .
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .

<https://example.org/rico#> a owl:Ontology .
:Record a owl:Class ;
    rdfs:subClassOf [ a owl:Restriction ;
        owl:onProperty :hasInstantiation ;
        owl:onClass :Instantiation ;
        owl:minQualifiedCardinality \"1\"^^xsd:nonNegativeInteger ] .
:Instantiation a owl:Class .
:hasInstantiation a owl:ObjectProperty ;
    rdfs:domain :Record ;
    rdfs:range :Instantiation .
";

fn ontoshacl_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_ontoshacl"))
}

fn write_ontology(dir: &Path) -> PathBuf {
    let path = dir.join("rico.ttl");
    fs::write(&path, ONTOLOGY).expect("write ttl");
    path
}

fn generate(dir: &Path, extra: &[&str]) -> Output {
    let ontology = write_ontology(dir);
    Command::new(ontoshacl_bin())
        .current_dir(dir)
        .arg("generate")
        .arg(&ontology)
        .args(["--namespace", "https://example.org/rico#"])
        .args(extra)
        .output()
        .expect("run generate")
}

const REQUIRED: [&str; 6] = [
    "--shape-namespace",
    "https://example.org/validator#",
    "--version-iri",
    "https://example.org/validator#0.0.1",
    "--creator",
    "https://example.org/people#someone",
];

#[test]
fn generate_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let mut args = REQUIRED.to_vec();
    args.extend(["--revision", "abc1234", "--date-modified", "2024-06-30"]);
    let out = generate(dir.path(), &args);
    assert!(
        out.status.success(),
        "generate failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("RecordShape"));
    assert!(stdout.contains("InstantiationShape"));
    assert!(stdout.contains("abc1234"));
    assert!(stdout.contains("2024-06-30"));
}

#[test]
fn generate_is_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let mut args = REQUIRED.to_vec();
    args.extend(["--date-modified", "2024-06-30", "--format", "ntriples"]);
    let first = generate(dir.path(), &args);
    let second = generate(dir.path(), &args);
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn generate_with_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("shacl.json");
    let output = dir.path().join("shapes.ttl");

    // first run saves the configuration it used
    let mut args = REQUIRED.to_vec();
    let config_str = config.to_str().unwrap();
    args.extend(["--name", "Records Validator", "--save-config", config_str]);
    let out = generate(dir.path(), &args);
    assert!(out.status.success());
    assert!(config.exists());

    // second run only uses the file, overriding the name
    let output_str = output.to_str().unwrap();
    let out = generate(
        dir.path(),
        &["--config", config_str, "--name", "Other Validator", "--output", output_str],
    );
    assert!(
        out.status.success(),
        "generate failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let shapes = fs::read_to_string(&output).unwrap();
    assert!(shapes.contains("Other Validator"));
    assert!(!shapes.contains("Records Validator"));
}

#[test]
fn generate_validates_config_file_with_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("shacl.json");
    let config_str = config.to_str().unwrap();
    let mut args = REQUIRED.to_vec();
    args.extend(["--date-modified", "2024-06-30", "--save-config", config_str]);
    assert!(generate(dir.path(), &args).status.success());

    let out = generate(
        dir.path(),
        &["--config", config_str, "--date-created", "2024-07-01"],
    );
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("date_created"));

    let out = generate(dir.path(), &["--config", config_str, "--prefix", "a:b"]);
    assert!(!out.status.success());
    assert!(out.stdout.is_empty());

    fs::write(
        &config,
        r#"{
    "shape_namespace": "https://example.org/validator#",
    "version_iri": "https://example.org/validator#0.0.1",
    "creator": "https://example.org/people#someone",
    "date_created": "2024-07-01",
    "date_modified": "2024-06-30"
}"#,
    )
    .unwrap();
    let out = generate(dir.path(), &["--config", config_str]);
    assert!(!out.status.success());
}

#[test]
fn generate_requires_shape_namespace() {
    let dir = tempfile::tempdir().unwrap();
    let out = generate(dir.path(), &[]);
    assert!(!out.status.success());
}

#[test]
fn generate_rejects_unknown_format() {
    let dir = tempfile::tempdir().unwrap();
    let mut args = REQUIRED.to_vec();
    args.extend(["--format", "jsonld"]);
    let out = generate(dir.path(), &args);
    assert!(!out.status.success());
}

#[test]
fn generate_missing_ontology_fails() {
    let dir = tempfile::tempdir().unwrap();
    let out = Command::new(ontoshacl_bin())
        .current_dir(dir.path())
        .args(["generate", "missing.ttl", "--namespace", "https://example.org/rico#"])
        .args(REQUIRED)
        .output()
        .expect("run generate");
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("failed to load ontology"));
}

#[test]
fn list_classes() {
    let dir = tempfile::tempdir().unwrap();
    let ontology = write_ontology(dir.path());
    let out = Command::new(ontoshacl_bin())
        .arg("classes")
        .arg(&ontology)
        .args(["--namespace", "https://example.org/rico#"])
        .output()
        .expect("run classes");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "https://example.org/rico#Instantiation",
            "https://example.org/rico#Record"
        ]
    );
}

#[test]
fn list_restrictions() {
    let dir = tempfile::tempdir().unwrap();
    let ontology = write_ontology(dir.path());
    let out = Command::new(ontoshacl_bin())
        .arg("restrictions")
        .arg(&ontology)
        .args(["--namespace", "https://example.org/rico#"])
        .arg("https://example.org/rico#Record")
        .output()
        .expect("run restrictions");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("hasInstantiation"));
    assert!(stdout.contains("min 1"));
}

#[test]
fn run_from_args_in_process() {
    let dir = tempfile::tempdir().unwrap();
    let ontology = write_ontology(dir.path());
    let output = dir.path().join("shapes.nt");
    let mut args = vec![
        "ontoshacl".to_string(),
        "generate".to_string(),
        ontology.to_str().unwrap().to_string(),
        "--namespace".to_string(),
        "https://example.org/rico#".to_string(),
        "--format".to_string(),
        "nt".to_string(),
        "--output".to_string(),
        output.to_str().unwrap().to_string(),
    ];
    args.extend(REQUIRED.iter().map(|s| s.to_string()));
    ontoshacl_cli::run_from_args(args).unwrap();
    let content = fs::read_to_string(&output).unwrap();
    assert!(content.contains("<https://example.org/validator#RecordShape>"));
}
