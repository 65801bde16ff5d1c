//! Unit tests for manifest deserialization.

use super::*;
use rstest::rstest;
use serde_json::json;

fn parse(json: &str) -> Result<Manifest> {
    parse_manifest(json, Utf8Path::new("package.json"))
}

#[test]
fn parses_full_package_json() {
    let manifest = parse(
        r#"{
            "name": "@cubejs-backend/native",
            "version": "1.0.0",
            "dependencies": {"foo": "^1"},
            "resources": {
                "vars": {
                    "libpython_or_fallback": {
                        "default": "fallback",
                        "value": ["libpython", ["3.12", "3.11"]],
                        "constraints": {"platform-arch": ["linux-x64"]}
                    },
                    "target": {"value": "libc", "default": "unknown"}
                },
                "files": [
                    {
                        "host": "https://github.com/cube-js/cube/releases/download/v${version}/",
                        "path": "native-${platform}-${arch}-${libc}.tar.gz",
                        "constraints": {"platform": ["linux", "darwin"]}
                    }
                ]
            }
        }"#,
    )
    .expect("valid manifest");

    assert_eq!(manifest.version, "1.0.0");
    let resources = manifest.resources().expect("resources present");
    let names: Vec<&str> = resources.vars.iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["libpython_or_fallback", "target"]);
    assert_eq!(resources.files.len(), 1);
    assert_eq!(resources.files[0].name, None);
}

#[test]
fn variable_order_follows_declaration_order() {
    let manifest = parse(
        r#"{"version":"1","resources":{"vars":{
            "zeta": {"default": "z"},
            "alpha": {"default": "a"},
            "mid": {"default": "m"}
        }}}"#,
    )
    .expect("valid manifest");
    let resources = manifest.resources().expect("resources present");
    let names: Vec<&str> = resources.vars.iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["zeta", "alpha", "mid"]);
}

#[test]
fn constraints_keep_order_and_unknown_names() {
    let manifest = parse(
        r#"{"version":"1","resources":{"files":[{
            "host": "https://x/",
            "constraints": {
                "libc": ["musl"],
                "arch": ["x64"],
                "platform": ["linux"]
            }
        }]}}"#,
    )
    .expect("valid manifest");
    let file = &manifest.resources().expect("resources present").files[0];
    let constraints: Vec<Constraint> = file
        .constraints
        .as_ref()
        .expect("constraints present")
        .iter()
        .cloned()
        .collect();
    assert_eq!(
        constraints,
        vec![
            Constraint::Unknown {
                name: "libc".to_owned(),
            },
            Constraint::Arch(vec!["x64".to_owned()]),
            Constraint::Platform(vec!["linux".to_owned()]),
        ]
    );
    let names: Vec<&str> = constraints.iter().map(Constraint::name).collect();
    assert_eq!(names, ["libc", "arch", "platform"]);
}

#[test]
fn missing_resources_is_reported_on_access() {
    let manifest = parse(r#"{"name":"pkg","version":"1.0.0"}"#).expect("valid manifest");
    assert!(matches!(
        manifest.resources(),
        Err(InstallerError::MissingResourcesSection)
    ));
}

#[test]
fn resources_without_files_or_vars_is_empty() {
    let manifest = parse(r#"{"version":"1.0.0","resources":{}}"#).expect("valid manifest");
    let resources = manifest.resources().expect("resources present");
    assert!(resources.vars.is_empty());
    assert!(resources.files.is_empty());
}

#[rstest]
#[case::not_json("not json")]
#[case::files_not_a_list(r#"{"version":"1","resources":{"files":{}}}"#)]
#[case::platform_not_a_list(r#"{"version":"1","resources":{"files":[{"host":"h","constraints":{"platform":"linux"}}]}}"#)]
#[case::file_without_host(r#"{"version":"1","resources":{"files":[{"path":"p"}]}}"#)]
#[case::missing_version(r#"{"name":"pkg","resources":{"files":[]}}"#)]
fn rejects_malformed_manifests(#[case] json: &str) {
    let err = parse(json).expect_err("manifest should be rejected");
    assert!(
        matches!(err, InstallerError::ManifestParse { .. }),
        "got {err:?}"
    );
}

#[rstest]
#[case::libc(json!("libc"), VariableValue::LibcProbe)]
#[case::libpython(
    json!(["libpython", ["3.9", 3.8]]),
    VariableValue::LibpythonProbe { versions: vec!["3.9".to_owned(), "3.8".to_owned()] }
)]
#[case::unknown_string(json!("glibc"), VariableValue::Unknown { raw: "glibc".to_owned() })]
#[case::unknown_pair(
    json!(["libssl", ["3"]]),
    VariableValue::Unknown { raw: r#"["libssl",["3"]]"#.to_owned() }
)]
#[case::wrong_arity(
    json!(["libpython"]),
    VariableValue::Unknown { raw: r#"["libpython"]"#.to_owned() }
)]
fn value_directives_map_to_variants(#[case] raw: Value, #[case] expected: VariableValue) {
    assert_eq!(VariableValue::from(raw), expected);
}

#[rstest]
#[case::null("null")]
#[case::false_flag("false")]
#[case::zero("0")]
#[case::empty_string(r#""""#)]
fn falsy_value_is_treated_as_absent(#[case] raw: &str) {
    let json =
        format!(r#"{{"version":"1","resources":{{"vars":{{"v":{{"value":{raw},"default":"d"}}}}}}}}"#);
    let manifest = parse(&json).expect("valid manifest");
    let resources = manifest.resources().expect("resources present");
    let (_, spec) = resources.vars.iter().next().expect("one variable");
    assert_eq!(spec.value, None);
    assert_eq!(spec.default.as_deref(), Some("d"));
}

#[test]
fn load_manifest_reports_missing_file() {
    let temp = tempfile::tempdir().expect("temp dir");
    let path = camino::Utf8PathBuf::try_from(temp.path().join("package.json")).expect("UTF-8 path");
    let err = load_manifest(&path).expect_err("missing file should fail");
    assert!(matches!(err, InstallerError::ManifestRead { .. }));
}

#[test]
fn load_manifest_reads_file_from_disk() {
    let temp = tempfile::tempdir().expect("temp dir");
    let path = camino::Utf8PathBuf::try_from(temp.path().join("package.json")).expect("UTF-8 path");
    std::fs::write(&path, r#"{"version":"2.3.4","resources":{"files":[]}}"#)
        .expect("write manifest");
    let manifest = load_manifest(&path).expect("manifest loads");
    assert_eq!(manifest.version, "2.3.4");
}
