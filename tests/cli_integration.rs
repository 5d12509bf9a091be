//! Integration tests for the `seed` command-line interface

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const TDF: &str = r#"exclude: "target"
transformations:
  - filter: "pom.xml"
    pre:
      - AlwaysTrue
    proc:
      - name: ReplaceMavenDependency
        params:
          - "com.inetpsa.fnd:seed-bom"
          - "org.seedstack:seedstack-bom"
  - filter: "*.java"
    proc:
      - name: Replace
        params: ["com.inetpsa.seed", "org.seedstack.seed"]
"#;

const POM: &str = "<dependency>\n    <groupId>com.inetpsa.fnd</groupId>\n    <artifactId>seed-bom</artifactId>\n</dependency>\n";

/// Helper to create a project tree with a transformation file
fn setup_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    fs::write(root.join("tdf.yml"), TDF).unwrap();
    fs::write(root.join("pom.xml"), POM).unwrap();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(
        root.join("src/App.java"),
        "import com.inetpsa.seed.Application;\n",
    )
    .unwrap();
    fs::write(root.join("src/Other.java"), "class Other {}\n").unwrap();
    fs::create_dir_all(root.join("target")).unwrap();
    fs::write(
        root.join("target/Gen.java"),
        "import com.inetpsa.seed.Application;\n",
    )
    .unwrap();

    dir
}

fn seed(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_seed"))
        .current_dir(dir)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run seed")
}

#[test]
fn help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    let output = seed(dir.path(), &["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("fix"));
    assert!(stdout.contains("convert"));
}

#[test]
fn fix_rewrites_matching_files() {
    let project = setup_project();
    let root = project.path();

    let output = seed(root, &["fix"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("fixed"));
    assert!(stdout.contains("/3 files"), "{stdout}");

    let pom = fs::read_to_string(root.join("pom.xml")).unwrap();
    assert!(pom.contains("<groupId>org.seedstack</groupId>"));
    assert!(pom.contains("<artifactId>seedstack-bom</artifactId>"));
    assert_eq!(
        fs::read_to_string(root.join("src/App.java")).unwrap(),
        "import org.seedstack.seed.Application;\n"
    );
    assert_eq!(
        fs::read_to_string(root.join("target/Gen.java")).unwrap(),
        "import com.inetpsa.seed.Application;\n"
    );
    assert_eq!(fs::read_to_string(root.join("tdf.yml")).unwrap(), TDF);
}

#[test]
fn dry_run_with_diff_writes_nothing() {
    let project = setup_project();
    let root = project.path();

    let output = seed(root, &["fix", ".", "--dry-run", "--diff", "--jobs", "2"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("DRY RUN"));
    assert!(stdout.contains("pom.xml (original)"));
    assert!(stdout.contains("org.seedstack.seed.Application"));
    assert_eq!(fs::read_to_string(root.join("pom.xml")).unwrap(), POM);
}

#[test]
fn explicit_tdf_and_directory() {
    let project = setup_project();
    let root = project.path();
    fs::rename(root.join("tdf.yml"), root.join("rules.yaml")).unwrap();

    let output = seed(root, &["fix", "src", "-t", "rules.yaml"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("src fixed"), "{stdout}");
    assert_eq!(fs::read_to_string(root.join("pom.xml")).unwrap(), POM);
}

#[test]
fn unknown_procedure_aborts_without_changes() {
    let project = setup_project();
    let root = project.path();
    fs::write(
        root.join("tdf.yml"),
        "transformations:\n  - filter: \"*.java\"\n    proc:\n      - name: DoNothing\n",
    )
    .unwrap();

    let output = seed(root, &["fix"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("DoNothing"), "{stderr}");
    assert_eq!(
        fs::read_to_string(root.join("src/App.java")).unwrap(),
        "import com.inetpsa.seed.Application;\n"
    );
}

#[test]
fn per_file_failure_sets_exit_code() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::write(
        root.join("tdf.yml"),
        "transformations:\n  - filter: \"*.txt\"\n    proc:\n      - name: remove-at-end\n        params: \"12345\"\n",
    )
    .unwrap();
    fs::write(root.join("long.txt"), "abcdefgh").unwrap();
    fs::write(root.join("short.txt"), "ab").unwrap();

    let output = seed(root, &["fix"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(fs::read_to_string(root.join("long.txt")).unwrap(), "abc");
    assert_eq!(fs::read_to_string(root.join("short.txt")).unwrap(), "ab");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("could not be processed"), "{stderr}");
}

#[test]
fn convert_writes_toml_next_to_yaml() {
    let project = setup_project();
    let root = project.path();

    let output = seed(root, &["convert", "tdf.yml"]);
    assert!(output.status.success());
    let toml = fs::read_to_string(root.join("tdf.toml")).unwrap();
    assert!(toml.contains("[[transformations]]"));
    assert!(toml.contains("[[transformations.proc]]"));
    assert!(toml.contains("ReplaceMavenDependency"));
}
