//! Migration of a legacy Seed project to SeedStack coordinates and packages.

use seed_fix::config::load_from_path;
use seed_fix::engine::{Concurrency, Engine, Registry, RunOptions};
use seed_fix::walk::discover_files;
use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;
use tempfile::TempDir;

const TDF: &str = r##"exclude = "target|.git|.idea"

[[transformations]]
filter = "pom.xml"
pre = ["AlwaysTrue"]

  [[transformations.proc]]
  name = "ReplaceMavenDependencyWithVersion"
  params = [
    "com.inetpsa.fnd:seed-bom:14.11", "org.seedstack:seedstack-bom:15.4-M2-SNAPSHOT",
  ]

  [[transformations.proc]]
  name = "ReplaceMavenDependency"
  params = [
    "com.inetpsa.fnd.seed:seed-core-support-core", "org.seedstack.seed:seed-core",
    "com.inetpsa.fnd.seed:seed-unittest-support", "org.seedstack.seed:seed-testing",
  ]

  [[transformations.proc]]
  name = "replace-dependency"
  params = ["com.inetpsa.fnd.seed:seed-web-support-core:*", "org.seedstack.seed:seed-web"]

[[transformations]]
filter = "*.java"

  [[transformations.proc]]
  name = "Replace"
  params = [
    "com.inetpsa.seed.core", "org.seedstack.seed.core",
    "org.seedstack.seed.core.api.Logging", "org.seedstack.seed.Logging",
  ]

[[transformations]]
filter = "*.props|*.properties"
pre = ["has-seed-keys"]

  [[transformations.proc]]
  name = "replace"
  params = ["com.inetpsa.", "org.seedstack."]

[[transformations]]
filter = "*.props"

  [[transformations.proc]]
  name = "insert"
  params = "# migrated\n"
"##;

const PARENT_POM: &str = r#"<project>
    <properties>
        <seed-bom.version>14.11</seed-bom.version>
    </properties>
    <dependencyManagement>
        <dependencies>
            <dependency>
                <groupId>com.inetpsa.fnd</groupId>
                <artifactId>seed-bom</artifactId>
                <version>${seed-bom.version}</version>
                <type>pom</type>
                <scope>import</scope>
            </dependency>
        </dependencies>
    </dependencyManagement>
</project>
"#;

const MODULE_POM: &str = r#"<project>
    <dependencies>
        <dependency>
            <groupId>com.inetpsa.fnd.seed</groupId>
            <artifactId>seed-core-support-core</artifactId>
        </dependency>
        <dependency>
            <groupId>com.inetpsa.fnd.seed</groupId>
            <artifactId>seed-web-support-core</artifactId>
            <version>2.1.0</version>
        </dependency>
        <dependency>
            <groupId>com.inetpsa.fnd.seed</groupId>
            <artifactId>seed-unittest-support</artifactId>
            <scope>test</scope>
        </dependency>
    </dependencies>
</project>
"#;

const SERVICE: &str = "package com.example;\n\nimport com.inetpsa.seed.core.api.Install;\nimport org.seedstack.seed.core.api.Logging;\n\n@Install\npublic class Service {}\n";

fn write(root: &Path, name: &str, content: &str) {
    let path = root.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn read(root: &Path, name: &str) -> String {
    fs::read_to_string(root.join(name)).unwrap()
}

fn setup_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "tdf.toml", TDF);
    write(root, "pom.xml", PARENT_POM);
    write(root, "app/pom.xml", MODULE_POM);
    write(root, "app/src/main/java/com/example/Service.java", SERVICE);
    write(root, "app/src/main/resources/META-INF/configuration/app.props", "[com.inetpsa.fnd.seed]\nkey = value\n");
    write(root, "app/src/main/resources/other.props", "plain = true\n");
    write(root, "app/target/classes/Service.java", SERVICE);
    write(root, ".idea/workspace.xml", "<project/>");
    dir
}

fn migrate(root: &Path, concurrency: Concurrency) -> (usize, usize) {
    let tdf = root.join("tdf.toml");
    let rules = load_from_path(&tdf).unwrap();

    let mut registry = Registry::builtin();
    registry.register_precondition("has-seed-keys", |_: &Path, content: &[u8]| {
        content.windows(b"com.inetpsa".len()).any(|w| w == b"com.inetpsa")
    });
    let engine = Engine::compile(&rules, &registry).unwrap();

    let files = discover_files(root, &rules.exclude, Some(&tdf)).unwrap();
    let options = RunOptions {
        concurrency,
        dry_run: false,
    };
    let summary = engine.run(&files, &options).unwrap();
    assert_eq!(summary.failed(), 0);
    (summary.modified, files.len())
}

#[test]
fn full_migration() {
    let project = setup_project();
    let root = project.path();

    let (modified, total) = migrate(root, Concurrency::Unbounded);
    assert_eq!(total, 5);
    assert_eq!(modified, 5);

    let parent = read(root, "pom.xml");
    assert!(parent.contains("<seed-bom.version>15.4-M2-SNAPSHOT</seed-bom.version>"));
    assert!(parent.contains("<version>${seed-bom.version}</version>"));
    assert!(parent.contains("<groupId>org.seedstack</groupId>"));
    assert!(parent.contains("<artifactId>seedstack-bom</artifactId>"));

    let module = read(root, "app/pom.xml");
    assert!(module.contains("<artifactId>seed-core</artifactId>"));
    assert!(module.contains("<artifactId>seed-web</artifactId>"));
    assert!(module.contains("<artifactId>seed-testing</artifactId>"));
    assert!(!module.contains("<version>2.1.0</version>"));
    assert!(!module.contains("com.inetpsa"));
    assert!(module.contains("<scope>test</scope>"));

    assert_eq!(
        read(root, "app/src/main/java/com/example/Service.java"),
        "package com.example;\n\nimport org.seedstack.seed.core.api.Install;\nimport org.seedstack.seed.Logging;\n\n@Install\npublic class Service {}\n"
    );
    assert_eq!(
        read(root, "app/src/main/resources/META-INF/configuration/app.props"),
        "[org.seedstack.fnd.seed]\nkey = value\n# migrated\n"
    );
    assert_eq!(
        read(root, "app/src/main/resources/other.props"),
        "plain = true\n# migrated\n"
    );

    assert_eq!(read(root, "app/target/classes/Service.java"), SERVICE);
    assert_eq!(read(root, "tdf.toml"), TDF);
}

#[test]
fn second_run_is_idempotent_for_dependencies() {
    let project = setup_project();
    let root = project.path();
    migrate(
        root,
        Concurrency::Bounded(NonZeroUsize::new(2).unwrap()),
    );
    let parent = read(root, "pom.xml");
    let module = read(root, "app/pom.xml");
    let service = read(root, "app/src/main/java/com/example/Service.java");

    // Only the unconditional insert fires again.
    let (modified, _) = migrate(root, Concurrency::Unbounded);
    assert_eq!(modified, 2);
    assert_eq!(read(root, "pom.xml"), parent);
    assert_eq!(read(root, "app/pom.xml"), module);
    assert_eq!(read(root, "app/src/main/java/com/example/Service.java"), service);
}
