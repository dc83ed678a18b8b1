//! End-to-end packaging through the gofar binary with a fake `go` on PATH

#![cfg(unix)]

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Read;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use zip::ZipArchive;

/// Writes `<bin>:<GOOS>_<GOARCH>` to the `-o` target; fails for `$FAKE_GO_FAIL_ARCH`
const FAKE_GO: &str = r#"#!/bin/sh
case "$1" in
  version)
    echo "go version go1.22.0 fake"
    exit 0
    ;;
  build)
    if [ -n "$FAKE_GO_FAIL_ARCH" ] && [ "$GOARCH" = "$FAKE_GO_FAIL_ARCH" ]; then
      echo "./main.go:1: undefined: main" >&2
      exit 1
    fi
    out="$3"
    printf '%s:%s_%s' "$(basename "$out")" "$GOOS" "$GOARCH" > "$out"
    exit 0
    ;;
esac
echo "unsupported: $*" >&2
exit 2
"#;

struct PackageEnv {
    project: TempDir,
    toolbin: TempDir,
    gopath: TempDir,
    output: TempDir,
    home: TempDir,
}

impl PackageEnv {
    fn new() -> Self {
        let env = Self {
            project: TempDir::new().unwrap(),
            toolbin: TempDir::new().unwrap(),
            gopath: TempDir::new().unwrap(),
            output: TempDir::new().unwrap(),
            home: TempDir::new().unwrap(),
        };

        let go = env.toolbin.path().join("go");
        fs::write(&go, FAKE_GO).unwrap();
        fs::set_permissions(&go, fs::Permissions::from_mode(0o755)).unwrap();

        let root = env.project.path();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join(".git/config"), "[core]\n").unwrap();
        for unit in ["api", "worker"] {
            fs::create_dir_all(root.join("commands").join(unit)).unwrap();
            fs::write(root.join("commands").join(unit).join("main.go"), "package main").unwrap();
        }
        fs::create_dir_all(root.join("conf")).unwrap();
        fs::write(root.join("conf/app.yaml"), "port: 8080\n").unwrap();
        fs::write(root.join("conf/start.sh"), "#!/bin/sh\nexec ./api\n").unwrap();
        env
    }

    fn path_var(&self) -> OsString {
        let mut paths = vec![self.toolbin.path().to_path_buf()];
        if let Some(existing) = std::env::var_os("PATH") {
            paths.extend(std::env::split_paths(&existing));
        }
        std::env::join_paths(paths).unwrap()
    }

    fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("gofar").unwrap();
        cmd.current_dir(self.project.path())
            .env("PATH", self.path_var())
            .env("GOPATH", self.gopath.path())
            .env("HOME", self.home.path())
            .env_remove("GOFAR_BUILD_ROOT")
            .env_remove("GOFAR_CONFIG")
            .env_remove("GOFAR_GO")
            .env_remove("FAKE_GO_FAIL_ARCH");
        cmd
    }

    fn package(&self) -> Command {
        let mut cmd = self.command();
        cmd.args(["--no-color", "package", "billing", "--build-root"])
            .arg(self.output.path())
            .args(["--platform", "linux/amd64", "--platform", "linux/arm64"]);
        cmd
    }

    fn artifact(&self) -> PathBuf {
        self.output.path().join("billing/billing.far")
    }
}

fn entries(archive: &Path) -> Vec<(String, u32, Vec<u8>)> {
    let mut zip = ZipArchive::new(File::open(archive).unwrap()).unwrap();
    (0..zip.len())
        .map(|i| {
            let mut file = zip.by_index(i).unwrap();
            let mut data = Vec::new();
            file.read_to_end(&mut data).unwrap();
            (file.name().to_string(), file.unix_mode().unwrap_or(0), data)
        })
        .collect()
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("gofar")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("package"))
        .stdout(predicate::str::contains("platforms"));
}

#[test]
fn test_package_two_units_two_platforms() {
    let env = PackageEnv::new();

    env.package()
        .assert()
        .success()
        .stdout(predicate::str::contains("billing"))
        .stdout(predicate::str::contains("api, worker"));

    let artifact = env.artifact();
    assert!(artifact.is_file());
    let entries = entries(&artifact);

    for (bin, platform) in [
        ("api", "linux_amd64"),
        ("worker", "linux_amd64"),
        ("api", "linux_arm64"),
        ("worker", "linux_arm64"),
    ] {
        let name = format!("platform/{platform}/{bin}");
        let (_, mode, data) = entries
            .iter()
            .find(|(n, _, _)| *n == name)
            .unwrap_or_else(|| panic!("{name} missing"));
        assert_eq!(mode & 0o777, 0o755);
        assert_eq!(String::from_utf8_lossy(data), format!("{bin}:{platform}"));
    }

    let (_, script_mode, _) = entries.iter().find(|(n, _, _)| n == "start.sh").unwrap();
    assert_eq!(script_mode & 0o111, 0o111);
    assert!(entries.iter().any(|(n, _, _)| n == "app.yaml"));

    let (_, _, manifest) = entries
        .iter()
        .find(|(n, _, _)| n == "deployment.json")
        .unwrap();
    let manifest: serde_json::Value = serde_json::from_slice(manifest).unwrap();
    assert_eq!(manifest["process"], "billing");
    assert_eq!(manifest["process_type"], "GENERAL");
    assert!(manifest["build"]["time"].is_string());
    assert!(manifest["build"]["user"].is_string());
}

#[test]
fn test_package_compile_failure_leaves_no_artifact() {
    let env = PackageEnv::new();

    env.package()
        .env("FAKE_GO_FAIL_ARCH", "arm64")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to prepare binary api"));

    assert!(!env.artifact().exists());
}

#[test]
fn test_package_missing_toolchain() {
    let env = PackageEnv::new();

    env.package()
        .args(["--go", "gofar-no-such-go"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing tool"));
}

#[test]
fn test_package_unknown_project() {
    let env = PackageEnv::new();
    let outside = TempDir::new().unwrap();

    env.package()
        .current_dir(outside.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot find project base directory"));
}

#[test]
fn test_platforms_writes_default_config() {
    let env = PackageEnv::new();
    let config = env.home.path().join("platforms.toml");

    env.command()
        .args(["--no-color", "platforms", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("linux/amd64"))
        .stdout(predicate::str::contains("linux/arm64"));

    let written = fs::read_to_string(&config).unwrap();
    assert!(written.contains("[[platform_list]]"));
}

#[test]
fn test_package_uses_config_file() {
    let env = PackageEnv::new();
    let config = env.home.path().join("platforms.toml");
    fs::write(
        &config,
        "[[platform_list]]\nos = \"linux\"\narch = \"amd64\"\n",
    )
    .unwrap();

    let mut cmd = env.command();
    cmd.args(["--no-color", "package", "billing", "--build-root"])
        .arg(env.output.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    let names: Vec<String> = entries(&env.artifact()).into_iter().map(|e| e.0).collect();
    assert!(names.contains(&"platform/linux_amd64/api".to_string()));
    assert!(!names.iter().any(|n| n.starts_with("platform/linux_arm64")));
}
