use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn confsig_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("confsig"));
    cmd.current_dir(dir).env_remove("RUST_LOG").env_remove("CONFSIG_NAMESPACE");
    cmd
}

fn write_stack(dir: &TempDir) {
    fs::write(dir.path().join("nginx.conf"), "123456789").expect("write nginx.conf");
    fs::write(dir.path().join("app.env"), "hello world").expect("write app.env");
    fs::write(
        dir.path().join("docker-compose.yml"),
        r#"
services:
  web:
    image: nginx
configs:
  nginx:
    file: ./nginx.conf
    name: myapp_nginx_csig_NGINX_CONF
    labels:
      name: myapp_nginx
  env:
    file: ./app.env
    name: myapp_env_csig_${APP_ENV}
  plain:
    file: ./app.env
"#,
    )
    .expect("write compose");
}

#[test]
fn digest_prints_shell_exports_by_default() {
    let dir = TempDir::new().expect("tmp");
    write_stack(&dir);

    confsig_cmd(dir.path())
        .args(["digest", "-n", "myapp"])
        .assert()
        .success()
        .stdout("export APP_ENV=222957957\nexport NGINX_CONF=3421780262\n");
}

#[test]
fn digest_reads_namespace_from_env_and_renders_json() {
    let dir = TempDir::new().expect("tmp");
    write_stack(&dir);

    let output = confsig_cmd(dir.path())
        .env("CONFSIG_NAMESPACE", "myapp")
        .args(["digest", "--format", "json", "-f", "docker-compose.yml"])
        .output()
        .expect("run confsig digest");
    assert!(
        output.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(parsed["NGINX_CONF"], "3421780262");
    assert_eq!(parsed["APP_ENV"], "222957957");
}

#[test]
fn digest_output_file_gets_dotenv_and_summary() {
    let dir = TempDir::new().expect("tmp");
    write_stack(&dir);
    let out = dir.path().join("deploy").join("digests.env");

    confsig_cmd(dir.path())
        .args(["digest", "-n", "myapp", "--format", "dotenv", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout(contains("wrote 2 binding(s)").and(contains("NGINX_CONF")));

    let written = fs::read_to_string(&out).expect("read output");
    assert_eq!(written, "APP_ENV=222957957\nNGINX_CONF=3421780262\n");
}

#[test]
fn digest_truncates_to_fit_name_limit() {
    let dir = TempDir::new().expect("tmp");
    fs::write(dir.path().join("a.conf"), "123456789").expect("write");
    let prefix = format!("myapp_{}csig", "x".repeat(50));
    fs::write(
        dir.path().join("docker-compose.yml"),
        format!("configs:\n  a:\n    file: a.conf\n    name: {prefix}_CFG_HASH\n"),
    )
    .expect("write compose");

    confsig_cmd(dir.path())
        .args(["digest", "-n", "myapp", "--format", "dotenv"])
        .assert()
        .success()
        .stdout("CFG_HASH=3421\n");
}

#[test]
fn digest_fails_when_prefix_exceeds_limit() {
    let dir = TempDir::new().expect("tmp");
    fs::write(dir.path().join("a.conf"), "x").expect("write");
    fs::write(
        dir.path().join("docker-compose.yml"),
        format!(
            "configs:\n  a:\n    file: a.conf\n    name: {}_csig_CFG_HASH\n",
            "p".repeat(70)
        ),
    )
    .expect("write compose");

    confsig_cmd(dir.path())
        .args(["digest", "-n", "myapp"])
        .assert()
        .failure()
        .stderr(contains("name limit"));
}

#[test]
fn digest_fails_on_missing_manifest() {
    let dir = TempDir::new().expect("tmp");

    confsig_cmd(dir.path())
        .args(["digest", "-n", "myapp"])
        .assert()
        .failure()
        .stderr(contains("docker-compose.yml"));
}

#[test]
fn digest_rejects_variable_that_is_not_a_shell_name() {
    let dir = TempDir::new().expect("tmp");
    fs::write(dir.path().join("a.conf"), "x").expect("write");
    fs::write(
        dir.path().join("docker-compose.yml"),
        "configs:\n  a:\n    file: a.conf\n    name: 'app_csig_X;touch /tmp/confsig-pwn;Y'\n",
    )
    .expect("write compose");

    confsig_cmd(dir.path())
        .args(["digest", "-n", "myapp"])
        .assert()
        .failure()
        .stdout(contains(";touch").not())
        .stderr(contains("invalid digest variable"));
}
