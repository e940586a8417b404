//! `DockerCli` against a stand-in `docker` script.
#![cfg(unix)]

use std::collections::BTreeSet;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use confsig_core::{ConfigDescriptor, ConfigId, ConfigKey};
use confsig_reconcile::{
    reconcile, ConfigStore, DockerCli, FilterSet, ReconcileError, ReconcileOptions, RemoveError,
};
use tempfile::TempDir;

const LISTING: &str = r#"{"ID":"old1","Labels":"name=app_web","Name":"app_web_csig_1111"}
{"ID":"busy","Labels":"name=app_web","Name":"app_web_csig_2222"}
{"ID":"old2","Labels":"name=app_worker","Name":"app_worker_csig_3333"}"#;

/// Writes a fake `docker` that logs its arguments and answers `config ls`
/// and `config rm` like the real client.
///
/// `config ls` honours exactly one `--filter label=name=<v>`; more than one
/// is refused, since the daemon would fold them into a single label match.
fn fake_docker(dir: &TempDir, listing: &str) -> (PathBuf, PathBuf) {
    let log = dir.path().join("calls.log");
    let data = dir.path().join("configs.jsonl");
    let script = dir.path().join("docker");
    fs::write(&data, format!("{listing}\n")).expect("write listing");
    let body = format!(
        r#"#!/bin/sh
echo "$@" >> '{log}'
if [ "$1" = "-H" ]; then shift 2; fi
case "$2" in
  ls)
    if [ "$#" -ne 6 ] || [ "$5" != "--filter" ]; then
      echo "fake docker: expected exactly one label filter" >&2; exit 3
    fi
    v="${{6#label=name=}}"
    grep -F -e "\"name=$v\"" -e "\"name=$v," -e ",name=$v\"" -e ",name=$v," '{data}' || true
    ;;
  rm)
    case "$3" in
      busy) echo "Error response from daemon: rpc error: code = InvalidArgument desc = config 'app_web_csig_2222' is in use by the following service: app_web" >&2; exit 1 ;;
      broken) echo "error during connect: connection refused" >&2; exit 1 ;;
    esac
    echo "$3"
    ;;
esac
"#,
        log = log.display(),
        data = data.display(),
    );
    fs::write(&script, body).expect("write fake docker");
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).expect("chmod");
    (script, log)
}

fn calls(log: &Path) -> Vec<String> {
    fs::read_to_string(log)
        .unwrap_or_default()
        .lines()
        .map(str::to_owned)
        .collect()
}

fn descriptor(labels: &[&str]) -> ConfigDescriptor {
    ConfigDescriptor {
        key: ConfigKey::from("web"),
        name: "app_web_csig_WEB".into(),
        template: None,
        file: PathBuf::from("web.conf"),
        labels: labels.iter().map(|l| l.to_string()).collect::<BTreeSet<_>>(),
    }
}

#[test]
fn list_passes_one_filter_per_label() {
    let dir = TempDir::new().expect("tmp");
    let (bin, log) = fake_docker(&dir, LISTING);
    let cli = DockerCli::new(&bin);

    let filters = FilterSet::from_descriptors(&[descriptor(&["app_web", "app_worker"])]);
    let configs = cli.list_configs(&filters).expect("list");
    assert_eq!(configs.len(), 3);
    assert_eq!(configs[1].id, ConfigId::from("busy"));

    let calls = calls(&log);
    assert_eq!(
        calls,
        vec![
            "config ls --format {{json .}} --filter label=name=app_web",
            "config ls --format {{json .}} --filter label=name=app_worker",
        ]
    );
}

#[test]
fn list_returns_configs_matching_only_a_later_label() {
    let dir = TempDir::new().expect("tmp");
    let (bin, _log) = fake_docker(&dir, LISTING);
    let cli = DockerCli::new(&bin);

    let filters = FilterSet::from_descriptors(&[descriptor(&["app_worker", "app_db"])]);
    let configs = cli.list_configs(&filters).expect("list");
    let ids: Vec<_> = configs.iter().map(|c| c.id.0.as_str()).collect();
    assert_eq!(ids, vec!["old2"]);
}

#[test]
fn list_with_no_labels_runs_nothing() {
    let dir = TempDir::new().expect("tmp");
    let (bin, log) = fake_docker(&dir, LISTING);
    let cli = DockerCli::new(&bin);

    let configs = cli.list_configs(&FilterSet::default()).expect("list");
    assert!(configs.is_empty());
    assert!(calls(&log).is_empty());
}

#[test]
fn remove_classifies_in_use_and_other_failures() {
    let dir = TempDir::new().expect("tmp");
    let (bin, _log) = fake_docker(&dir, LISTING);
    let cli = DockerCli::new(&bin);

    cli.remove_config(&ConfigId::from("old1")).expect("plain removal");

    match cli.remove_config(&ConfigId::from("busy")) {
        Err(RemoveError::InUse { id, service }) => {
            assert_eq!(id, ConfigId::from("busy"));
            assert_eq!(service, "app_web");
        }
        other => panic!("expected InUse, got {other:?}"),
    }

    match cli.remove_config(&ConfigId::from("broken")) {
        Err(RemoveError::Other(err)) => assert!(err.to_string().contains("connection refused")),
        other => panic!("expected Other, got {other:?}"),
    }
}

#[test]
fn reconcile_through_docker_skips_busy_config() {
    let dir = TempDir::new().expect("tmp");
    let (bin, log) = fake_docker(&dir, LISTING);
    let cli = DockerCli::new(&bin).with_host("unix:///var/run/docker.sock");

    let report = reconcile(
        &[descriptor(&["app_web", "app_worker"])],
        &cli,
        ReconcileOptions::default(),
    )
    .expect("reconcile");
    assert_eq!(report.removed(), 2);
    assert_eq!(report.in_use(), 1);

    let calls = calls(&log);
    assert_eq!(calls.len(), 5);
    assert!(calls.iter().all(|c| c.starts_with("-H unix:///var/run/docker.sock config")));
    assert!(calls[1].ends_with("--filter label=name=app_worker"));
    assert!(calls[4].ends_with("config rm old2"), "worker-only config is pruned");
}

#[test]
fn reconcile_aborts_on_connection_failure() {
    let dir = TempDir::new().expect("tmp");
    let listing = r#"{"ID":"broken","Labels":"name=app_web","Name":"app_web_csig_9"}
{"ID":"old1","Labels":"name=app_web","Name":"app_web_csig_1"}"#;
    let (bin, log) = fake_docker(&dir, listing);
    let cli = DockerCli::new(&bin);

    let err = reconcile(&[descriptor(&["app_web"])], &cli, ReconcileOptions::default())
        .unwrap_err();
    assert!(matches!(err, ReconcileError::Api { .. }), "got: {err}");
    assert!(
        !calls(&log).iter().any(|c| c.ends_with("rm old1")),
        "objects after the failure are left alone"
    );
}

#[test]
fn missing_binary_is_a_spawn_error() {
    let dir = TempDir::new().expect("tmp");
    let cli = DockerCli::new(dir.path().join("no-such-docker"));
    let err = cli
        .list_configs(&FilterSet::from_descriptors(&[descriptor(&["x"])]))
        .unwrap_err();
    assert!(err.to_string().contains("failed to run"), "got: {err}");
}
