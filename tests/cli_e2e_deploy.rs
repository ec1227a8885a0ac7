//! End-to-end tests for the `deploy` command against a real local git
//! repository.
//!
//! These tests need a `git` binary on `PATH` and run only with the
//! `integration-tests` feature:
//!
//! ```bash
//! cargo test --test cli_e2e_deploy --features integration-tests
//! ```

mod common;
use common::prelude::*;

use std::fs;

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_deploy_checks_out_and_activates() {
    let source = GitSource::new();
    let fixture = TestFixture::new().with_config(&format!(
        "repository: {}\nbranch: main\n",
        source.url()
    ));

    fixture
        .command()
        .arg("deploy")
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK] Release"))
        .stdout(predicate::str::contains("is live"));

    let current = fixture.deploy_path().join("current");
    assert_eq!(
        fs::read_to_string(current.join("index.php")).unwrap(),
        "<?php echo 'v1';"
    );
    assert!(current.join(".git").is_dir());
    assert!(fixture.read_link("release").is_none());
    assert!(fixture.deploy_path().join("shared").is_dir());
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_redeploy_picks_up_new_commit_and_prunes() {
    let source = GitSource::new();
    let fixture = TestFixture::new().with_config(&format!(
        "repository: {}\nbranch: main\nkeep_releases: 1\n",
        source.url()
    ));

    fixture.command().arg("deploy").assert().success();
    let first = fixture.releases_on_disk();
    assert_eq!(first.len(), 1);

    source.commit("index.php", "<?php echo 'v2';", "second");
    fixture
        .command()
        .arg("deploy")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 old release(s)"));

    let after = fixture.releases_on_disk();
    assert_eq!(after.len(), 1);
    assert_ne!(after, first);
    assert_eq!(
        fs::read_to_string(fixture.deploy_path().join("current/index.php")).unwrap(),
        "<?php echo 'v2';"
    );
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_deploy_tag_wins_over_branch() {
    let source = GitSource::new();
    source.commit("index.php", "<?php echo 'v2';", "second");
    let fixture = TestFixture::new().with_config(&format!(
        "repository: {}\nbranch: main\n",
        source.url()
    ));

    fixture
        .command()
        .args(["deploy", "--tag", "v1.0.0"])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(fixture.deploy_path().join("current/index.php")).unwrap(),
        "<?php echo 'v1';"
    );
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_deploy_without_git_cache_is_shallow() {
    let source = GitSource::new();
    source.commit("index.php", "<?php echo 'v2';", "second");
    let fixture = TestFixture::new().with_config(&format!(
        "repository: {}\nbranch: main\ngit_cache: false\n",
        source.url()
    ));

    fixture
        .command()
        .arg("deploy")
        .assert()
        .success()
        .stdout(predicate::str::contains("shallow clone"));

    assert!(fixture
        .deploy_path()
        .join("current/.git/shallow")
        .exists());
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_second_deploy_uses_previous_release_as_cache() {
    let source = GitSource::new();
    let fixture = TestFixture::new().with_config(&format!(
        "repository: {}\nbranch: main\ngit_cache: true\n",
        source.url()
    ));

    fixture.command().arg("deploy").assert().success();
    fixture
        .command()
        .arg("deploy")
        .assert()
        .success()
        .stdout(predicate::str::contains("(reference clone)"));

    // Dissociated: the new release does not depend on the old one's objects
    let current = fixture.deploy_path().join("current");
    assert!(!current.join(".git/objects/info/alternates").exists());
    assert_eq!(fixture.releases_on_disk().len(), 2);
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_broken_cache_falls_back_to_full_clone() {
    let source = GitSource::new();
    let fixture = TestFixture::new().with_config(&format!(
        "repository: {}\nbranch: main\ngit_cache: true\n",
        source.url()
    ));
    fixture.command().arg("deploy").assert().success();
    let previous = fixture.releases_on_disk().remove(0);
    fs::remove_dir_all(fixture.release_dir(&previous).join(".git")).unwrap();

    fixture
        .command()
        .arg("deploy")
        .assert()
        .success()
        .stdout(predicate::str::contains("full clone after failed reference clone"));

    assert!(fixture.deploy_path().join("current/index.php").exists());
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_failed_clone_keeps_current() {
    let source = GitSource::new();
    let fixture = TestFixture::new().with_config(&format!(
        "repository: {}\nbranch: main\n",
        source.url()
    ));
    fixture.command().arg("deploy").assert().success();
    let live = fixture.read_link("current").unwrap();

    fixture
        .command()
        .args(["deploy", "--branch", "does-not-exist"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[ERR] Deploy failed"))
        .stderr(predicate::str::contains("Git clone error"));

    assert_eq!(fixture.read_link("current").unwrap(), live);
    assert!(fixture.read_link("release").is_some());
}
