use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn pakt(config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pakt").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home).env_remove("RUST_LOG");
    cmd
}

fn store_path(config_home: &Path) -> PathBuf {
    config_home.join("pakt").join("package.json")
}

fn write_store(config_home: &Path, json: &str) {
    let path = store_path(config_home);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, json).unwrap();
}

fn read_store(config_home: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(store_path(config_home)).unwrap()).unwrap()
}

#[test]
fn sync_replays_tracked_packages() {
    let home = TempDir::new().unwrap();
    write_store(home.path(), r#"{"package_managers": {"dnf": ["vim", "git"]}}"#);
    pakt(home.path())
        .args(["--dry-run", "sync"])
        .assert()
        .success()
        .stdout("sudo dnf install vim git\n");
}

#[test]
fn sync_orders_system_managers_first() {
    let home = TempDir::new().unwrap();
    write_store(home.path(), r#"{"package_managers": {"flatpak": ["org.gimp.GIMP"], "apt": ["curl", "jq"]}}"#);
    pakt(home.path())
        .args(["sync", "--dry-run"])
        .assert()
        .success()
        .stdout("sudo apt install curl jq\nflatpak install org.gimp.GIMP\n");
}

#[test]
fn sync_without_store_is_a_noop() {
    let home = TempDir::new().unwrap();
    pakt(home.path())
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to sync"));
}

#[test]
fn corrupt_store_is_fatal() {
    let home = TempDir::new().unwrap();
    write_store(home.path(), "{\"package_managers\": ");
    pakt(home.path())
        .args(["--dry-run", "sync"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed tracking store"));
}

#[test]
fn nix_install_glues_the_attribute() {
    let home = TempDir::new().unwrap();
    pakt(home.path())
        .args(["--nix", "--dry-run", "install", "ripgrep"])
        .assert()
        .success()
        .stdout("nix-env -iA nixpkgs.ripgrep\n");
    assert!(!store_path(home.path()).exists());
}

#[test]
fn flatpak_flag_beats_nix() {
    let home = TempDir::new().unwrap();
    pakt(home.path())
        .args(["-f", "-n", "--dry-run", "update"])
        .assert()
        .success()
        .stdout("flatpak update\n");
}

#[test]
fn escalation_comes_from_config() {
    let home = TempDir::new().unwrap();
    write_store(home.path(), r#"{"package_managers": {"pacman": ["htop"]}}"#);
    fs::write(home.path().join("pakt").join("config.toml"), "escalation = \"doas\"\n").unwrap();
    pakt(home.path())
        .args(["--dry-run", "sync"])
        .assert()
        .success()
        .stdout("doas pacman -S htop\n");
}

#[test]
fn default_manager_from_config_skips_detection() {
    let home = TempDir::new().unwrap();
    fs::create_dir_all(home.path().join("pakt")).unwrap();
    fs::write(home.path().join("pakt").join("config.toml"), "default_manager = \"apt\"\n").unwrap();
    pakt(home.path())
        .args(["--dry-run", "-a", "update"])
        .assert()
        .success()
        .stdout("sudo apt update && sudo apt upgrade && flatpak update\n");
}

#[test]
fn unsupported_default_manager_is_rejected() {
    let home = TempDir::new().unwrap();
    fs::create_dir_all(home.path().join("pakt")).unwrap();
    fs::write(home.path().join("pakt").join("config.toml"), "default_manager = \"zypper\"\n").unwrap();
    pakt(home.path())
        .args(["--dry-run", "-a", "install", "vim"])
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("default_manager 'zypper' is not a supported package manager"));
}

#[test]
fn update_all_runs_flatpak_once_when_it_is_the_default() {
    let home = TempDir::new().unwrap();
    fs::create_dir_all(home.path().join("pakt")).unwrap();
    fs::write(home.path().join("pakt").join("config.toml"), "default_manager = \"flatpak\"\n").unwrap();
    pakt(home.path())
        .args(["--dry-run", "-a", "update"])
        .assert()
        .success()
        .stdout("flatpak update\n");
}

#[test]
fn repeated_packages_in_store_are_synced_once() {
    let home = TempDir::new().unwrap();
    write_store(home.path(), r#"{"package_managers": {"dnf": ["vim", "vim", "git"]}}"#);
    pakt(home.path())
        .args(["--dry-run", "sync"])
        .assert()
        .success()
        .stdout("sudo dnf install vim git\n");
}

#[test]
fn list_shows_tracked_packages() {
    let home = TempDir::new().unwrap();
    write_store(home.path(), r#"{"package_managers": {"flatpak": ["org.gimp.GIMP"], "dnf": ["vim", "git"]}}"#);
    pakt(home.path())
        .arg("list")
        .assert()
        .success()
        .stdout("MANAGER\tPACKAGES\ndnf\tvim git\nflatpak\torg.gimp.GIMP\n");
}

#[test]
fn missing_config_location_is_fatal() {
    let mut cmd = Command::cargo_bin("pakt").unwrap();
    cmd.env_remove("XDG_CONFIG_HOME")
        .env_remove("HOME")
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration error"));
}

#[cfg(unix)]
mod with_fake_flatpak {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// Puts a `flatpak` script on PATH that exits with `code`.
    fn fake_flatpak(dir: &Path, code: i32) -> String {
        let bin = dir.join("bin");
        fs::create_dir_all(&bin).unwrap();
        let script = bin.join("flatpak");
        fs::write(&script, format!("#!/bin/sh\nexit {code}\n")).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        let path = std::env::var("PATH").unwrap_or_default();
        format!("{}:{}", bin.display(), path)
    }

    #[test]
    fn install_then_remove_updates_tracking() {
        let home = TempDir::new().unwrap();
        let path = fake_flatpak(home.path(), 0);

        pakt(home.path()).env("PATH", &path).args(["-f", "install", "org.gimp.GIMP"]).assert().success();
        pakt(home.path()).env("PATH", &path).args(["-f", "install", "org.gimp.GIMP"]).assert().success();
        pakt(home.path()).env("PATH", &path).args(["-f", "install", "com.spotify.Client"]).assert().success();
        assert_eq!(
            read_store(home.path()),
            serde_json::json!({"package_managers": {"flatpak": ["org.gimp.GIMP", "com.spotify.Client"]}})
        );

        pakt(home.path()).env("PATH", &path).args(["-f", "remove", "org.gimp.GIMP"]).assert().success();
        assert_eq!(
            read_store(home.path()),
            serde_json::json!({"package_managers": {"flatpak": ["com.spotify.Client"]}})
        );
    }

    #[test]
    fn failed_install_is_not_tracked() {
        let home = TempDir::new().unwrap();
        let path = fake_flatpak(home.path(), 3);
        pakt(home.path())
            .env("PATH", &path)
            .args(["-f", "install", "org.gimp.GIMP"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("exit code 3"));
        assert!(!store_path(home.path()).exists());
    }

    #[test]
    fn update_never_touches_the_store() {
        let home = TempDir::new().unwrap();
        let path = fake_flatpak(home.path(), 0);
        pakt(home.path()).env("PATH", &path).args(["-f", "update", "org.gimp.GIMP"]).assert().success();
        assert!(!store_path(home.path()).exists());
    }

    #[test]
    fn broken_store_only_warns_after_install() {
        let home = TempDir::new().unwrap();
        let path = fake_flatpak(home.path(), 0);
        write_store(home.path(), "not json");
        pakt(home.path())
            .env("PATH", &path)
            .args(["-f", "install", "org.gimp.GIMP"])
            .assert()
            .success()
            .stderr(predicate::str::contains("tracking store was not updated"));
        assert_eq!(fs::read_to_string(store_path(home.path())).unwrap(), "not json");
    }

    #[test]
    fn sync_keeps_going_after_a_failure() {
        let home = TempDir::new().unwrap();
        let path = fake_flatpak(home.path(), 1);
        write_store(home.path(), r#"{"package_managers": {"flatpak": ["org.gimp.GIMP"]}}"#);
        pakt(home.path())
            .env("PATH", &path)
            .arg("sync")
            .assert()
            .failure()
            .stderr(predicate::str::contains("sync failed for: flatpak ("))
            .stderr(predicate::str::contains("exit code 1"));
    }

    #[test]
    fn remove_drops_a_package_listed_twice() {
        let home = TempDir::new().unwrap();
        let path = fake_flatpak(home.path(), 0);
        write_store(home.path(), r#"{"package_managers": {"flatpak": ["org.gimp.GIMP", "org.gimp.GIMP", "com.spotify.Client"]}}"#);
        pakt(home.path()).env("PATH", &path).args(["-f", "remove", "org.gimp.GIMP"]).assert().success();
        assert_eq!(
            read_store(home.path()),
            serde_json::json!({"package_managers": {"flatpak": ["com.spotify.Client"]}})
        );
    }
}
