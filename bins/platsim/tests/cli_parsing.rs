//! Command-line and script tests for platsim.
//!
//! Scripts are fed on stdin; everything runs against the in-memory backend.

use assert_cmd::Command;
use predicates::prelude::*;

fn platsim_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_platsim"))
}

const BRIDGE_SCRIPT: &str = "\
# bridge with one port
link add bridge br0
link add ethernet eth0 --up
link set eth0 --master br0
link set br0 --up
addr add 192.168.1.1/24 --dev br0
route add 192.168.1.0/24 --dev br0
route add default --via 192.168.1.254 --dev br0
";

mod global_flags {
    use super::*;

    #[test]
    fn test_help() {
        platsim_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Replay platform operations against the in-memory backend",
            ));
    }

    #[test]
    fn test_version() {
        platsim_cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("platsim"));
    }

    #[test]
    fn test_missing_script_file() {
        platsim_cmd()
            .arg("/nonexistent/script.txt")
            .assert()
            .failure()
            .stderr(predicate::str::contains("cannot read"));
    }
}

mod script {
    use super::*;

    #[test]
    fn test_empty_script_shows_loopback() {
        platsim_cmd()
            .write_stdin("")
            .assert()
            .success()
            .stdout(predicate::str::contains("lo"));
    }

    #[test]
    fn test_bridge_script() {
        platsim_cmd()
            .write_stdin(BRIDGE_SCRIPT)
            .assert()
            .success()
            .stdout(predicate::str::contains("br0"))
            .stdout(predicate::str::contains("192.168.1.254"))
            .stdout(predicate::str::contains("fe80::fa:ce:b0:"));
    }

    #[test]
    fn test_unreachable_gateway_fails() {
        platsim_cmd()
            .write_stdin("link add ethernet eth0 --up\nroute add default --via 10.9.9.9 --dev eth0\n")
            .assert()
            .failure()
            .stderr(predicate::str::contains("line 2"))
            .stderr(predicate::str::contains("unreachable"));
    }

    #[test]
    fn test_keep_going() {
        platsim_cmd()
            .arg("--keep-going")
            .write_stdin("link del eth9\nlink add dummy d0\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("d0"))
            .stderr(predicate::str::contains("[1] error"));
    }

    #[test]
    fn test_invalid_line() {
        platsim_cmd()
            .write_stdin("link add vlan v0\n")
            .assert()
            .failure()
            .stderr(predicate::str::contains("line 1"));
    }

    #[test]
    fn test_sysctl_get() {
        platsim_cmd()
            .write_stdin("link add bridge br0 --vlan-filtering\nsysctl get /sys/class/net/br0/bridge/vlan_filtering\n")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "/sys/class/net/br0/bridge/vlan_filtering = 1",
            ));
    }
}

mod json_output {
    use super::*;

    #[test]
    fn test_json_document() {
        let output = platsim_cmd()
            .arg("--json")
            .write_stdin(BRIDGE_SCRIPT)
            .output()
            .unwrap();
        assert!(output.status.success());

        let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let steps = doc["steps"].as_array().unwrap();
        assert_eq!(steps.len(), 7);
        assert_eq!(steps[0]["command"], "link add bridge br0");
        assert_eq!(steps[0]["changes"][0]["op"], "added");
        assert!(doc["cache"].as_array().unwrap().len() > 4);
    }

    #[test]
    fn test_quiet_json_has_no_steps() {
        let output = platsim_cmd()
            .args(["--json", "--quiet"])
            .write_stdin(BRIDGE_SCRIPT)
            .output()
            .unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert!(doc["steps"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_quiet_text_prints_only_cache() {
        platsim_cmd()
            .arg("--quiet")
            .write_stdin("link add dummy d0\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("[1]").not())
            .stdout(predicate::str::contains("d0"));
    }
}
