//! Turn probe answers into report controls.

use chrono::Utc;
use hostprobe_common::Timestamp;
use hostprobe_probes::{Answer, Bridge, KeyPair, Probe, X509Certificate};
use hostprobe_report::{Control, ControlResult, Profile, Report, ResultStatus, Statistics};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Process exit code when every result passed.
pub const EXIT_PASSED: i32 = 0;
/// Process exit code when at least one result failed.
pub const EXIT_FAILED: i32 = 100;
/// Process exit code when nothing failed but something was skipped.
pub const EXIT_SKIPPED: i32 = 101;

const PROFILE_NAME: &str = "hostprobe";

/// Map one assertion to a report result.
///
/// A probe that skipped as a whole skips every assertion with its own
/// message; otherwise `Known(true)` passes, `Known(false)` and `Unknown`
/// fail, and a skipped answer skips with its reason.
pub fn assertion(
    probe: &dyn Probe,
    code_desc: impl Into<String>,
    answer: Answer<bool>,
    started: Timestamp,
) -> ControlResult {
    let code_desc = code_desc.into();
    let result = match (probe.skip_message(), answer) {
        (Some(message), _) | (None, Answer::Skipped(message)) => {
            ControlResult::new(ResultStatus::Skipped, code_desc, started)
                .with_skip_message(message)
        }
        (None, Answer::Known(true)) => ControlResult::new(ResultStatus::Passed, code_desc, started),
        (None, Answer::Known(false)) | (None, Answer::Unknown) => {
            ControlResult::new(ResultStatus::Failed, code_desc, started)
        }
    };
    debug!("{}: {}", result.code_desc, result.status);
    result.with_resource(probe.resource_name())
}

fn control_for(probe: &dyn Probe, id: String, code: String) -> Control {
    for warning in probe.warnings() {
        warn!("{}: {}", probe.describe(), warning);
    }
    let mut control = Control::new(id, code);
    control.title = Some(probe.describe());
    control
}

/// Existence plus one membership assertion per expected interface.
pub fn bridge_control(bridge: &Bridge, interfaces: &[String]) -> Control {
    let started = Timestamp::now();
    let exists = bridge.exists();
    let mut control = control_for(
        bridge,
        format!("bridge-{}", bridge.name()),
        format!("describe bridge('{}')", bridge.name()),
    );

    control.results.push(assertion(
        bridge,
        format!("Bridge {} should exist", bridge.name()),
        Answer::Known(exists),
        started,
    ));
    for interface in interfaces {
        let started = Timestamp::now();
        control.results.push(assertion(
            bridge,
            format!("Bridge {} should have interface {}", bridge.name(), interface),
            bridge.has_interface(interface),
            started,
        ));
    }
    control
}

/// Validity and privacy of a key file.
pub fn key_control(key: &KeyPair) -> Control {
    let mut control = control_for(
        key,
        format!("rsa-key-{}", key.path()),
        format!("describe key_rsa('{}')", key.path()),
    );

    let started = Timestamp::now();
    control.results.push(assertion(
        key,
        format!("rsa_key {} should be valid", key.path()),
        key.valid(),
        started,
    ));
    let started = Timestamp::now();
    control.results.push(assertion(
        key,
        format!("rsa_key {} should be private", key.path()),
        key.private(),
        started,
    ));
    control
}

/// Certificate presence, validity window and optional remaining lifetime.
pub fn certificate_control(cert: &X509Certificate, min_validity_days: Option<f64>) -> Control {
    let mut control = control_for(
        cert,
        format!("x509-{}", cert.path()),
        format!("describe x509_certificate('{}')", cert.path()),
    );

    let started = Timestamp::now();
    control.results.push(assertion(
        cert,
        format!("x509_certificate {} should be certificate", cert.path()),
        Answer::Known(cert.certificate()),
        started,
    ));
    let started = Timestamp::now();
    control.results.push(assertion(
        cert,
        format!("x509_certificate {} should be valid", cert.path()),
        cert.valid(),
        started,
    ));
    if let Some(days) = min_validity_days {
        let started = Timestamp::now();
        control.results.push(assertion(
            cert,
            format!(
                "x509_certificate {} validity_in_days should be >= {}",
                cert.path(),
                days
            ),
            cert.validity_in_days().map(|remaining| remaining >= days),
            started,
        ));
    }
    control
}

/// Wrap controls in a single-profile report.
pub fn build_report(controls: Vec<Control>, started: Timestamp) -> Report {
    let mut report = Report::new(env!("CARGO_PKG_VERSION"));
    report.profiles.push(Profile {
        name: PROFILE_NAME.to_string(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
        title: Some("Ad-hoc host probes".to_string()),
        controls,
        ..Default::default()
    });
    report.statistics = Statistics {
        duration: started.elapsed_secs(),
    };
    report
}

/// Exit code for a finished report.
pub fn exit_code(report: &Report) -> i32 {
    let mut skipped = false;
    for (_, _, result) in report.results() {
        match result.status {
            ResultStatus::Failed => return EXIT_FAILED,
            ResultStatus::Skipped => skipped = true,
            ResultStatus::Passed => {}
        }
    }
    if skipped {
        EXIT_SKIPPED
    } else {
        EXIT_PASSED
    }
}

fn facts(probe: &dyn Probe, fact: Value) -> Value {
    json!({
        "resource": probe.resource_name(),
        "target": probe.describe(),
        "fact": fact,
        "skip_message": probe.skip_message(),
        "warnings": probe.warnings(),
    })
}

/// Raw facts gathered by a bridge probe.
pub fn bridge_facts(bridge: &Bridge) -> Value {
    facts(bridge, json!(bridge.info()))
}

/// Raw facts gathered by a key probe.
pub fn key_facts(key: &KeyPair) -> Value {
    facts(key, json!(key.info()))
}

/// Raw facts gathered by a certificate probe.
pub fn certificate_facts(cert: &X509Certificate) -> Value {
    let mut value = facts(cert, json!(cert.info()));
    if let Some(info) = cert.info() {
        value["validity_in_days"] = json!(info.validity_in_days_at(Utc::now()));
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostprobe_common::OsFamily;
    use hostprobe_host::MemoryHost;
    use hostprobe_report::validate_report;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn linux_bridge_host() -> MemoryHost {
        MemoryHost::new(OsFamily::Linux)
            .with_directory("/sys/class/net/br0/bridge")
            .with_command("ls -1 /sys/class/net/br0/brif/", "eth0\neth1\n")
    }

    fn statuses(control: &Control) -> Vec<ResultStatus> {
        control.results.iter().map(|r| r.status).collect()
    }

    #[test]
    fn test_bridge_control_linux() {
        let bridge = Bridge::new(Arc::new(linux_bridge_host()), "br0");
        let control = bridge_control(&bridge, &["eth0".to_string(), "eth9".to_string()]);

        assert_eq!(control.id, "bridge-br0");
        assert_eq!(
            statuses(&control),
            vec![
                ResultStatus::Passed,
                ResultStatus::Passed,
                ResultStatus::Failed
            ]
        );
        assert_eq!(control.results[0].code_desc, "Bridge br0 should exist");
        assert_eq!(control.results[0].resource.as_deref(), Some("bridge"));
    }

    #[test]
    fn test_bridge_control_missing_bridge_fails() {
        let host = MemoryHost::new(OsFamily::Linux);
        let bridge = Bridge::new(Arc::new(host), "br0");
        let control = bridge_control(&bridge, &[]);

        assert_eq!(statuses(&control), vec![ResultStatus::Failed]);
    }

    #[test]
    fn test_bridge_control_unsupported_os_skips_everything() {
        let bridge = Bridge::new(Arc::new(MemoryHost::new(OsFamily::Other)), "br0");
        let control = bridge_control(&bridge, &["eth0".to_string()]);

        assert_eq!(
            statuses(&control),
            vec![ResultStatus::Skipped, ResultStatus::Skipped]
        );
        assert!(control.results[0].skip_message.is_some());
    }

    #[test]
    fn test_assertion_mapping() {
        let bridge = Bridge::new(Arc::new(linux_bridge_host()), "br0");
        let now = Timestamp::now();

        let passed = assertion(&bridge, "a", Answer::Known(true), now);
        let failed = assertion(&bridge, "b", Answer::Known(false), now);
        let unknown = assertion(&bridge, "c", Answer::Unknown, now);
        let skipped = assertion(&bridge, "d", Answer::skipped("no ports"), now);

        assert_eq!(passed.status, ResultStatus::Passed);
        assert_eq!(failed.status, ResultStatus::Failed);
        assert_eq!(unknown.status, ResultStatus::Failed);
        assert_eq!(skipped.status, ResultStatus::Skipped);
        assert_eq!(skipped.skip_message.as_deref(), Some("no ports"));
    }

    #[test]
    fn test_key_control_unreadable_key() {
        let host = MemoryHost::new(OsFamily::Linux).with_file("/etc/key.pem", "not a key");
        let key = KeyPair::new(Arc::new(host), "/etc/key.pem");
        let control = key_control(&key);

        assert_eq!(
            statuses(&control),
            vec![ResultStatus::Skipped, ResultStatus::Skipped]
        );
        assert_eq!(
            control.results[0].skip_message.as_deref(),
            Some("Unable to load private key")
        );
    }

    #[test]
    fn test_certificate_control_missing_file() {
        let host = MemoryHost::new(OsFamily::Linux);
        let cert = X509Certificate::new(Arc::new(host), "/etc/ssl/cert.pem");
        let control = certificate_control(&cert, Some(30.0));

        assert_eq!(
            statuses(&control),
            vec![
                ResultStatus::Failed,
                ResultStatus::Failed,
                ResultStatus::Failed
            ]
        );
        assert_eq!(
            control.results[2].code_desc,
            "x509_certificate /etc/ssl/cert.pem validity_in_days should be >= 30"
        );
    }

    #[test]
    fn test_exit_codes() {
        let bridge = Bridge::new(Arc::new(linux_bridge_host()), "br0");
        let passing = build_report(vec![bridge_control(&bridge, &[])], Timestamp::now());
        assert_eq!(exit_code(&passing), EXIT_PASSED);

        let other = Bridge::new(Arc::new(MemoryHost::new(OsFamily::Other)), "br0");
        let skipped = build_report(vec![bridge_control(&other, &[])], Timestamp::now());
        assert_eq!(exit_code(&skipped), EXIT_SKIPPED);

        let failing = build_report(
            vec![
                bridge_control(&other, &[]),
                bridge_control(&bridge, &["eth9".to_string()]),
            ],
            Timestamp::now(),
        );
        assert_eq!(exit_code(&failing), EXIT_FAILED);
    }

    #[test]
    fn test_built_report_validates() {
        let bridge = Bridge::new(Arc::new(linux_bridge_host()), "br0");
        let report = build_report(
            vec![bridge_control(&bridge, &["eth1".to_string()])],
            Timestamp::now(),
        );

        let result = validate_report(&report).unwrap();
        assert!(result.valid, "Errors: {:?}", result.errors);
    }

    #[test]
    fn test_bridge_facts() {
        let bridge = Bridge::new(Arc::new(linux_bridge_host()), "br0");
        let facts = bridge_facts(&bridge);

        assert_eq!(facts["resource"], "bridge");
        assert_eq!(facts["fact"]["name"], "br0");
        assert_eq!(facts["fact"]["interfaces"], json!(["eth0", "eth1"]));
        assert_eq!(facts["skip_message"], Value::Null);
    }
}
