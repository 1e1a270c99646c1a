//! Report records: profiles, controls and per-assertion results.

use hostprobe_common::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Outcome of one assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Passed,
    Failed,
    Skipped,
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultStatus::Passed => write!(f, "passed"),
            ResultStatus::Failed => write!(f, "failed"),
            ResultStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Run statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Statistics {
    /// Wall-clock duration of the run in seconds.
    pub duration: f64,
}

/// Result of a single assertion inside a control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlResult {
    pub status: ResultStatus,
    pub code_desc: String,
    pub run_time: f64,
    pub start_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

impl ControlResult {
    /// Record an assertion that started at `started` and just finished.
    pub fn new(status: ResultStatus, code_desc: impl Into<String>, started: Timestamp) -> Self {
        Self {
            status,
            code_desc: code_desc.into(),
            run_time: started.elapsed_secs(),
            start_time: started.to_iso8601(),
            skip_message: None,
            resource: None,
        }
    }

    pub fn with_skip_message(mut self, message: impl Into<String>) -> Self {
        self.skip_message = Some(message.into());
        self
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }
}

/// External reference attached to a control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Ref {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Where a control is defined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceLocation {
    #[serde(rename = "ref")]
    pub reference: String,
    pub line: u32,
}

/// A control and the results of its assertions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Control {
    pub id: String,
    pub title: Option<String>,
    pub desc: Option<String>,
    pub impact: f64,
    #[serde(default)]
    pub refs: Vec<Ref>,
    /// Free-form key/value tags.
    #[serde(default)]
    pub tags: Map<String, Value>,
    pub code: String,
    pub source_location: SourceLocation,
    #[serde(default)]
    pub results: Vec<ControlResult>,
}

impl Control {
    pub fn new(id: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            desc: None,
            impact: 0.5,
            refs: Vec::new(),
            tags: Map::new(),
            code: code.into(),
            source_location: SourceLocation::default(),
            results: Vec::new(),
        }
    }

    /// Aggregate status: failed if any result failed, skipped if all were
    /// skipped, passed otherwise.
    pub fn status(&self) -> ResultStatus {
        if self
            .results
            .iter()
            .any(|r| r.status == ResultStatus::Failed)
        {
            ResultStatus::Failed
        } else if !self.results.is_empty()
            && self
                .results
                .iter()
                .all(|r| r.status == ResultStatus::Skipped)
        {
            ResultStatus::Skipped
        } else {
            ResultStatus::Passed
        }
    }
}

/// Platform a profile supports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Supports {
    #[serde(
        rename = "os-family",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub os_family: Option<String>,
}

/// Named group of control ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlGroup {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub controls: Vec<String>,
}

/// A profile: metadata plus its evaluated controls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintainer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supports: Vec<Supports>,
    #[serde(default)]
    pub controls: Vec<Control>,
    #[serde(default)]
    pub groups: Vec<ControlGroup>,
    #[serde(default)]
    pub attributes: Vec<Value>,
}

/// Full execution report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Report {
    pub profiles: Vec<Profile>,
    pub statistics: Statistics,
    pub version: String,
}

impl Report {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            profiles: Vec::new(),
            statistics: Statistics::default(),
            version: version.into(),
        }
    }

    /// Every result across all profiles, with its profile and control.
    pub fn results(&self) -> impl Iterator<Item = (&Profile, &Control, &ControlResult)> {
        self.profiles.iter().flat_map(|profile| {
            profile.controls.iter().flat_map(move |control| {
                control
                    .results
                    .iter()
                    .map(move |result| (profile, control, result))
            })
        })
    }

    /// Flatten into the minimal report: one entry per result.
    pub fn to_min(&self) -> MinReport {
        MinReport {
            statistics: self.statistics.clone(),
            version: self.version.clone(),
            controls: self
                .results()
                .map(|(profile, control, result)| MinControl {
                    id: control.id.clone(),
                    profile_id: Some(profile.name.clone()),
                    status: result.status,
                    code_desc: result.code_desc.clone(),
                    skip_message: result.skip_message.clone(),
                    resource: result.resource.clone(),
                })
                .collect(),
        }
    }
}

/// One result in the minimal report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MinControl {
    pub id: String,
    pub profile_id: Option<String>,
    pub status: ResultStatus,
    pub code_desc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

/// Minimal execution report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MinReport {
    pub statistics: Statistics,
    pub version: String,
    pub controls: Vec<MinControl>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn result(status: ResultStatus) -> ControlResult {
        ControlResult {
            status,
            code_desc: "Bridge br0 should exist".to_string(),
            run_time: 0.001,
            start_time: "2024-01-01T00:00:00.000Z".to_string(),
            skip_message: None,
            resource: None,
        }
    }

    fn sample_report() -> Report {
        let mut control = Control::new("bridge-br0", "describe bridge('br0')");
        control.results = vec![
            result(ResultStatus::Passed),
            result(ResultStatus::Skipped).with_skip_message("not on Windows"),
        ];
        let mut report = Report::new("0.1.0");
        report.profiles.push(Profile {
            name: "adhoc".to_string(),
            controls: vec![control],
            ..Default::default()
        });
        report
    }

    #[test]
    fn test_control_status() {
        let mut control = Control::new("c", "code");
        assert_eq!(control.status(), ResultStatus::Passed);

        control.results = vec![result(ResultStatus::Skipped)];
        assert_eq!(control.status(), ResultStatus::Skipped);

        control.results.push(result(ResultStatus::Passed));
        assert_eq!(control.status(), ResultStatus::Passed);

        control.results.push(result(ResultStatus::Failed));
        assert_eq!(control.status(), ResultStatus::Failed);
    }

    #[test]
    fn test_result_serialization_omits_empty_optionals() {
        let json = serde_json::to_value(result(ResultStatus::Passed)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "passed",
                "code_desc": "Bridge br0 should exist",
                "run_time": 0.001,
                "start_time": "2024-01-01T00:00:00.000Z"
            })
        );
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let json = serde_json::json!({
            "status": "passed",
            "code_desc": "x",
            "run_time": 0.0,
            "start_time": "now",
            "message": "extra"
        });
        assert!(serde_json::from_value::<ControlResult>(json).is_err());
    }

    #[test]
    fn test_to_min() {
        let min = sample_report().to_min();

        assert_eq!(min.controls.len(), 2);
        assert_eq!(min.controls[0].id, "bridge-br0");
        assert_eq!(min.controls[0].profile_id.as_deref(), Some("adhoc"));
        assert_eq!(min.controls[1].status, ResultStatus::Skipped);
        assert_eq!(min.controls[1].skip_message.as_deref(), Some("not on Windows"));
    }

    #[test]
    fn test_source_location_uses_ref_key() {
        let location = SourceLocation {
            reference: "controls/bridge.rb".to_string(),
            line: 3,
        };
        let json = serde_json::to_value(location).unwrap();
        assert_eq!(json, serde_json::json!({"ref": "controls/bridge.rb", "line": 3}));
    }
}
