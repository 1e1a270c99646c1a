//! JSON schema definitions for report validation.

/// JSON Schema for the full execution report.
pub const EXEC_FULL_SCHEMA: &str = r##"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "title": "Exec JSON full output",
  "type": "object",
  "additionalProperties": false,
  "required": ["profiles", "statistics", "version"],
  "definitions": {
    "statistics": {
      "type": "object",
      "additionalProperties": false,
      "required": ["duration"],
      "properties": {
        "duration": { "type": "number", "minimum": 0 }
      }
    },
    "result": {
      "type": "object",
      "additionalProperties": false,
      "required": ["status", "code_desc", "run_time", "start_time"],
      "properties": {
        "status": { "type": "string", "enum": ["passed", "failed", "skipped"] },
        "code_desc": { "type": "string" },
        "run_time": { "type": "number", "minimum": 0 },
        "start_time": { "type": "string" },
        "skip_message": { "type": "string" },
        "resource": { "type": "string" }
      }
    },
    "ref": {
      "type": "object",
      "additionalProperties": false,
      "required": ["ref"],
      "properties": {
        "ref": { "type": "string" },
        "uri": { "type": "string" },
        "url": { "type": "string" }
      }
    },
    "control": {
      "type": "object",
      "additionalProperties": false,
      "required": ["id", "title", "desc", "impact", "refs", "tags", "code", "source_location", "results"],
      "properties": {
        "id": { "type": "string" },
        "title": { "type": ["string", "null"] },
        "desc": { "type": ["string", "null"] },
        "impact": { "type": "number", "minimum": 0, "maximum": 1 },
        "refs": { "type": "array", "items": { "$ref": "#/definitions/ref" } },
        "tags": { "type": "object" },
        "code": { "type": "string" },
        "source_location": {
          "type": "object",
          "additionalProperties": false,
          "required": ["ref", "line"],
          "properties": {
            "ref": { "type": "string" },
            "line": { "type": "integer", "minimum": 0 }
          }
        },
        "results": { "type": "array", "items": { "$ref": "#/definitions/result" } }
      }
    },
    "supports": {
      "type": "object",
      "additionalProperties": false,
      "properties": {
        "os-family": { "type": "string" }
      }
    },
    "group": {
      "type": "object",
      "additionalProperties": false,
      "required": ["id", "controls"],
      "properties": {
        "id": { "type": "string" },
        "title": { "type": "string" },
        "controls": { "type": "array", "items": { "type": "string" } }
      }
    },
    "profile": {
      "type": "object",
      "additionalProperties": false,
      "required": ["name", "controls", "groups", "attributes"],
      "properties": {
        "name": { "type": "string" },
        "version": { "type": "string" },
        "title": { "type": "string" },
        "maintainer": { "type": "string" },
        "copyright": { "type": "string" },
        "copyright_email": { "type": "string" },
        "license": { "type": "string" },
        "summary": { "type": "string" },
        "supports": { "type": "array", "items": { "$ref": "#/definitions/supports" } },
        "controls": { "type": "array", "items": { "$ref": "#/definitions/control" } },
        "groups": { "type": "array", "items": { "$ref": "#/definitions/group" } },
        "attributes": { "type": "array" }
      }
    }
  },
  "properties": {
    "profiles": { "type": "array", "items": { "$ref": "#/definitions/profile" } },
    "statistics": { "$ref": "#/definitions/statistics" },
    "version": { "type": "string" }
  }
}"##;

/// JSON Schema for the minimal execution report.
pub const EXEC_MIN_SCHEMA: &str = r##"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "title": "Exec JSON-MIN output",
  "type": "object",
  "additionalProperties": false,
  "required": ["statistics", "version", "controls"],
  "properties": {
    "statistics": {
      "type": "object",
      "additionalProperties": false,
      "required": ["duration"],
      "properties": {
        "duration": { "type": "number", "minimum": 0 }
      }
    },
    "version": { "type": "string" },
    "controls": {
      "type": "array",
      "items": {
        "type": "object",
        "additionalProperties": false,
        "required": ["id", "profile_id", "status", "code_desc"],
        "properties": {
          "id": { "type": "string" },
          "profile_id": { "type": ["string", "null"] },
          "status": { "type": "string", "enum": ["passed", "failed", "skipped"] },
          "code_desc": { "type": "string" },
          "skip_message": { "type": "string" },
          "resource": { "type": "string" }
        }
      }
    }
  }
}"##;

/// Get the full report schema as a parsed JSON value.
pub fn exec_full_schema() -> serde_json::Value {
    serde_json::from_str(EXEC_FULL_SCHEMA).expect("Invalid exec full schema")
}

/// Get the minimal report schema as a parsed JSON value.
pub fn exec_min_schema() -> serde_json::Value {
    serde_json::from_str(EXEC_MIN_SCHEMA).expect("Invalid exec min schema")
}
