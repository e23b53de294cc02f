//! FHIR JSON to `PatientSummary` converter for the video-visit app.

use std::collections::HashMap;

use serde_json::Value;
use visit_core::{PatientSummary, VisitError, PLACEHOLDER};

pub mod scheduling;

/// Coding system of every observation the summary cares about.
pub const LOINC_SYSTEM: &str = "http://loinc.org";

pub const HEIGHT: &str = "8302-2";
pub const HDL: &str = "2085-9";
pub const LDL: &str = "2089-1";
pub const BLOOD_PRESSURE_PANEL: &str = "55284-4";
pub const SYSTOLIC_BP: &str = "8480-6";
pub const DIASTOLIC_BP: &str = "8462-4";

/// Codes requested from the server, in query order.
pub const OBSERVED_CODES: [&str; 6] = [
    HEIGHT,
    DIASTOLIC_BP,
    SYSTOLIC_BP,
    HDL,
    LDL,
    BLOOD_PRESSURE_PANEL,
];

/// Summarize a patient from raw JSON strings.
pub fn summarize_patient_str(
    patient_json: &str,
    observations_json: &str,
) -> Result<PatientSummary, VisitError> {
    let patient: Value =
        serde_json::from_str(patient_json).map_err(|err| VisitError::Parse(err.to_string()))?;
    let observations: Value = serde_json::from_str(observations_json)
        .map_err(|err| VisitError::Parse(err.to_string()))?;
    summarize_patient_value(&patient, &observations)
}

/// Summarize a patient from already-parsed `serde_json::Value`s.
pub fn summarize_patient_value(
    patient: &Value,
    observations: &Value,
) -> Result<PatientSummary, VisitError> {
    let resource_type = patient
        .get("resourceType")
        .and_then(Value::as_str)
        .ok_or(VisitError::MissingData)?;

    if resource_type != "Patient" {
        return Err(VisitError::Parse(format!(
            "Expected resourceType Patient, received {resource_type}"
        )));
    }

    let index = ObservationIndex::from_value(observations)?;
    Ok(project(patient, &index))
}

/// Observations of one fetch, grouped by each of their coding codes.
///
/// Built once per bundle and read-only afterwards. Accepts either a FHIR
/// `Bundle` or the flat resource array a client returns with `flat: true`.
#[derive(Debug, Default)]
pub struct ObservationIndex {
    by_code: HashMap<String, Vec<Value>>,
}

impl ObservationIndex {
    pub fn from_value(observations: &Value) -> Result<Self, VisitError> {
        if let Some(entries) = observations.as_array() {
            return Ok(Self::from_resources(entries.iter()));
        }

        let resource_type = observations
            .get("resourceType")
            .and_then(Value::as_str)
            .ok_or(VisitError::MissingData)?;

        if resource_type != "Bundle" {
            return Err(VisitError::Parse(format!(
                "Expected a Bundle or a flat resource list, received {resource_type}"
            )));
        }

        let entries = observations
            .get("entry")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        Ok(Self::from_resources(entries.iter().filter_map(|entry| {
            let resource = entry.get("resource")?;
            match resource.get("resourceType").and_then(Value::as_str) {
                Some("Observation") => Some(resource),
                _ => None,
            }
        })))
    }

    pub fn from_resources<'a>(resources: impl Iterator<Item = &'a Value>) -> Self {
        let mut index = Self::default();
        for resource in resources {
            index.insert(resource);
        }
        index
    }

    /// Observations carrying `code`, in bundle order. Empty when unseen.
    pub fn by_code(&self, code: &str) -> &[Value] {
        self.by_code.get(code).map(Vec::as_slice).unwrap_or_default()
    }

    fn insert(&mut self, resource: &Value) {
        let Some(codings) = resource
            .get("code")
            .and_then(|code| code.get("coding"))
            .and_then(Value::as_array)
        else {
            return;
        };

        for coding in codings {
            if let Some(code) = coding.get("code").and_then(Value::as_str) {
                self.by_code
                    .entry(code.to_string())
                    .or_default()
                    .push(resource.clone());
            }
        }
    }
}

/// Project a patient resource and its indexed observations into the flat
/// display record. Total: malformed or missing data degrades to placeholders.
pub fn project(patient: &Value, observations: &ObservationIndex) -> PatientSummary {
    let (first_name, last_name) = extract_name(patient);

    PatientSummary {
        first_name,
        last_name,
        gender: string_field(patient, "gender"),
        birth_date: string_field(patient, "birthDate"),
        height: format_quantity(observations.by_code(HEIGHT).first()),
        systolic_bp: blood_pressure_part(
            observations.by_code(BLOOD_PRESSURE_PANEL),
            SYSTOLIC_BP,
        ),
        diastolic_bp: blood_pressure_part(
            observations.by_code(BLOOD_PRESSURE_PANEL),
            DIASTOLIC_BP,
        ),
        hdl: format_quantity(observations.by_code(HDL).first()),
        ldl: format_quantity(observations.by_code(LDL).first()),
        email: extract_email(patient),
    }
}

/// `family` appears in the wild both as a plain string and as a list of name
/// parts. Resolved once here so nothing downstream re-checks the shape.
enum FamilyName {
    Single(String),
    Parts(Vec<String>),
}

impl FamilyName {
    fn from_value(value: Option<&Value>) -> Option<Self> {
        match value? {
            Value::String(single) => Some(Self::Single(single.clone())),
            Value::Array(parts) => Some(Self::Parts(
                parts
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
            )),
            _ => None,
        }
    }

    fn into_display(self) -> String {
        match self {
            Self::Single(single) => single,
            Self::Parts(parts) => parts.join(" "),
        }
    }
}

fn extract_name(patient: &Value) -> (String, String) {
    let Some(name) = patient
        .get("name")
        .and_then(Value::as_array)
        .and_then(|names| names.first())
    else {
        return (PLACEHOLDER.to_string(), PLACEHOLDER.to_string());
    };

    let first_name = name
        .get("given")
        .and_then(Value::as_array)
        .map(|given| {
            given
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|joined| !joined.is_empty())
        .unwrap_or_else(|| PLACEHOLDER.to_string());

    let last_name = FamilyName::from_value(name.get("family"))
        .map(FamilyName::into_display)
        .filter(|joined| !joined.is_empty())
        .unwrap_or_else(|| PLACEHOLDER.to_string());

    (first_name, last_name)
}

fn extract_email(patient: &Value) -> Option<String> {
    // Telecom entries arrive rank-ordered, so the first email wins.
    patient
        .get("telecom")?
        .as_array()?
        .iter()
        .find(|contact| contact.get("system").and_then(Value::as_str) == Some("email"))
        .and_then(|contact| contact.get("value"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Render `valueQuantity` as `"value unit"`, or the placeholder when the
/// observation, its value or its unit is missing.
pub fn format_quantity(observation: Option<&Value>) -> String {
    observation
        .and_then(|observation| observation.get("valueQuantity"))
        .and_then(|quantity| {
            let value = quantity.get("value")?.as_f64()?;
            let unit = quantity.get("unit")?.as_str()?;
            Some(format!("{} {unit}", format_numeric(value)))
        })
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Pull one side of a blood-pressure panel out of its observations.
///
/// Each panel observation reports systolic and diastolic as components; the
/// first observation with a component carrying `component_code` wins and
/// later matches are dropped.
pub fn blood_pressure_part(panel: &[Value], component_code: &str) -> String {
    let component = panel.iter().find_map(|observation| {
        observation
            .get("component")?
            .as_array()?
            .iter()
            .find(|component| coding_matches(component.get("code"), component_code))
    });

    format_quantity(component)
}

fn coding_matches(code: Option<&Value>, target: &str) -> bool {
    code.and_then(|code| code.get("coding"))
        .and_then(Value::as_array)
        .map(|codings| {
            codings
                .iter()
                .any(|coding| coding.get("code").and_then(Value::as_str) == Some(target))
        })
        .unwrap_or(false)
}

fn string_field(resource: &Value, field: &str) -> String {
    resource
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn format_numeric(value: f64) -> String {
    if value.fract().abs() < f64::EPSILON {
        format!("{value:.0}")
    } else if (value * 10.0).fract().abs() < f64::EPSILON {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
