//! Builders for the REST calls around slots and video-visit appointments.
//!
//! Everything here constructs requests; the external FHIR client encodes and
//! sends them.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{json, Value};
use visit_core::{BookingPolicy, FhirRequest, HttpMethod, VisitConfig, VisitError};

use crate::{LOINC_SYSTEM, OBSERVED_CODES};

/// "Video Visit" service type from the sandbox test data; production service
/// types must be provided by the implementation team.
pub const VIDEO_VISIT_SERVICE_TYPE: &str =
    "https://fhir.cerner.com/ec2458f2-1e24-41c8-b71b-0e701af7583d/codeSet/14249|2572307911";

/// Inputs for booking one slot for one patient.
pub struct BookingRequest<'a> {
    pub patient_id: &'a str,
    pub patient_display: &'a str,
    pub slot_id: &'a str,
    pub patient_email: Option<&'a str>,
    pub practitioner_email: Option<&'a str>,
}

/// Join URLs returned by the consultation provider.
pub struct VideoLinks<'a> {
    pub receiver_join_url: &'a str,
    pub caller_join_url: &'a str,
}

/// Query for the observations backing the patient summary.
pub fn observation_query(patient_id: &str) -> FhirRequest {
    let codes = OBSERVED_CODES
        .iter()
        .map(|code| format!("{LOINC_SYSTEM}|{code}"))
        .collect::<Vec<_>>()
        .join(",");

    query(
        "Observation",
        vec![
            ("patient".to_string(), patient_id.to_string()),
            ("code".to_string(), codes),
        ],
    )
}

/// Query for the patient's upcoming booked appointments.
pub fn appointment_query(patient_id: &str, now: DateTime<Utc>) -> FhirRequest {
    query(
        "Appointment",
        vec![
            ("patient".to_string(), patient_id.to_string()),
            ("date".to_string(), format!("ge{}", instant(now))),
            ("status".to_string(), "booked".to_string()),
        ],
    )
}

/// Query for a practitioner's open slots inside the configured window.
pub fn slot_query(
    practitioner: &str,
    service_type: &str,
    now: DateTime<Utc>,
    window_days: u32,
) -> FhirRequest {
    let min = instant(now);
    let max = instant(now + Duration::days(i64::from(window_days)));

    query(
        "Slot",
        vec![
            ("schedule.actor".to_string(), practitioner.to_string()),
            ("service-type".to_string(), service_type.to_string()),
            ("start".to_string(), format!("ge{min}")),
            ("start".to_string(), format!("lt{max}")),
        ],
    )
}

/// Human-readable time range of a slot resource, UTC.
pub fn slot_label(slot: &Value) -> Option<String> {
    let start = parse_instant(slot.get("start")?.as_str()?)?;
    let end = parse_instant(slot.get("end")?.as_str()?)?;

    Some(format!(
        "{} - {}",
        start.format("%Y-%m-%d %H:%M"),
        end.format("%Y-%m-%d %H:%M")
    ))
}

/// Build the `POST Appointment` booking a slot for the patient.
pub fn book_appointment(
    config: &VisitConfig,
    booking: &BookingRequest<'_>,
) -> Result<FhirRequest, VisitError> {
    if !config.scheduling_enabled {
        return Err(VisitError::SchedulingDisabled);
    }

    if config.booking == BookingPolicy::RequireEmail
        && (booking.patient_email.is_none() || booking.practitioner_email.is_none())
    {
        return Err(VisitError::Booking(
            "a primary email address is required for both practitioner and patient".to_string(),
        ));
    }

    let body = json!({
        "resourceType": "Appointment",
        "status": "booked",
        "slot": [{ "reference": format!("Slot/{}", booking.slot_id) }],
        "participant": [{
            "actor": {
                "reference": format!("Patient/{}", booking.patient_id),
                "display": booking.patient_display,
            },
            "status": "accepted",
        }],
    });

    Ok(FhirRequest {
        method: HttpMethod::Post,
        url: "Appointment".to_string(),
        params: Vec::new(),
        headers: vec![(
            "Content-Type".to_string(),
            "application/fhir+json".to_string(),
        )],
        body: Some(body.to_string()),
    })
}

/// Patch the consultation join URLs and slot period into a freshly booked
/// appointment's contained telecom entries.
pub fn video_link_patch(
    appointment: &Value,
    slot: &Value,
    links: &VideoLinks<'_>,
) -> Result<FhirRequest, VisitError> {
    let start = slot
        .get("start")
        .and_then(Value::as_str)
        .ok_or(VisitError::MissingData)?;
    let end = slot
        .get("end")
        .and_then(Value::as_str)
        .ok_or(VisitError::MissingData)?;

    let operations = json!([
        { "op": "add", "path": "/contained/0/telecom/0/value", "value": links.receiver_join_url },
        { "op": "add", "path": "/contained/1/telecom/0/value", "value": links.caller_join_url },
        { "op": "add", "path": "/contained/0/telecom/0/period/start", "value": start },
        { "op": "add", "path": "/contained/0/telecom/0/period/end", "value": end },
    ]);

    patch_request(appointment, &operations)
}

/// Build the patch cancelling an appointment, with the configured reason
/// coding when one is set.
pub fn cancel_appointment(
    config: &VisitConfig,
    appointment: &Value,
) -> Result<FhirRequest, VisitError> {
    if !config.scheduling_enabled {
        return Err(VisitError::SchedulingDisabled);
    }

    let mut operations = vec![json!({
        "op": "replace",
        "path": "/status",
        "value": "cancelled",
    })];

    if let Some(reason) = &config.cancellation_reason {
        operations.push(json!({
            "op": "add",
            "path": "/cancelationReason",
            "value": { "coding": [{ "system": reason.system, "code": reason.code }] },
        }));
    }

    patch_request(appointment, &Value::Array(operations))
}

fn patch_request(appointment: &Value, operations: &Value) -> Result<FhirRequest, VisitError> {
    let id = appointment
        .get("id")
        .and_then(Value::as_str)
        .ok_or(VisitError::MissingData)?;
    // Optimistic concurrency: the patch only applies to the version we read.
    let version_id = appointment
        .get("meta")
        .and_then(|meta| meta.get("versionId"))
        .and_then(Value::as_str)
        .ok_or(VisitError::MissingData)?;

    Ok(FhirRequest {
        method: HttpMethod::Patch,
        url: format!("Appointment/{id}"),
        params: Vec::new(),
        headers: vec![
            (
                "Content-Type".to_string(),
                "application/json-patch+json".to_string(),
            ),
            ("If-Match".to_string(), format!("W/\"{version_id}\"")),
        ],
        body: Some(operations.to_string()),
    })
}

fn query(url: &str, params: Vec<(String, String)>) -> FhirRequest {
    FhirRequest {
        method: HttpMethod::Get,
        url: url.to_string(),
        params,
        headers: Vec::new(),
        body: None,
    }
}

fn instant(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
