//! Bridge WASM <-> JavaScript trung lập framework.

use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use visit_core::{BookingPolicy, Coding, VisitConfig, VisitError};
use visit_fhir::scheduling::{self, BookingRequest};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
struct JsVisitConfig {
    #[serde(default)]
    scheduling_enabled: Option<bool>,
    #[serde(default)]
    booking: Option<BookingPolicy>,
    #[serde(default)]
    cancellation_reason: Option<Coding>,
    #[serde(default)]
    slot_window_days: Option<u32>,
}

impl From<JsVisitConfig> for VisitConfig {
    fn from(cfg: JsVisitConfig) -> Self {
        let mut base = VisitConfig::default();
        if let Some(enabled) = cfg.scheduling_enabled {
            base.scheduling_enabled = enabled;
        }
        if let Some(policy) = cfg.booking {
            base.booking = policy;
        }
        if let Some(reason) = cfg.cancellation_reason {
            base.cancellation_reason = Some(reason);
        }
        if let Some(days) = cfg.slot_window_days {
            base.slot_window_days = days;
        }
        base
    }
}

#[derive(Deserialize)]
struct JsBooking {
    patient_id: String,
    patient_display: String,
    slot_id: String,
    #[serde(default)]
    patient_email: Option<String>,
    #[serde(default)]
    practitioner_email: Option<String>,
}

#[wasm_bindgen]
pub fn summarize_patient(patient: JsValue, observations: JsValue) -> Result<JsValue, JsValue> {
    install_panic_hook();

    let patient_value = from_value::<serde_json::Value>(patient)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được JSON Patient: {err}")))?;
    let observations_value = from_value::<serde_json::Value>(observations)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được JSON Observation: {err}")))?;

    let summary = visit_fhir::summarize_patient_value(&patient_value, &observations_value)
        .map_err(|err| JsValue::from_str(&format_visit_error(err)))?;

    to_value(&summary).map_err(|err| JsValue::from_str(&format!("Không serialize kết quả: {err}")))
}

#[wasm_bindgen]
pub fn book_video_visit(booking: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    install_panic_hook();

    let booking: JsBooking = from_value(booking)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được thông tin đặt lịch: {err}")))?;

    let request = scheduling::book_appointment(
        &parse_config(config)?,
        &BookingRequest {
            patient_id: &booking.patient_id,
            patient_display: &booking.patient_display,
            slot_id: &booking.slot_id,
            patient_email: booking.patient_email.as_deref(),
            practitioner_email: booking.practitioner_email.as_deref(),
        },
    )
    .map_err(|err| JsValue::from_str(&format_visit_error(err)))?;

    to_value(&request).map_err(|err| JsValue::from_str(&format!("Không serialize kết quả: {err}")))
}

#[wasm_bindgen]
pub fn cancel_video_visit(appointment: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    install_panic_hook();

    let appointment_value = from_value::<serde_json::Value>(appointment)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được JSON Appointment: {err}")))?;

    let request = scheduling::cancel_appointment(&parse_config(config)?, &appointment_value)
        .map_err(|err| JsValue::from_str(&format_visit_error(err)))?;

    to_value(&request).map_err(|err| JsValue::from_str(&format!("Không serialize kết quả: {err}")))
}

fn parse_config(config: Option<JsValue>) -> Result<VisitConfig, JsValue> {
    match config {
        Some(js_cfg) => {
            let cfg: JsVisitConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Không đọc được config: {err}")))?;
            Ok(VisitConfig::from(cfg))
        }
        None => Ok(VisitConfig::default()),
    }
}

fn format_visit_error(err: VisitError) -> String {
    format!("Visit error: {err}")
}

fn install_panic_hook() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}
