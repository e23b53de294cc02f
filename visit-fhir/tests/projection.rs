use serde_json::{json, Value};
use visit_core::{VisitError, PLACEHOLDER};
use visit_fhir::{
    blood_pressure_part, format_quantity, project, summarize_patient_value, ObservationIndex,
    DIASTOLIC_BP, SYSTOLIC_BP,
};

fn empty_index() -> ObservationIndex {
    ObservationIndex::from_value(&json!([])).expect("Không dựng được index rỗng")
}

#[test]
fn projection_is_total_on_empty_input() {
    let summary = project(&json!({}), &empty_index());

    assert_eq!(summary.first_name, PLACEHOLDER);
    assert_eq!(summary.last_name, PLACEHOLDER);
    assert_eq!(summary.gender, PLACEHOLDER);
    assert_eq!(summary.birth_date, PLACEHOLDER);
    assert_eq!(summary.height, PLACEHOLDER);
    assert_eq!(summary.systolic_bp, PLACEHOLDER);
    assert_eq!(summary.diastolic_bp, PLACEHOLDER);
    assert_eq!(summary.hdl, PLACEHOLDER);
    assert_eq!(summary.ldl, PLACEHOLDER);
    assert_eq!(summary.email, None);
}

#[test]
fn empty_name_list_degrades_to_placeholders() {
    let summary = project(&json!({ "name": [] }), &empty_index());

    assert_eq!(summary.first_name, PLACEHOLDER);
    assert_eq!(summary.last_name, PLACEHOLDER);
}

#[test]
fn family_as_list_is_space_joined() {
    let patient = json!({
        "name": [{ "given": ["Daniel", "X."], "family": ["Van", "Adams"] }]
    });

    let summary = project(&patient, &empty_index());

    assert_eq!(summary.first_name, "Daniel X.");
    assert_eq!(summary.last_name, "Van Adams");
}

#[test]
fn family_as_string_is_used_verbatim() {
    let patient = json!({
        "name": [{ "given": ["Daniel"], "family": "Adams" }]
    });

    let summary = project(&patient, &empty_index());

    assert_eq!(summary.last_name, "Adams");
}

#[test]
fn quantity_needs_both_value_and_unit() {
    let complete = json!({ "valueQuantity": { "value": 180, "unit": "cm" } });
    let no_quantity = json!({ "status": "final" });
    let no_unit = json!({ "valueQuantity": { "value": 180 } });

    assert_eq!(format_quantity(Some(&complete)), "180 cm");
    assert_eq!(format_quantity(Some(&no_quantity)), PLACEHOLDER);
    assert_eq!(format_quantity(Some(&no_unit)), PLACEHOLDER);
    assert_eq!(format_quantity(None), PLACEHOLDER);
}

#[test]
fn fractional_quantities_keep_their_digits() {
    let hdl = json!({ "valueQuantity": { "value": 62.5, "unit": "mg/dL" } });

    assert_eq!(format_quantity(Some(&hdl)), "62.5 mg/dL");
}

#[test]
fn blood_pressure_component_is_looked_up_by_code() {
    let panel = vec![json!({
        "component": [{
            "code": { "coding": [{ "system": "http://loinc.org", "code": "8480-6" }] },
            "valueQuantity": { "value": 120, "unit": "mmHg" }
        }]
    })];

    assert_eq!(blood_pressure_part(&panel, SYSTOLIC_BP), "120 mmHg");
    assert_eq!(blood_pressure_part(&panel, DIASTOLIC_BP), PLACEHOLDER);
}

#[test]
fn first_matching_panel_observation_wins() {
    let panel = vec![
        json!({
            "component": [{
                "code": { "coding": [{ "code": "8480-6" }] },
                "valueQuantity": { "value": 120, "unit": "mmHg" }
            }]
        }),
        json!({
            "component": [{
                "code": { "coding": [{ "code": "8480-6" }] },
                "valueQuantity": { "value": 135, "unit": "mmHg" }
            }]
        }),
    ];

    assert_eq!(blood_pressure_part(&panel, SYSTOLIC_BP), "120 mmHg");
}

#[test]
fn email_takes_the_first_email_entry() {
    let patient = json!({
        "telecom": [
            { "system": "phone", "value": "800-555-1234" },
            { "system": "email", "value": "first@example.com" },
            { "system": "email", "value": "second@example.com" }
        ]
    });

    let summary = project(&patient, &empty_index());

    assert_eq!(summary.email.as_deref(), Some("first@example.com"));
}

#[test]
fn email_is_absent_without_an_email_entry() {
    let patient = json!({
        "telecom": [{ "system": "phone", "value": "800-555-1234" }]
    });

    let summary = project(&patient, &empty_index());

    assert_eq!(summary.email, None);
}

#[test]
fn projection_is_idempotent() {
    let patient = json!({
        "name": [{ "given": ["Daniel"], "family": "Adams" }],
        "gender": "male",
        "birthDate": "1925-12-23"
    });
    let observations = json!([{
        "resourceType": "Observation",
        "code": { "coding": [{ "system": "http://loinc.org", "code": "8302-2" }] },
        "valueQuantity": { "value": 180, "unit": "cm" }
    }]);
    let index = ObservationIndex::from_value(&observations).expect("Không dựng được index");

    assert_eq!(project(&patient, &index), project(&patient, &index));
}

#[test]
fn bundle_and_flat_list_produce_the_same_summary() {
    let patient = json!({ "resourceType": "Patient", "gender": "female" });
    let height = json!({
        "resourceType": "Observation",
        "code": { "coding": [{ "system": "http://loinc.org", "code": "8302-2" }] },
        "valueQuantity": { "value": 165, "unit": "cm" }
    });
    let bundle = json!({ "resourceType": "Bundle", "entry": [{ "resource": height.clone() }] });
    let flat = json!([height]);

    let from_bundle = summarize_patient_value(&patient, &bundle).expect("Không đọc được bundle");
    let from_flat = summarize_patient_value(&patient, &flat).expect("Không đọc được danh sách");

    assert_eq!(from_bundle, from_flat);
    assert_eq!(from_bundle.height, "165 cm");
}

#[test]
fn non_patient_resource_is_rejected() {
    let err = summarize_patient_value(&json!({ "resourceType": "Practitioner" }), &json!([]))
        .expect_err("Practitioner không được chấp nhận");

    assert!(matches!(err, VisitError::Parse(_)));
}

#[test]
fn scalar_observation_payload_is_rejected() {
    let patient = json!({ "resourceType": "Patient" });

    let missing = summarize_patient_value(&patient, &json!({ "entry": [] }))
        .expect_err("Thiếu resourceType phải bị từ chối");
    assert!(matches!(missing, VisitError::MissingData));

    let wrong = summarize_patient_value(&patient, &json!({ "resourceType": "Patient" }))
        .expect_err("Kiểu resource sai phải bị từ chối");
    assert!(matches!(wrong, VisitError::Parse(_)));
}

#[test]
fn observations_are_indexed_under_every_coding() {
    let observations = json!([{
        "resourceType": "Observation",
        "code": {
            "coding": [
                { "system": "http://loinc.org", "code": "55284-4" },
                { "system": "http://example.org/local", "code": "bp-panel" }
            ]
        },
        "component": [{
            "code": { "coding": [{ "code": "8462-4" }] },
            "valueQuantity": { "value": 80, "unit": "mmHg" }
        }]
    }]);
    let index = ObservationIndex::from_value(&observations).expect("Không dựng được index");

    assert_eq!(index.by_code("55284-4").len(), 1);
    assert_eq!(index.by_code("bp-panel").len(), 1);
    assert!(index.by_code("8302-2").is_empty());
}

#[test]
fn malformed_fields_still_yield_a_full_record() {
    // Wrong types everywhere: the record must stay fully populated.
    let patient = json!({
        "name": [{ "given": "Daniel", "family": 42 }],
        "gender": 1,
        "birthDate": { "year": 1925 },
        "telecom": "none"
    });

    let summary = project(&patient, &empty_index());
    let as_value = serde_json::to_value(&summary).expect("Không serialize được");

    for field in [
        "first_name",
        "last_name",
        "gender",
        "birth_date",
        "height",
        "systolic_bp",
        "diastolic_bp",
        "hdl",
        "ldl",
    ] {
        assert_eq!(as_value[field], Value::String(PLACEHOLDER.to_string()));
    }
    assert_eq!(as_value["email"], Value::Null);
}
