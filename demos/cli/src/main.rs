use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use visit_core::PLACEHOLDER;
use visit_fhir::summarize_patient_str;

#[derive(Parser, Debug)]
#[command(
    name = "visit-cli",
    about = "Tóm tắt hồ sơ bệnh nhân từ JSON FHIR."
)]
struct Args {
    /// Đường dẫn tới file JSON Patient.
    #[arg(short, long)]
    patient: PathBuf,

    /// Đường dẫn tới file JSON bundle Observation.
    #[arg(short, long)]
    observations: PathBuf,

    /// In kết quả dưới dạng JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let patient = std::fs::read_to_string(&args.patient)
        .with_context(|| format!("Không đọc được file {:?}", args.patient))?;
    let observations = std::fs::read_to_string(&args.observations)
        .with_context(|| format!("Không đọc được file {:?}", args.observations))?;

    let summary = summarize_patient_str(&patient, &observations)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "Patient: {}\nGender: {}\nBirth date: {}\nEmail: {}\nHeight: {}\nSystolic BP: {}\nDiastolic BP: {}\nHDL: {}\nLDL: {}",
        summary.full_name(),
        summary.gender,
        summary.birth_date,
        summary.email.as_deref().unwrap_or(PLACEHOLDER),
        summary.height,
        summary.systolic_bp,
        summary.diastolic_bp,
        summary.hdl,
        summary.ldl
    );

    Ok(())
}
