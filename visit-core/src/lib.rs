//! Kiểu dữ liệu lõi cho ứng dụng khám bệnh qua video.

use serde::{Deserialize, Serialize};

/// Giá trị hiển thị khi dữ liệu nguồn bị thiếu.
pub const PLACEHOLDER: &str = "-";

/// Cấu hình bật/tắt các tính năng giữa những biến thể của ứng dụng.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisitConfig {
    /// Có cho phép đặt lịch hẹn hay không.
    pub scheduling_enabled: bool,
    /// Chính sách email khi đặt lịch.
    pub booking: BookingPolicy,
    /// Mã lý do hủy lịch hẹn (nếu máy chủ yêu cầu).
    pub cancellation_reason: Option<Coding>,
    /// Cửa sổ (ngày) tìm slot trống kể từ hiện tại.
    pub slot_window_days: u32,
}

impl Default for VisitConfig {
    fn default() -> Self {
        Self {
            scheduling_enabled: true,
            booking: BookingPolicy::RequireEmail,
            cancellation_reason: None,
            slot_window_days: 30,
        }
    }
}

/// Chính sách xác định danh tính khi đặt lịch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingPolicy {
    /// Cả bác sĩ và bệnh nhân đều phải có email chính.
    RequireEmail,
    /// Đặt lịch ẩn danh, không kiểm tra email.
    Anonymous,
}

/// Một cặp hệ thống mã + mã (FHIR Coding rút gọn).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Coding {
    pub system: String,
    pub code: String,
}

/// Bản ghi hiển thị phẳng của một bệnh nhân.
///
/// Mọi trường (trừ `email`) luôn có giá trị: dữ liệu thiếu được thay bằng
/// [`PLACEHOLDER`] thay vì bỏ trống.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientSummary {
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub birth_date: String,
    pub height: String,
    pub systolic_bp: String,
    pub diastolic_bp: String,
    pub hdl: String,
    pub ldl: String,
    pub email: Option<String>,
}

impl Default for PatientSummary {
    fn default() -> Self {
        Self {
            first_name: PLACEHOLDER.to_string(),
            last_name: PLACEHOLDER.to_string(),
            gender: PLACEHOLDER.to_string(),
            birth_date: PLACEHOLDER.to_string(),
            height: PLACEHOLDER.to_string(),
            systolic_bp: PLACEHOLDER.to_string(),
            diastolic_bp: PLACEHOLDER.to_string(),
            hdl: PLACEHOLDER.to_string(),
            ldl: PLACEHOLDER.to_string(),
            email: None,
        }
    }
}

impl PatientSummary {
    /// Họ tên đầy đủ dùng cho trường `display` của participant.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Phương thức HTTP của một yêu cầu FHIR.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
}

/// Một yêu cầu REST đã dựng sẵn nhưng chưa gửi.
///
/// Tầng vận chuyển (FHIR client bên ngoài) chịu trách nhiệm mã hóa query và
/// thực hiện lời gọi; ở đây chỉ mô tả.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FhirRequest {
    pub method: HttpMethod,
    /// Đường dẫn tương đối so với gốc máy chủ FHIR, ví dụ `Appointment/123`.
    pub url: String,
    /// Cặp tham số query theo thứ tự, chưa mã hóa.
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    /// JSON đã serialize (nếu yêu cầu có body).
    pub body: Option<String>,
}

/// Lỗi chung của phần lõi.
#[derive(Debug, thiserror::Error)]
pub enum VisitError {
    #[error("Dữ liệu đầu vào thiếu thông tin tối thiểu")]
    MissingData,
    #[error("Không đọc được dữ liệu: {0}")]
    Parse(String),
    #[error("Tính năng đặt lịch đang tắt")]
    SchedulingDisabled,
    #[error("Không thể đặt lịch hẹn: {0}")]
    Booking(String),
}
