//! QR codes for on-site meeting verification.

use qrcode::render::svg;
use qrcode::QrCode;
use tracing::error;

use crate::common::ApiError;

/// Payload the tutor's scanner reads.
pub fn verification_uri(appointment_id: &str, otp: &str) -> String {
    format!("scholargrid://verify/{}/{}", appointment_id, otp)
}

pub fn render_svg(data: &str) -> Result<String, ApiError> {
    let code = QrCode::new(data.as_bytes()).map_err(|e| {
        error!(error = %e, "QR code generation failed");
        ApiError::InternalServer("QR code generation failed".to_string())
    })?;

    Ok(code
        .render::<svg::Color>()
        .min_dimensions(200, 200)
        .max_dimensions(300, 300)
        .dark_color(svg::Color("#1c1917"))
        .light_color(svg::Color("#ffffff"))
        .build())
}
