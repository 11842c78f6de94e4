//! Enrolment QR codes for `otpauth://` URIs.
//!
//! Uses the `qrcode` crate to build the matrix and render it to a grayscale
//! image, and the `image` crate to encode PNG bytes suitable for embedding
//! in a page or writing to disk.

use image::Luma;
use qrcode::QrCode;

use crate::otp::error::{OtpError, OtpResult};
use crate::otp::types::Enrolment;
use crate::otp::uri;

/// Module size in pixels (each QR "module" becomes this many px wide).
const MODULE_PX: u32 = 8;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PNG bytes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Render arbitrary text as a QR code PNG.
pub fn text_to_png(text: &str, module_px: Option<u32>) -> OtpResult<Vec<u8>> {
    let code = QrCode::new(text.as_bytes())
        .map_err(|e| OtpError::Qr(format!("QR encode: {}", e)))?;

    let px = module_px.unwrap_or(MODULE_PX).max(1);
    let img = code
        .render::<Luma<u8>>()
        .module_dimensions(px, px)
        .quiet_zone(true)
        .build();

    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(
        encoder,
        img.as_raw(),
        img.width(),
        img.height(),
        image::ExtendedColorType::L8,
    )
    .map_err(|e| OtpError::Qr(format!("PNG encode: {}", e)))?;

    Ok(buf)
}

/// Render an enrolment's otpauth URI as a QR code PNG.
pub fn enrolment_to_png(enrolment: &Enrolment) -> OtpResult<Vec<u8>> {
    text_to_png(&uri::build_otpauth(enrolment), None)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Data URIs
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// `data:image/png;base64,...` form of [`enrolment_to_png`], for embedding
/// in HTML.
pub fn enrolment_to_data_uri(enrolment: &Enrolment) -> OtpResult<String> {
    let png = enrolment_to_png(enrolment)?;
    Ok(format!("data:image/png;base64,{}", base64_encode(&png)))
}

/// Data-URI form of [`text_to_png`].
pub fn text_to_data_uri(text: &str) -> OtpResult<String> {
    let png = text_to_png(text, None)?;
    Ok(format!("data:image/png;base64,{}", base64_encode(&png)))
}

fn base64_encode(data: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::otp::types::SharedSecret;

    #[test]
    fn qr_png_has_png_magic() {
        let png = text_to_png("otpauth://totp/Test?secret=JBSWY3DPEHPK3PXP", None).unwrap();
        assert!(png.len() > 8);
        assert_eq!(&png[..4], b"\x89PNG");
    }

    #[test]
    fn qr_enrolment_png() {
        let e = Enrolment::new("alice", SharedSecret::new("JBSWY3DPEHPK3PXP"))
            .with_issuer("Example");
        let png = enrolment_to_png(&e).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
        assert!(png.len() > 100);
    }

    #[test]
    fn qr_data_uri_format() {
        let e = Enrolment::new("test", SharedSecret::new("ABCDEF"));
        let uri = enrolment_to_data_uri(&e).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn qr_text_data_uri() {
        let uri = text_to_data_uri("hello world").unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn qr_custom_module_px_changes_size() {
        let small = text_to_png("test", Some(2)).unwrap();
        let large = text_to_png("test", Some(16)).unwrap();
        assert!(large.len() > small.len());
    }

    #[test]
    fn qr_long_text() {
        let long_text = "a".repeat(500);
        let png = text_to_png(&long_text, None).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
    }
}
