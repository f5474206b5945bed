use crate::model::{CardData, ErrorCorrectionLevel};
use crate::qr::{Bitmap, QrCodeEncoder, QrRequest};

pub(crate) fn with_temp_home<F, R>(func: F) -> R
where
    F: FnOnce(&std::path::Path) -> R,
{
    static HOME_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
    let _guard = HOME_MUTEX.lock().unwrap_or_else(|poison| poison.into_inner());
    let dir = tempfile::tempdir().expect("tempdir");
    let old_home = std::env::var("HOME").ok();
    unsafe { std::env::set_var("HOME", dir.path()) };
    let result = func(dir.path());
    match old_home {
        Some(old) => unsafe { std::env::set_var("HOME", old) },
        None => unsafe { std::env::remove_var("HOME") },
    }
    result
}

pub(crate) fn sample_card() -> CardData {
    CardData {
        name: "Jane Doe".to_string(),
        title: "Senior Software Engineer".to_string(),
        company: "Tech Solutions Inc.".to_string(),
        phone: "+1 (555) 123-4567".to_string(),
        email: "jane.doe@example.com".to_string(),
        website: "www.example.com".to_string(),
        address: "123 Innovation Drive, Tech City".to_string(),
        logo: None,
    }
}

pub(crate) fn sample_qr() -> Bitmap {
    QrCodeEncoder::default()
        .encode_now(&QrRequest::new(
            "https://example.com",
            "#000000",
            ErrorCorrectionLevel::M,
        ))
        .expect("encode sample qr")
}

/// A 2×1 PNG: one opaque red pixel, one transparent.
pub(crate) fn tiny_png() -> Vec<u8> {
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    let mut image = RgbaImage::new(2, 1);
    image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode png");
    bytes
}
