use image::imageops::FilterType;
use image::GenericImageView;

/// Bounding boxes applied to site imagery after upload. The storage layer
/// is format-agnostic; resizing happens on the raw bytes before they are
/// handed to `AssetStorage::save`.
pub const LOGO_MAX: (u32, u32) = (600, 600);
pub const FAVICON_MAX: (u32, u32) = (128, 128);
pub const HERO_MAX: (u32, u32) = (1920, 1080);

/// Downscale an image to fit within `max` (no upscaling), re-encoding in
/// its original format. Returns the input untouched when it is not a
/// decodable image — non-image uploads pass through the same call sites.
pub fn resize_to_fit(bytes: &[u8], max: (u32, u32)) -> Vec<u8> {
    let format = match image::guess_format(bytes) {
        Ok(f) => f,
        Err(_) => return bytes.to_vec(),
    };
    let img = match image::load_from_memory(bytes) {
        Ok(i) => i,
        Err(_) => return bytes.to_vec(),
    };

    let (width, height) = img.dimensions();
    if width <= max.0 && height <= max.1 {
        return bytes.to_vec();
    }

    let resized = img.resize(max.0, max.1, FilterType::Lanczos3);

    let mut out = std::io::Cursor::new(Vec::new());
    match resized.write_to(&mut out, format) {
        Ok(_) => out.into_inner(),
        Err(_) => bytes.to_vec(),
    }
}
