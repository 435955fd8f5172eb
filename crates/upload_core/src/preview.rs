use base64::{engine::general_purpose::STANDARD, Engine as _};
use shared::domain::{PreviewImage, SelectedFile};

/// Encodes the file as a `data:` URL the host can hand straight to an `<img>`.
pub fn encode_preview(file: &SelectedFile) -> PreviewImage {
    let media_type = file.media_type().trim().to_string();
    let data_url = format!("data:{media_type};base64,{}", STANDARD.encode(file.bytes()));
    PreviewImage {
        media_type,
        data_url,
    }
}
