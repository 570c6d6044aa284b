//! Getting the user's photo off the wire and into a decoded image.

use actix_multipart::Multipart;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures_util::StreamExt;
use image::RgbImage;

use crate::error::ClassifyError;

/// Raw bytes of the photo the user picked. Lives for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
    pub file_name: Option<String>,
}

impl SelectedFile {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime: None,
            file_name: None,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A fully decoded photo, ready for preprocessing.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    pixels: RgbImage,
}

impl ImageHandle {
    pub fn decode(file: &SelectedFile) -> Result<Self, ClassifyError> {
        let image = image::load_from_memory(&file.bytes)
            .map_err(|e| ClassifyError::InvalidImage(e.to_string()))?;
        Ok(Self {
            pixels: image.to_rgb8(),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }
}

/// Reads the first file field of a multipart upload. Plain form fields, file
/// inputs left empty (no file name) and any later files are drained and
/// ignored.
pub async fn read_first_file(
    mut payload: Multipart,
    limit: usize,
) -> Result<SelectedFile, ClassifyError> {
    let mut selected: Option<SelectedFile> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| ClassifyError::Upload(e.to_string()))?;

        let file_name = field
            .content_disposition()
            .get_filename()
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        if selected.is_some() || file_name.is_none() {
            while let Some(chunk) = field.next().await {
                chunk.map_err(|e| ClassifyError::Upload(e.to_string()))?;
            }
            continue;
        }
        let mime = field.content_type().to_string();

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let data = chunk.map_err(|e| ClassifyError::Upload(e.to_string()))?;
            let size = bytes.len() + data.len();
            if size > limit {
                return Err(ClassifyError::TooLarge { size, limit });
            }
            bytes.extend_from_slice(&data);
        }
        selected = Some(SelectedFile {
            bytes,
            mime: Some(mime),
            file_name,
        });
    }

    selected
        .filter(|file| !file.is_empty())
        .ok_or(ClassifyError::NoFileSelected)
}

/// Parses `data:<mime>;base64,<payload>`. An empty payload counts as no file.
pub fn parse_data_url(url: &str, limit: usize) -> Result<SelectedFile, ClassifyError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ClassifyError::NoFileSelected);
    }

    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| ClassifyError::InvalidImage("expected a data: URL".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| ClassifyError::InvalidImage("data URL has no payload".to_string()))?;

    let mut params = meta.split(';');
    let mime = params
        .next()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string);
    if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
        return Err(ClassifyError::InvalidImage(
            "only base64 data URLs are supported".to_string(),
        ));
    }

    let payload = payload.trim();
    if payload.is_empty() {
        return Err(ClassifyError::NoFileSelected);
    }
    // base64 inflates by 4/3, so this bounds the decoded size before decoding
    let estimated = payload.len() / 4 * 3;
    if estimated > limit {
        return Err(ClassifyError::TooLarge {
            size: estimated,
            limit,
        });
    }

    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| ClassifyError::InvalidImage(e.to_string()))?;
    if bytes.len() > limit {
        return Err(ClassifyError::TooLarge {
            size: bytes.len(),
            limit,
        });
    }

    Ok(SelectedFile {
        bytes,
        mime,
        file_name: None,
    })
}
