use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;

use std::fs;
use std::path::Path;

use crate::error::LprError;

const OBJECT_ID: u32 = 1;
const VEHICLE_ID: u32 = 2;

/// Base64 of the file exactly as stored on disk.
pub fn encode_file(path: impl AsRef<Path>) -> Result<String, LprError> {
    let bytes = fs::read(path)?;
    Ok(STANDARD.encode(bytes))
}

/// Body of one recognition call.
///
/// `bbox` is always the whole image, the service gets no crop hint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognitionRequest {
    #[serde(rename = "object-id")]
    pub object_id: u32,
    #[serde(rename = "vehicle-id")]
    pub vehicle_id: u32,
    pub image_bright: String,
    pub image_dark: String,
    /// x, y, width, height
    pub bbox: [u32; 4],
    /// ask for plate detection
    pub lpd: bool,
    /// ask for plate recognition
    pub lpr: bool,
}

impl RecognitionRequest {

    pub fn new(width: u32, height: u32, image_bright: String, image_dark: String) -> Self {
        RecognitionRequest {
            object_id: OBJECT_ID,
            vehicle_id: VEHICLE_ID,
            image_bright,
            image_dark,
            bbox: [0, 0, width, height],
            lpd: true,
            lpr: true,
        }
    }

    /// There is only one capture per vehicle, so the same encoding goes into
    /// both the bright and the dark slot.
    pub fn from_file(path: impl AsRef<Path>, width: u32, height: u32) -> Result<Self, LprError> {
        let encoded = encode_file(path)?;
        Ok(Self::new(width, height, encoded.clone(), encoded))
    }
}
