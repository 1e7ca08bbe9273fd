use image::ImageError;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;

use std::error::Error;
use std::fmt;
use std::io::Error as IOError;

#[derive(Debug)]
pub struct LprError(LprErrorKind);

#[derive(Debug)]
pub enum LprErrorKind {
    IOError(IOError),
    DecodeError(ImageError),
    TransportError(HttpError),
    /// the endpoint answered with something other than 200
    Status(u16),
    JsonError(JsonError),
    /// 200 response without `result.license_plate_number`
    MissingPlate,
    FontError(String),
}

impl LprError {
    pub fn kind(&self) -> &LprErrorKind {
        &self.0
    }

    /// network failure, non-200 status or an unusable response body
    pub fn is_transport(&self) -> bool {
        matches!(self.kind(),
            LprErrorKind::TransportError(_) | LprErrorKind::Status(_)
            | LprErrorKind::JsonError(_) | LprErrorKind::MissingPlate)
    }

    pub fn is_decode(&self) -> bool {
        matches!(self.kind(), LprErrorKind::DecodeError(_))
    }
}

impl<T> From<T> for LprError
where T:  Into<LprErrorKind>
{
    fn from(e: T) -> Self {
        Self(e.into())
    }
}

impl fmt::Display for LprError {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            LprErrorKind::IOError(e) => e.fmt(f),
            LprErrorKind::DecodeError(e) => write!(f, "could not decode image: {}", e),
            LprErrorKind::TransportError(e) => write!(f, "request failed: {}", e),
            LprErrorKind::Status(code) => write!(f, "failed to send image, status code: {}", code),
            LprErrorKind::JsonError(e) => write!(f, "malformed response: {}", e),
            LprErrorKind::MissingPlate => f.write_str("response has no result.license_plate_number"),
            LprErrorKind::FontError(msg) => write!(f, "font error: {}", msg),
        }
    }
}

impl Error for LprError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self.kind() {
            LprErrorKind::IOError(e) => Some(e),
            LprErrorKind::DecodeError(e) => Some(e),
            LprErrorKind::TransportError(e) => Some(e),
            LprErrorKind::JsonError(e) => Some(e),
            LprErrorKind::Status(_) | LprErrorKind::MissingPlate | LprErrorKind::FontError(_) => None,
        }
    }
}

impl From<IOError> for LprErrorKind {
    fn from(e: IOError) -> Self {
        Self::IOError(e)
    }
}

impl From<ImageError> for LprErrorKind {
    fn from(e: ImageError) -> Self {
        Self::DecodeError(e)
    }
}

impl From<HttpError> for LprErrorKind {
    fn from(e: HttpError) -> Self {
        Self::TransportError(e)
    }
}

impl From<JsonError> for LprErrorKind {
    fn from(e: JsonError) -> Self {
        Self::JsonError(e)
    }
}
