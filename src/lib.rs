use image::{DynamicImage, GenericImageView, ImageError};
use image::io::Reader as ImageReader;
use tracing::{info, warn};

use std::fs;
use std::path::{Path, PathBuf};

use annotate::Annotator;
use client::RecognitionClient;
use error::LprError;
use payload::RecognitionRequest;

pub mod annotate;
pub mod client;
pub mod error;
pub mod payload;
pub mod utils;


/// A decoded input image, alive for one pass through the pipeline.
pub struct ImageRecord {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub image: DynamicImage,
}

impl ImageRecord {

    /// Decode by content, not by extension. Read failures count as decode
    /// failures too.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LprError> {
        let path = path.as_ref();
        let image = ImageReader::open(path)
            .map_err(ImageError::IoError)?
            .with_guessed_format()
            .map_err(ImageError::IoError)?
            .decode()?;
        let (width, height) = image.dimensions();
        Ok(ImageRecord { path: path.to_path_buf(), width, height, image })
    }
}

#[derive(Debug)]
pub enum ImageOutcome {
    Annotated { source: PathBuf, plate: String, output: PathBuf },
    Skipped { source: PathBuf, reason: LprError },
}

impl ImageOutcome {
    pub fn source(&self) -> &Path {
        match self {
            ImageOutcome::Annotated { source, .. } | ImageOutcome::Skipped { source, .. } => source,
        }
    }

    pub fn is_annotated(&self) -> bool {
        matches!(self, ImageOutcome::Annotated { .. })
    }
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<ImageOutcome>,
}

impl BatchSummary {
    pub fn annotated(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_annotated()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.annotated()
    }
}

/// Drives load, encode, request, annotate and save for every image of a folder.
pub struct Lpr<C> {
    client: C,
    annotator: Annotator,
    output_dir: PathBuf,
}

impl<C: RecognitionClient> Lpr<C> {

    pub fn new(client: C, annotator: Annotator, output_dir: impl AsRef<Path>) -> Self {
        Lpr { client, annotator, output_dir: output_dir.as_ref().to_path_buf() }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Process every entry of `input_dir` one after another.
    /// Only listing the folder or creating the output directory can fail the batch.
    pub fn run(&self, input_dir: impl AsRef<Path>) -> Result<BatchSummary, LprError> {
        let entries = utils::list_entries(input_dir)?;
        fs::create_dir_all(&self.output_dir)?;

        let mut summary = BatchSummary::default();
        for path in entries {
            summary.outcomes.push(self.process(&path));
        }
        info!("total: {}, annotated: {}, skipped: {}",
            summary.outcomes.len(), summary.annotated(), summary.skipped());
        Ok(summary)
    }

    /// One image; never fails, a failure becomes `Skipped`.
    pub fn process(&self, path: &Path) -> ImageOutcome {
        match self.try_process(path) {
            Ok((plate, output)) => {
                info!("saved image with license plate text at: {}", output.display());
                ImageOutcome::Annotated { source: path.to_path_buf(), plate, output }
            }
            Err(reason) => {
                warn!("skipping {}: {}", path.display(), reason);
                ImageOutcome::Skipped { source: path.to_path_buf(), reason }
            }
        }
    }

    fn try_process(&self, path: &Path) -> Result<(String, PathBuf), LprError> {
        let record = ImageRecord::open(path)?;
        let request = RecognitionRequest::from_file(&record.path, record.width, record.height)?;

        info!("processing {} ({}x{})", path.display(), record.width, record.height);
        let response = self.client.submit(&request)?;
        let plate = response.plate().to_string();

        let annotated = self.annotator.annotate(&record.image, &plate);
        let output = utils::output_path(&self.output_dir, &plate);
        // jpeg has no alpha channel
        DynamicImage::ImageRgb8(annotated.to_rgb8()).save(&output)?;
        Ok((plate, output))
    }
}


#[cfg(test)]
mod test {
    use image::{DynamicImage, GenericImageView, ImageBuffer, Rgb};

    use std::cell::RefCell;
    use std::error::Error;
    use std::fs;
    use std::path::Path;

    use crate::annotate::{Annotator, PlateFont};
    use crate::client::{RecognitionClient, RecognitionResponse};
    use crate::error::{LprError, LprErrorKind};
    use crate::payload::RecognitionRequest;
    use super::{ImageOutcome, ImageRecord, Lpr};

    /// replies with a fixed body, or a fixed status when `body` is `None`
    struct FixedClient {
        body: Option<&'static str>,
        status: u16,
        seen: RefCell<Vec<RecognitionRequest>>,
    }

    impl FixedClient {
        fn ok(body: &'static str) -> Self {
            FixedClient { body: Some(body), status: 200, seen: RefCell::new(Vec::new()) }
        }

        fn failing(status: u16) -> Self {
            FixedClient { body: None, status, seen: RefCell::new(Vec::new()) }
        }
    }

    impl RecognitionClient for FixedClient {
        fn submit(&self, request: &RecognitionRequest) -> Result<RecognitionResponse, LprError> {
            self.seen.borrow_mut().push(request.clone());
            match self.body {
                Some(body) => RecognitionResponse::from_body(body),
                None => Err(LprErrorKind::Status(self.status).into()),
            }
        }
    }

    fn write_car(path: &Path, width: u32, height: u32) -> Result<(), Box<dyn Error>> {
        let img = ImageBuffer::from_fn(width, height, |x, y| Rgb([(x % 200) as u8, (y % 200) as u8, 40]));
        img.save(path)?;
        Ok(())
    }

    #[test]
    fn record_has_dimensions() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("car");
        // no extension, the format is sniffed from the content
        let img = DynamicImage::ImageRgb8(ImageBuffer::new(32, 24));
        img.save_with_format(&path, image::ImageFormat::Png)?;
        let record = ImageRecord::open(&path)?;
        assert_eq!((record.width, record.height), (32, 24));
        assert_eq!(record.path, path);
        Ok(())
    }

    #[test]
    fn unreadable_file_is_decode_error() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("broken.jpg");
        fs::write(&path, b"\xff\xd8 definitely not a jpeg")?;
        let err = ImageRecord::open(&path).err().ok_or("garbage decoded")?;
        assert!(err.is_decode());
        let err = ImageRecord::open(dir.path().join("missing.png")).err().ok_or("missing file decoded")?;
        assert!(err.is_decode());
        Ok(())
    }

    #[test]
    fn one_good_one_broken() -> Result<(), Box<dyn Error>> {
        let input = tempfile::tempdir()?;
        let output = tempfile::tempdir()?;
        write_car(&input.path().join("a_car.png"), 64, 48)?;
        fs::write(input.path().join("b_broken.jpg"), b"corrupt")?;

        let client = FixedClient::ok(r#"{"result":{"license_plate_number":"AB123CD"}}"#);
        let lpr = Lpr::new(client, Annotator::new(PlateFont::Bitmap), output.path().join("annotated"));
        let summary = lpr.run(input.path())?;

        assert_eq!(summary.annotated(), 1);
        assert_eq!(summary.skipped(), 1);
        match &summary.outcomes[0] {
            ImageOutcome::Annotated { plate, output, .. } => {
                assert_eq!(plate, "AB123CD");
                assert_eq!(output.file_name().and_then(|n| n.to_str()), Some("vehicle_with_AB123CD.jpg"));
                let saved = image::open(output)?;
                assert_eq!(saved.dimensions(), (64, 48));
            }
            other => return Err(format!("unexpected outcome {:?}", other).into()),
        }
        match &summary.outcomes[1] {
            ImageOutcome::Skipped { reason, .. } => assert!(reason.is_decode()),
            other => return Err(format!("unexpected outcome {:?}", other).into()),
        }

        // the broken file never reached the service
        let seen = lpr.client.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].bbox, [0, 0, 64, 48]);
        assert_eq!(seen[0].image_bright, seen[0].image_dark);
        Ok(())
    }

    #[test]
    fn failed_request_skips_and_continues() -> Result<(), Box<dyn Error>> {
        let input = tempfile::tempdir()?;
        let output = tempfile::tempdir()?;
        write_car(&input.path().join("one.png"), 20, 10)?;
        write_car(&input.path().join("two.png"), 30, 15)?;

        let lpr = Lpr::new(FixedClient::failing(500), Annotator::new(PlateFont::Bitmap), output.path());
        let summary = lpr.run(input.path())?;

        assert_eq!(summary.annotated(), 0);
        assert_eq!(summary.skipped(), 2);
        assert_eq!(lpr.client.seen.borrow().len(), 2);
        assert!(summary.outcomes.iter().all(|o| match o {
            ImageOutcome::Skipped { reason, .. } => reason.is_transport(),
            _ => false,
        }));
        assert_eq!(fs::read_dir(output.path())?.count(), 0);
        Ok(())
    }

    #[test]
    fn missing_plate_is_skipped() -> Result<(), Box<dyn Error>> {
        let input = tempfile::tempdir()?;
        let output = tempfile::tempdir()?;
        write_car(&input.path().join("car.png"), 20, 10)?;

        let lpr = Lpr::new(FixedClient::ok(r#"{"result":{}}"#), Annotator::new(PlateFont::Bitmap), output.path());
        let outcome = lpr.process(&input.path().join("car.png"));
        assert!(!outcome.is_annotated());
        assert_eq!(outcome.source(), input.path().join("car.png"));
        Ok(())
    }

    #[test]
    fn missing_input_folder_fails_the_batch() -> Result<(), Box<dyn Error>> {
        let output = tempfile::tempdir()?;
        let lpr = Lpr::new(FixedClient::failing(500), Annotator::new(PlateFont::Bitmap), output.path());
        assert!(lpr.run(output.path().join("nope")).is_err());
        Ok(())
    }
}
