use std::io::Cursor;
use std::sync::mpsc;

use image::{ImageFormat, RgbaImage};

use super::{HistoryError, HistoryResult};

/// PNG bytes of a composited bitmap, in natural orientation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSnapshot {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

impl EncodedSnapshot {
    pub fn encode(bitmap: &RgbaImage) -> HistoryResult<Self> {
        let mut bytes = Vec::new();
        bitmap
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(HistoryError::Encode)?;
        Ok(Self {
            bytes,
            width: bitmap.width(),
            height: bitmap.height(),
        })
    }

    #[cfg(test)]
    pub(crate) fn from_png_bytes(bytes: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            bytes,
            width,
            height,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn decode(&self) -> HistoryResult<RgbaImage> {
        let decoded = image::load_from_memory_with_format(&self.bytes, ImageFormat::Png)
            .map_err(HistoryError::Decode)?;
        Ok(decoded.to_rgba8())
    }
}

/// Snapshot being encoded on a worker thread.
#[derive(Debug)]
pub struct PendingSnapshot {
    rx: mpsc::Receiver<HistoryResult<EncodedSnapshot>>,
}

impl PendingSnapshot {
    pub fn spawn(bitmap: RgbaImage) -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let result = EncodedSnapshot::encode(&bitmap);
            let _ = tx.send(result);
        });
        Self { rx }
    }

    /// Blocks until the worker has finished encoding.
    pub fn wait(self) -> HistoryResult<EncodedSnapshot> {
        self.rx
            .recv()
            .map_err(|_| HistoryError::WorkerDisconnected)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn worker_snapshot_decodes_to_the_same_pixels() {
        let mut bitmap = RgbaImage::from_pixel(7, 3, Rgba([1, 2, 3, 255]));
        bitmap.put_pixel(6, 2, Rgba([200, 100, 50, 128]));

        let snapshot = PendingSnapshot::spawn(bitmap.clone())
            .wait()
            .expect("worker should encode the snapshot");
        assert_eq!(snapshot.dimensions(), (7, 3));
        assert!(snapshot.bytes().starts_with(b"\x89PNG"));
        assert_eq!(snapshot.decode().expect("snapshot should decode"), bitmap);
    }

    #[test]
    fn corrupt_snapshot_reports_decode_error() {
        let snapshot = EncodedSnapshot {
            bytes: vec![0, 1, 2, 3],
            width: 1,
            height: 1,
        };
        assert!(matches!(snapshot.decode(), Err(HistoryError::Decode(_))));
    }
}
