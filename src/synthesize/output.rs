use std::{fs, io, path::Path};

use crate::synthesize::ObjectImage;

/// Destination for a fully encoded object image.
///
/// The image is complete before `write` is called, so implementations never
/// observe a partially translated unit.
pub trait Output: Default {
    fn write(&self, image: &ObjectImage, out_path: impl AsRef<Path>) -> io::Result<()>;
}

/// Writes the raw byte stream: record after record, no header, no magic
/// number, no length prefix. If the write itself fails the remnant is
/// removed again, so the caller finds either a complete object file or
/// none at all.
#[derive(Default)]
pub struct RawBinary;

impl Output for RawBinary {
    fn write(&self, image: &ObjectImage, out_path: impl AsRef<Path>) -> io::Result<()> {
        let out_path = out_path.as_ref();

        let result = fs::write(out_path, &image.bytes);
        if result.is_err() {
            let _ = fs::remove_file(out_path);
        }

        result
    }
}

/// Discards the image; used by tests that only inspect the bytes.
#[derive(Default)]
pub struct DummyOutput;

impl Output for DummyOutput {
    fn write(&self, _image: &ObjectImage, _out_path: impl AsRef<Path>) -> io::Result<()> {
        Ok(())
    }
}
