//! Archive and image builders shared by the integration tests.
#![allow(dead_code)]

use image::{ImageFormat, Rgb, RgbImage};
use jomics::scanner::{CollectionScanner, ScannerConfig};
use jomics::thumbnail::ThumbnailCache;
use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const THUMB_HEIGHT: u32 = 32;

/// A solid-color image encoded in `format`.
pub fn image_bytes(width: u32, height: u32, shade: u8, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([shade, 255 - shade, 64]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

pub fn jpeg(shade: u8) -> Vec<u8> {
    image_bytes(48, 64, shade, ImageFormat::Jpeg)
}

pub fn png(shade: u8) -> Vec<u8> {
    image_bytes(48, 64, shade, ImageFormat::Png)
}

/// Write a zip archive containing `entries` in the given order.
pub fn write_cbz(path: &Path, entries: &[(&str, Vec<u8>)]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default();
    for (name, data) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}

/// Write a rar (v4) archive holding `entries` uncompressed, in the given order.
pub fn write_cbr(path: &Path, entries: &[(&str, Vec<u8>)]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut out = b"Rar!\x1a\x07\x00".to_vec();
    rar_block(&mut out, 0x73, 0x0000, &[0; 6]);
    for (name, data) in entries {
        let size = u32::try_from(data.len()).unwrap();
        let mut fields = Vec::new();
        fields.extend_from_slice(&size.to_le_bytes()); // packed
        fields.extend_from_slice(&size.to_le_bytes()); // unpacked
        fields.push(0); // host: MS-DOS
        fields.extend_from_slice(&crc32fast::hash(data).to_le_bytes());
        fields.extend_from_slice(&0x5021_0000u32.to_le_bytes()); // 2020-01-01 00:00
        fields.push(29); // version needed to extract
        fields.push(0x30); // store
        fields.extend_from_slice(&u16::try_from(name.len()).unwrap().to_le_bytes());
        fields.extend_from_slice(&0x20u32.to_le_bytes());
        fields.extend_from_slice(name.as_bytes());
        rar_block(&mut out, 0x74, 0x8000, &fields);
        out.extend_from_slice(data);
    }
    rar_block(&mut out, 0x7b, 0x4000, &[]);
    fs::write(path, out).unwrap();
}

/// Append one rar v4 header block; the checksum covers everything after it.
fn rar_block(out: &mut Vec<u8>, kind: u8, flags: u16, fields: &[u8]) {
    let mut header = vec![kind];
    header.extend_from_slice(&flags.to_le_bytes());
    header.extend_from_slice(&u16::try_from(7 + fields.len()).unwrap().to_le_bytes());
    header.extend_from_slice(fields);
    let crc = crc32fast::hash(&header) as u16;
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&header);
}

/// A three-page archive with entries stored out of order.
pub fn write_foo_bar(path: &Path) -> Vec<u8> {
    let first = jpeg(10);
    write_cbz(
        path,
        &[
            ("003.jpg", jpeg(200)),
            ("001.jpg", first.clone()),
            ("002.png", png(100)),
        ],
    );
    first
}

pub fn comic_info(series: &str, title: &str, number: &str, year: &str) -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<ComicInfo>
  <Title>{title}</Title>
  <Series>{series}</Series>
  <Number>{number}</Number>
  <Year>{year}</Year>
  <Pages>
    <Page Image="0" Type="FrontCover" />
  </Pages>
</ComicInfo>"#
    )
    .into_bytes()
}

pub fn scanner(cache_dir: &Path) -> CollectionScanner {
    let cache = ThumbnailCache::new(cache_dir, THUMB_HEIGHT).unwrap();
    CollectionScanner::new(ScannerConfig::default(), cache)
}
