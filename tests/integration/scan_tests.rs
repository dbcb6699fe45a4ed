use super::fixtures::{comic_info, jpeg, scanner, write_cbz, write_foo_bar, THUMB_HEIGHT};
use jomics::index::ItemKind;
use jomics::progress::ProgressCallback;
use jomics::scanner::{entry_id, ScanError};
use jomics::thumbnail::FOLDER_COVER_ID;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn test_scan_foo_bar_scenario() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let path = root.path().join("Foo_Bar.cbz");
    write_foo_bar(&path);

    let index = scanner(cache.path()).scan(root.path()).unwrap();

    let album = index.album(entry_id(&path)).unwrap();
    assert_eq!(album.title, "Foo Bar");
    assert_eq!(album.page_count, 3);
    assert!(!album.is_container);

    let cover = album.cover.as_ref().unwrap();
    assert_eq!(image::guess_format(cover).unwrap(), image::ImageFormat::Jpeg);
    let decoded = image::load_from_memory(cover).unwrap();
    assert_eq!(decoded.height(), THUMB_HEIGHT);
    assert_eq!(decoded.width(), 24);
}

#[test]
fn test_scan_uses_comic_info_title() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let path = root.path().join("sample_012.cbz");
    write_cbz(
        &path,
        &[
            ("ComicInfo.xml", comic_info("Sample", "", "12", "1999")),
            ("p1.jpg", jpeg(1)),
        ],
    );

    let index = scanner(cache.path()).scan(root.path()).unwrap();
    let album = index.album(entry_id(&path)).unwrap();
    assert_eq!(album.title, "Sample 12 (1999)");
    assert_eq!(album.page_count, 1);
}

#[test]
fn test_scan_empty_comic_info_falls_back_to_file_name() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let path = root.path().join("plain_name.cbz");
    write_cbz(
        &path,
        &[
            ("comicinfo.xml", comic_info("", "", "", "")),
            ("p1.jpg", jpeg(1)),
        ],
    );

    let index = scanner(cache.path()).scan(root.path()).unwrap();
    assert_eq!(index.album(entry_id(&path)).unwrap().title, "Plain Name");
}

#[test]
fn test_broken_archive_is_listed_without_cover() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let broken = root.path().join("broken_one.cbz");
    fs::write(&broken, b"this is not a zip file").unwrap();
    let good = root.path().join("good.cbz");
    write_foo_bar(&good);

    let index = scanner(cache.path()).scan(root.path()).unwrap();

    let entry = index.album(entry_id(&broken)).unwrap();
    assert_eq!(entry.title, "Broken One");
    assert!(!entry.has_cover());
    assert_eq!(entry.page_count, 0);
    assert_eq!(index.cover(entry.id), None);

    assert!(index.album(entry_id(&good)).unwrap().has_cover());
}

#[test]
fn test_archive_without_images() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let path = root.path().join("text_only.cbz");
    write_cbz(&path, &[("readme.txt", b"hello".to_vec())]);

    let index = scanner(cache.path()).scan(root.path()).unwrap();
    let album = index.album(entry_id(&path)).unwrap();
    assert_eq!(album.page_count, 0);
    assert!(!album.has_cover());
}

#[test]
fn test_undecodable_first_page_skips_cover() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let path = root.path().join("bad_image.cbz");
    write_cbz(
        &path,
        &[("01.jpg", b"garbage".to_vec()), ("02.jpg", jpeg(5))],
    );

    let index = scanner(cache.path()).scan(root.path()).unwrap();
    let album = index.album(entry_id(&path)).unwrap();
    assert_eq!(album.page_count, 2);
    assert!(!album.has_cover());
}

#[test]
fn test_nested_folders_and_listing_order() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    write_foo_bar(&root.path().join("b.cbz"));
    write_foo_bar(&root.path().join("a_series/02.cbz"));
    write_foo_bar(&root.path().join("a_series/01.cbz"));
    fs::write(root.path().join("notes.txt"), b"ignored").unwrap();

    let index = scanner(cache.path()).scan(root.path()).unwrap();
    assert_eq!(index.len(), 4);

    let top = index.listing(None);
    let titles: Vec<&str> = top.items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["A Series", "B"]);
    assert_eq!(top.items[0].kind, ItemKind::Folder);
    assert_eq!(top.items[0].cover_id, FOLDER_COVER_ID);

    let series_id = entry_id(&root.path().join("a_series"));
    let series = index.listing(Some(series_id));
    let titles: Vec<&str> = series.items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["01", "02"]);
}

#[test]
fn test_folder_cover_generated_once() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    fs::create_dir(root.path().join("series")).unwrap();

    let scanner = scanner(cache.path());
    let index = scanner.scan(root.path()).unwrap();
    let cover = index.folder_cover().unwrap().to_vec();
    assert_eq!(image::guess_format(&cover).unwrap(), image::ImageFormat::Png);

    let key = scanner.cache().key(FOLDER_COVER_ID);
    assert_eq!(scanner.cache().get(key).unwrap(), cover);
    assert_eq!(index.cover(entry_id(&root.path().join("series"))), Some(&cover[..]));
}

#[test]
fn test_cached_cover_is_reused() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let path = root.path().join("reuse.cbz");
    write_foo_bar(&path);

    let scanner = scanner(cache.path());
    scanner.scan(root.path()).unwrap();

    let key = scanner.cache().key(entry_id(&path));
    scanner.cache().put(key, b"marker").unwrap();

    let index = scanner.scan(root.path()).unwrap();
    assert_eq!(index.cover(entry_id(&path)), Some(&b"marker"[..]));
}

#[test]
fn test_rescan_of_unchanged_tree_is_identical() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    write_foo_bar(&root.path().join("x.cbz"));
    write_foo_bar(&root.path().join("d/y.cbz"));
    write_foo_bar(&root.path().join("d/e/z.cbz"));

    let scanner = scanner(cache.path());
    let first = scanner.scan(root.path()).unwrap();
    let second = scanner.scan(root.path()).unwrap();

    assert_eq!(first.ids(), second.ids());
    for id in first.directory_ids() {
        let a: Vec<u32> = first.listing(Some(id)).items.iter().map(|i| i.id).collect();
        let b: Vec<u32> = second.listing(Some(id)).items.iter().map(|i| i.id).collect();
        assert_eq!(a, b);
    }
    assert_eq!(first.listing(None), second.listing(None));
}

#[test]
fn test_trailing_separator_in_root() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let path = root.path().join("slash.cbz");
    write_foo_bar(&path);

    let with_slash = format!("{}/", root.path().display());
    let index = scanner(cache.path())
        .scan(std::path::Path::new(&with_slash))
        .unwrap();

    assert_eq!(index.root(), root.path());
    assert_eq!(index.listing(None).items.len(), 1);
    assert!(index.album(entry_id(&path)).is_some());
}

#[test]
fn test_scan_root_errors() {
    let cache = tempdir().unwrap();
    let dir = tempdir().unwrap();
    let file = dir.path().join("file.cbz");
    write_foo_bar(&file);

    let scanner = scanner(cache.path());
    assert!(matches!(
        scanner.scan(&dir.path().join("missing")),
        Err(ScanError::NotFound(_))
    ));
    assert!(matches!(scanner.scan(&file), Err(ScanError::NotADirectory(_))));
}

#[derive(Default)]
struct CountingProgress {
    total: AtomicUsize,
    seen: AtomicUsize,
    ended: AtomicUsize,
}

impl ProgressCallback for CountingProgress {
    fn on_phase_start(&self, _phase: &str, total: usize) {
        self.total.store(total, Ordering::SeqCst);
    }

    fn on_progress(&self, _current: usize, _path: &str) {
        self.seen.fetch_add(1, Ordering::SeqCst);
    }

    fn on_phase_end(&self, _phase: &str) {
        self.ended.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_progress_reports_every_archive() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    for name in ["a.cbz", "b.cbz", "sub/c.cbz"] {
        write_foo_bar(&root.path().join(name));
    }

    let progress = Arc::new(CountingProgress::default());
    let scanner = scanner(cache.path()).with_progress(progress.clone());
    scanner.scan(root.path()).unwrap();

    assert_eq!(progress.total.load(Ordering::SeqCst), 3);
    assert_eq!(progress.seen.load(Ordering::SeqCst), 3);
    assert_eq!(progress.ended.load(Ordering::SeqCst), 1);
}
