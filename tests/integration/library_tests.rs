use super::fixtures::{jpeg, png, scanner, write_cbr, write_cbz, write_foo_bar};
use jomics::archive::{Archive, ArchiveError, ArchiveKind, ArchiveReader, RarReader};
use jomics::library::{open_album, read_page, read_page_at, LibraryError};
use jomics::scanner::entry_id;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_page_order_is_lexicographic() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Foo_Bar.cbz");
    let first = write_foo_bar(&path);

    let mut archive = Archive::open(&path).unwrap();
    assert_eq!(archive.kind(), ArchiveKind::Zip);
    assert_eq!(archive.image_pages(), ["001.jpg", "002.png", "003.jpg"]);
    assert_eq!(archive.extract_page(0).unwrap(), first);
    archive.close();
}

#[test]
fn test_read_page_through_index() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let path = root.path().join("Foo_Bar.cbz");
    let first = write_foo_bar(&path);
    let index = scanner(cache.path()).scan(root.path()).unwrap();

    let id = entry_id(&path);
    assert_eq!(read_page(&index, id, 0).unwrap(), first);
    assert_eq!(read_page(&index, id, 1).unwrap(), png(100));
}

#[test]
fn test_page_beyond_count_is_not_found() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let path = root.path().join("Foo_Bar.cbz");
    write_foo_bar(&path);
    let index = scanner(cache.path()).scan(root.path()).unwrap();

    let err = read_page(&index, entry_id(&path), 5).unwrap_err();
    assert!(err.is_not_found());
    match err {
        LibraryError::PageNotFound { page, count, .. } => {
            assert_eq!(page, 5);
            assert_eq!(count, 3);
        }
        other => panic!("Expected PageNotFound, got {other:?}"),
    }
}

#[test]
fn test_unknown_or_folder_id_is_album_not_found() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    write_foo_bar(&root.path().join("series/01.cbz"));
    let index = scanner(cache.path()).scan(root.path()).unwrap();

    let folder_id = entry_id(&root.path().join("series"));
    assert!(matches!(
        read_page(&index, folder_id, 0),
        Err(LibraryError::AlbumNotFound(id)) if id == folder_id
    ));
    assert!(matches!(
        read_page(&index, 0x0bad_cafe, 0),
        Err(LibraryError::AlbumNotFound(0x0bad_cafe))
    ));
}

#[test]
fn test_album_navigation() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let path = root.path().join("nav.cbz");
    write_foo_bar(&path);
    let index = scanner(cache.path()).scan(root.path()).unwrap();

    let mut album = open_album(&index, entry_id(&path)).unwrap();
    assert_eq!(album.title(), "Nav");
    assert_eq!(album.page_count(), 3);

    let view = album.view(2).unwrap();
    assert_eq!(view.number, 3);
    assert!(view.has_prev());
    assert!(!view.has_next());
    assert_eq!(view.prev, 1);

    assert!(album.view(3).is_err());
    assert_eq!(album.page(2).unwrap(), jpeg(200));
    album.close();
}

#[test]
fn test_archive_removed_after_scan() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let path = root.path().join("gone.cbz");
    write_foo_bar(&path);
    let index = scanner(cache.path()).scan(root.path()).unwrap();
    fs::remove_file(&path).unwrap();

    let err = read_page(&index, entry_id(&path), 0).unwrap_err();
    assert!(matches!(err, LibraryError::Archive(ArchiveError::NotFound(_))));
    assert!(err.is_not_found());
}

#[test]
fn test_cbr_holding_zip_data_opens() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let path = root.path().join("mislabelled.cbr");
    write_cbz(&path, &[("b.jpg", jpeg(2)), ("a.jpg", jpeg(1))]);

    let mut archive = Archive::open(&path).unwrap();
    assert_eq!(archive.kind(), ArchiveKind::Zip);
    assert_eq!(archive.extract_page(0).unwrap(), jpeg(1));
    archive.close();

    let index = scanner(cache.path()).scan(root.path()).unwrap();
    assert!(index.album(entry_id(&path)).unwrap().has_cover());
}

#[test]
fn test_rar_pages_and_entries() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Foo_Bar.cbr");
    write_cbr(
        &path,
        &[
            ("003.jpg", jpeg(200)),
            ("001.jpg", jpeg(10)),
            ("002.png", png(100)),
        ],
    );

    let reader = RarReader::open(&path).unwrap();
    assert_eq!(reader.entry_names(), ["003.jpg", "001.jpg", "002.png"]);

    let mut archive = Archive::open(&path).unwrap();
    assert_eq!(archive.kind(), ArchiveKind::Rar);
    assert_eq!(archive.image_pages(), ["001.jpg", "002.png", "003.jpg"]);
    assert_eq!(archive.extract_page(0).unwrap(), jpeg(10));
    assert_eq!(archive.extract_page(2).unwrap(), jpeg(200));
    assert!(matches!(
        archive.extract("nope.jpg"),
        Err(ArchiveError::EntryNotFound { .. })
    ));
    assert!(matches!(
        archive.extract_page(5),
        Err(ArchiveError::PageNotFound { count: 3, .. })
    ));
    archive.close();
}

#[test]
fn test_rar_album_scanned_with_cover() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let path = root.path().join("Foo_Bar.cbr");
    write_cbr(&path, &[("b.png", png(20)), ("a.jpg", jpeg(1))]);

    let index = scanner(cache.path()).scan(root.path()).unwrap();
    let album = index.album(entry_id(&path)).unwrap();
    assert_eq!(album.title, "Foo Bar");
    assert!(album.has_cover());
    assert_eq!(read_page(&index, album.id, 1).unwrap(), png(20));
}

#[test]
fn test_concurrent_page_reads() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let a = root.path().join("a.cbz");
    let b = root.path().join("b.cbz");
    let first = write_foo_bar(&a);
    write_foo_bar(&b);
    let index = scanner(cache.path()).scan(root.path()).unwrap();

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for page in 0..3 {
                    read_page(&index, entry_id(&a), page).unwrap();
                    read_page(&index, entry_id(&b), page).unwrap();
                }
                assert_eq!(read_page(&index, entry_id(&a), 0).unwrap(), first);
            });
        }
    });
}

#[test]
fn test_locate_resolves_album_without_covers() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let path = root.path().join("series/Foo_Bar.cbz");
    let first = write_foo_bar(&path);
    let scanner = scanner(cache.path());

    let id = entry_id(&path);
    let found = scanner.locate(root.path(), id).unwrap().unwrap();
    assert_eq!(found, path);
    assert_eq!(read_page_at(&found, id, 0).unwrap(), first);
    assert!(scanner.cache().keys().unwrap().is_empty());

    let folder_id = entry_id(&root.path().join("series"));
    assert_eq!(scanner.locate(root.path(), folder_id).unwrap(), None);
    assert_eq!(scanner.locate(root.path(), 7).unwrap(), None);
}

#[test]
fn test_read_page_at_beyond_count() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Foo_Bar.cbz");
    write_foo_bar(&path);

    let err = read_page_at(&path, 9, 3).unwrap_err();
    assert!(matches!(
        err,
        LibraryError::PageNotFound {
            album: 9,
            page: 3,
            count: 3
        }
    ));
}
