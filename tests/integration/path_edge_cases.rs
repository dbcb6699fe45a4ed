use super::fixtures::{scanner, write_foo_bar};
use jomics::library::read_page;
use jomics::scanner::entry_id;
use std::fs;
use tempfile::tempdir;
use unicode_normalization::UnicodeNormalization;

#[test]
fn test_unicode_nfd_names_share_nfc_id() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();

    // "café" in NFD
    let name_nfd = "cafe\u{0301}_stories.cbz";
    let name_nfc: String = name_nfd.nfc().collect();
    assert_ne!(name_nfd, name_nfc);

    let path_nfd = root.path().join(name_nfd);
    write_foo_bar(&path_nfd);

    let index = scanner(cache.path()).scan(root.path()).unwrap();
    let id = entry_id(&root.path().join(&name_nfc));
    let album = index.album(id).unwrap();
    assert_eq!(album.title, "Café Stories");
    assert!(read_page(&index, id, 0).is_ok());
}

#[test]
fn test_names_with_spaces_and_punctuation() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let names = ["x-men #1 (1991).cbz", "a b.cbz", "it's_here.cbz"];
    for name in names {
        write_foo_bar(&root.path().join(name));
    }

    let index = scanner(cache.path()).scan(root.path()).unwrap();
    let titles: Vec<String> = index
        .listing(None)
        .items
        .into_iter()
        .map(|i| i.title)
        .collect();
    assert_eq!(titles, vec!["A B", "It'S Here", "X-Men #1 (1991)"]);
}

#[test]
fn test_directory_with_dots_keeps_full_name() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    write_foo_bar(&root.path().join("vol.2/issue.cbz"));

    let index = scanner(cache.path()).scan(root.path()).unwrap();
    let folder = &index.listing(None).items[0];
    assert_eq!(folder.title, "Vol.2");
}

#[test]
fn test_uppercase_extensions_indexed() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let path = root.path().join("LOUD.CBZ");
    write_foo_bar(&path);
    fs::write(root.path().join("cover.jpg"), b"not indexed").unwrap();

    let index = scanner(cache.path()).scan(root.path()).unwrap();
    assert_eq!(index.len(), 1);
    assert_eq!(index.album(entry_id(&path)).unwrap().title, "LOUD");
}

#[cfg(unix)]
#[test]
fn test_symlinked_archive_not_followed_by_default() {
    let root = tempdir().unwrap();
    let other = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let target = other.path().join("real.cbz");
    write_foo_bar(&target);
    std::os::unix::fs::symlink(other.path(), root.path().join("linked")).unwrap();

    let index = scanner(cache.path()).scan(root.path()).unwrap();
    assert!(index.album(entry_id(&root.path().join("linked/real.cbz"))).is_none());
}

#[cfg(target_os = "linux")]
#[test]
fn test_names_differing_only_in_normalization_collide() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let nfd = root.path().join("cafe\u{0301}.cbz");
    let nfc = root.path().join("caf\u{e9}.cbz");
    write_foo_bar(&nfd);
    write_foo_bar(&nfc);

    let index = scanner(cache.path()).scan(root.path()).unwrap();
    assert_eq!(entry_id(&nfd), entry_id(&nfc));
    assert_eq!(index.collisions(), 1);
    // "e" sorts before the two-byte "é", so the decomposed name keeps the id
    assert_eq!(index.album(entry_id(&nfc)).unwrap().path, nfd);
}
