//! Integration tests for the on-disk library index.

use std::fs::{self, File, FileTimes};
use std::path::Path;
use std::time::{Duration, SystemTime};

use alexandria_core::library::book_dir;
use alexandria_core::{CatalogRecord, LocalLibrary};
use tempfile::TempDir;

fn shelve(root: &Path, record: &CatalogRecord, filename: &str, accessed: SystemTime) {
    let dir = book_dir(root, record);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("data.json"), serde_json::to_vec_pretty(record).unwrap()).unwrap();
    let book = dir.join(filename);
    fs::write(&book, b"book bytes").unwrap();
    File::options()
        .write(true)
        .open(&book)
        .unwrap()
        .set_times(FileTimes::new().set_accessed(accessed).set_modified(accessed))
        .unwrap();
}

fn days_ago(days: u64) -> SystemTime {
    SystemTime::now() - Duration::from_secs(days * 86_400)
}

#[tokio::test]
async fn test_list_books_returns_shelved_records_most_recent_first() {
    let root = TempDir::new().unwrap();
    let dune = CatalogRecord::new("vol-dune", "Dune").with_author("Frank Herbert");
    let messiah = CatalogRecord::new("vol-messiah", "Dune Messiah").with_author("Frank Herbert");
    let children = CatalogRecord::new("vol-children", "Children of Dune");
    shelve(root.path(), &dune, "Dune.epub", days_ago(10));
    shelve(root.path(), &messiah, "Messiah.pdf", days_ago(1));
    shelve(root.path(), &children, "Children.EPUB", days_ago(5));

    let books = LocalLibrary::new(root.path()).list_books().await;

    let ids: Vec<&str> = books.iter().map(|b| b.metadata.id.as_str()).collect();
    assert_eq!(ids, vec!["vol-messiah", "vol-children", "vol-dune"]);
    assert_eq!(books[0].metadata, messiah);
    assert_eq!(
        books[0].file_path,
        root.path().join("Dune Messiah - Frank Herbert").join("Messiah.pdf")
    );
    assert_eq!(books[1].file_path.parent().unwrap(), root.path().join("Children of Dune"));
}

#[tokio::test]
async fn test_directory_without_sidecar_or_book_is_skipped() {
    let root = TempDir::new().unwrap();
    let dune = CatalogRecord::new("vol-dune", "Dune").with_author("Frank Herbert");
    shelve(root.path(), &dune, "Dune.epub", days_ago(1));

    let no_sidecar = root.path().join("Loose Book");
    fs::create_dir_all(&no_sidecar).unwrap();
    fs::write(no_sidecar.join("loose.pdf"), b"pdf").unwrap();

    let no_book = root.path().join("Only Metadata");
    fs::create_dir_all(&no_book).unwrap();
    fs::write(
        no_book.join("data.json"),
        serde_json::to_vec(&CatalogRecord::new("x", "Only Metadata")).unwrap(),
    )
    .unwrap();
    fs::write(no_book.join("notes.txt"), b"mobi is not shelved").unwrap();

    fs::write(root.path().join("stray.epub"), b"not in a directory").unwrap();

    let books = LocalLibrary::new(root.path()).list_books().await;
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].metadata.id, "vol-dune");
}

#[tokio::test]
async fn test_malformed_sidecar_is_skipped() {
    let root = TempDir::new().unwrap();
    let dune = CatalogRecord::new("vol-dune", "Dune");
    shelve(root.path(), &dune, "Dune.epub", days_ago(1));

    let broken = root.path().join("Broken");
    fs::create_dir_all(&broken).unwrap();
    fs::write(broken.join("data.json"), b"{ not json").unwrap();
    fs::write(broken.join("broken.pdf"), b"pdf").unwrap();

    let books = LocalLibrary::new(root.path()).list_books().await;
    let ids: Vec<&str> = books.iter().map(|b| b.metadata.id.as_str()).collect();
    assert_eq!(ids, vec!["vol-dune"]);
}

#[tokio::test]
async fn test_missing_root_is_empty_library() {
    let root = TempDir::new().unwrap();
    let library = LocalLibrary::new(root.path().join("never-created"));
    assert!(library.list_books().await.is_empty());
    assert!(!library.root().exists(), "listing must not create the root");
}

#[tokio::test]
async fn test_sidecar_preserves_unknown_catalog_fields() {
    let root = TempDir::new().unwrap();
    let raw = serde_json::json!({
        "id": "vol-dune",
        "kind": "books#volume",
        "volumeInfo": {
            "title": "Dune",
            "authors": ["Frank Herbert"],
            "pageCount": 412
        }
    });
    let record: CatalogRecord = serde_json::from_value(raw.clone()).unwrap();
    shelve(root.path(), &record, "Dune.epub", days_ago(1));

    let books = LocalLibrary::new(root.path()).list_books().await;
    assert_eq!(books.len(), 1);
    assert_eq!(serde_json::to_value(&books[0].metadata).unwrap(), raw);
}
