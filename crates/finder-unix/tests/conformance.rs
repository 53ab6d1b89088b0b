//! Drives every `FileProvider` operation through a trait object.
#![cfg(unix)]

use finder_platform::filesystem::{FileProvider, FileType};
use finder_unix::UnixFileProvider;

fn provider() -> Box<dyn FileProvider> {
    Box::new(UnixFileProvider::new())
}

#[tokio::test]
async fn readme_and_data_scenario() {
    let tmp = tempfile::tempdir().unwrap();
    let x = tmp.path().join("x");
    let fs = provider();

    fs.make_dir(x.to_str().unwrap(), None).await.unwrap();
    fs.write_file(x.join("readme.txt").to_str().unwrap(), b"ten bytes!", None)
        .await
        .unwrap();
    fs.make_dir(x.join("data").to_str().unwrap(), None).await.unwrap();

    let stat = fs.stat(x.to_str().unwrap()).await.unwrap();
    assert_eq!(stat.entry.kind, FileType::Directory);
    assert_eq!(stat.file_count, Some(1));
    assert_eq!(stat.directory_count, Some(1));

    let hits = fs.list_file(x.to_str().unwrap(), Some("read")).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "readme.txt");
    assert_eq!(hits[0].size, 10);

    let json = serde_json::to_value(&stat).unwrap();
    assert_eq!(json["type"], "directory");
    assert_eq!(json["file_count"], 1);
    assert_eq!(json["directory_count"], 1);
}

#[tokio::test]
async fn keyword_listing_is_a_subset() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().to_str().unwrap().to_string();
    let fs = provider();
    for name in ["alpha.rs", "beta.rs", "alphabet.txt", "gamma"] {
        fs.write_file(&format!("{}/{}", dir, name), name.as_bytes(), None)
            .await
            .unwrap();
    }

    let all = fs.list_file(&dir, None).await.unwrap();
    let filtered = fs.list_file(&dir, Some("alpha")).await.unwrap();
    assert_eq!(filtered.len(), 2);
    for entry in &filtered {
        assert!(entry.name.contains("alpha"));
        assert!(all.iter().any(|e| e.path == entry.path));
    }
}

#[tokio::test]
async fn full_lifecycle() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let at = |rel: &str| root.join(rel).to_string_lossy().to_string();
    let fs = provider();

    fs.make_dir(&at("a/b/c"), Some(0o755)).await.unwrap();
    fs.make_dir(&at("a/b/c"), None).await.unwrap();
    assert!(fs.exists(&at("a/b/c")));

    fs.write_file(&at("a/b/c/file.txt"), b"payload", Some(0o644)).await.unwrap();
    assert_eq!(fs.read_file(&at("a/b/c/file.txt")).await.unwrap().as_ref(), b"payload");

    fs.copy(&at("a"), &at("copy")).await.unwrap();
    assert_eq!(fs.read_file(&at("copy/b/c/file.txt")).await.unwrap().as_ref(), b"payload");

    fs.move_entry(&at("copy"), &at("moved")).await.unwrap();
    assert!(!fs.exists(&at("copy")));
    fs.rename(&at("moved/b/c/file.txt"), &at("moved/b/c/renamed.txt"))
        .await
        .unwrap();

    fs.chmod(&at("moved/b/c/renamed.txt"), 0o600).await.unwrap();
    let stat = fs.stat(&at("moved/b/c/renamed.txt")).await.unwrap();
    assert_eq!(stat.entry.unix_mode_stat, "-rw-------");
    assert_eq!(stat.entry.unix_mode_octal, "600");
    assert_eq!(stat.entry.ext.as_deref(), Some("txt"));

    fs.remove(&at("moved")).await.unwrap();
    assert!(fs.stat(&at("moved")).await.unwrap_err().is_not_found());
    fs.remove(&at("moved")).await.unwrap();

    fs.remove(&at("a")).await.unwrap();
    assert!(fs.list_file(&at(""), None).await.unwrap().is_empty());
}
