use super::*;

fn sample() -> Vfs {
    let mut vfs = Vfs::new();
    vfs.mkdir("/home", "root").unwrap();
    vfs.mkdir("/home/user", "user").unwrap();
    vfs.write("/home/user/readme.txt", b"hello", "user").unwrap();
    vfs
}

#[test]
fn test_mkdir() {
    let mut vfs = Vfs::new();

    vfs.mkdir("/home", "root").unwrap();
    assert!(vfs.is_dir("/home"));

    // Should fail - already exists
    assert_eq!(vfs.mkdir("/home", "root"), Err(VfsError::AlreadyExists));
    assert_eq!(vfs.mkdir("/", "root"), Err(VfsError::AlreadyExists));
}

#[test]
fn test_mkdir_does_not_create_parents() {
    let mut vfs = Vfs::new();
    assert_eq!(vfs.mkdir("/a/b", "root"), Err(VfsError::PathNotFound));
    assert!(!vfs.exists("/a"));
}

#[test]
fn test_mkdir_all() {
    let mut vfs = sample();
    vfs.mkdir_all("/home/user/docs/2024/jan", "user").unwrap();
    assert!(vfs.is_dir("/home/user/docs/2024/jan"));

    // Existing prefix is fine, a file in the way is not
    vfs.mkdir_all("/home/user/docs", "user").unwrap();
    assert_eq!(
        vfs.mkdir_all("/home/user/readme.txt/sub", "user"),
        Err(VfsError::NotADirectory)
    );
}

#[test]
fn test_write_read_file() {
    let mut vfs = sample();
    vfs.write("/home/user/a.txt", b"Hello, World!", "user").unwrap();
    assert_eq!(vfs.read("/home/user/a.txt").unwrap(), b"Hello, World!");

    vfs.write("/home/user/a.txt", b"again", "root").unwrap();
    assert_eq!(vfs.read_to_string("/home/user/a.txt").unwrap(), "again");
    // Overwrite keeps the original owner
    assert_eq!(vfs.stat("/home/user/a.txt").unwrap().owner, "user");
}

#[test]
fn test_write_errors() {
    let mut vfs = sample();
    assert_eq!(
        vfs.write("/home/user", b"x", "user"),
        Err(VfsError::IsADirectory)
    );
    assert_eq!(
        vfs.write("/missing/file", b"x", "user"),
        Err(VfsError::PathNotFound)
    );
    assert_eq!(
        vfs.write("/home/user/readme.txt/inner", b"x", "user"),
        Err(VfsError::NotADirectory)
    );
    assert!(matches!(
        vfs.write("home/relative", b"x", "user"),
        Err(VfsError::InvalidPath(_))
    ));
}

#[test]
fn test_append_and_touch() {
    let mut vfs = sample();
    vfs.append("/home/user/readme.txt", b" world", "user").unwrap();
    assert_eq!(vfs.read("/home/user/readme.txt").unwrap(), b"hello world");

    vfs.touch("/home/user/readme.txt", "user").unwrap();
    assert_eq!(vfs.read("/home/user/readme.txt").unwrap(), b"hello world");

    vfs.touch("/home/user/empty", "user").unwrap();
    assert_eq!(vfs.read("/home/user/empty").unwrap(), b"");
}

#[test]
fn test_list_insertion_order() {
    let mut vfs = sample();
    vfs.write("/home/user/zeta", b"", "user").unwrap();
    vfs.mkdir("/home/user/alpha", "user").unwrap();

    let names: Vec<String> = vfs
        .list("/home/user")
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["readme.txt", "zeta", "alpha"]);

    assert_eq!(
        vfs.list("/home/user/readme.txt"),
        Err(VfsError::NotADirectory)
    );
}

#[test]
fn test_dot_segments() {
    let vfs = sample();
    assert_eq!(
        vfs.canonicalize("/home/./user/../user/readme.txt").unwrap(),
        "/home/user/readme.txt"
    );
    assert_eq!(vfs.canonicalize("/..").unwrap(), "/");

    // A missing intermediate is an error even if `..` would skip it
    assert_eq!(
        vfs.canonicalize("/home/ghost/../user"),
        Err(VfsError::PathNotFound)
    );
}

#[test]
fn test_remove() {
    let mut vfs = sample();

    // Can't remove non-empty directory
    assert_eq!(vfs.remove("/home/user", false), Err(VfsError::NotEmpty));

    vfs.remove("/home/user/readme.txt", false).unwrap();
    vfs.remove("/home/user", false).unwrap();
    assert!(!vfs.exists("/home/user"));
}

#[test]
fn test_remove_recursive() {
    let mut vfs = sample();
    vfs.remove("/home", true).unwrap();
    assert!(!vfs.exists("/home"));
    assert!(vfs.list("/").unwrap().is_empty());
}

#[test]
fn test_remove_root_fails() {
    let mut vfs = sample();
    assert_eq!(vfs.remove("/", true), Err(VfsError::PermissionDenied));
    assert_eq!(vfs.remove("/home/..", true), Err(VfsError::PermissionDenied));
    assert!(vfs.exists("/home/user/readme.txt"));
}

#[test]
fn test_rename() {
    let mut vfs = sample();
    vfs.mkdir("/tmp", "root").unwrap();

    vfs.rename("/home/user/readme.txt", "/tmp/moved.txt").unwrap();
    assert!(!vfs.exists("/home/user/readme.txt"));
    assert_eq!(vfs.read("/tmp/moved.txt").unwrap(), b"hello");

    // Directory into its own subtree
    assert!(matches!(
        vfs.rename("/home", "/home/user/home"),
        Err(VfsError::InvalidPath(_))
    ));

    // Never replaces a directory
    assert_eq!(
        vfs.rename("/tmp/moved.txt", "/home/user"),
        Err(VfsError::AlreadyExists)
    );
}

#[test]
fn test_copy() {
    let mut vfs = sample();
    vfs.copy("/home/user", "/home/backup", "root").unwrap();

    assert_eq!(vfs.read("/home/backup/readme.txt").unwrap(), b"hello");
    assert_eq!(vfs.stat("/home/backup/readme.txt").unwrap().owner, "root");
    // Source untouched
    assert_eq!(vfs.stat("/home/user/readme.txt").unwrap().owner, "user");

    assert!(vfs.copy("/home", "/home/user/again", "root").is_err());
}

#[test]
fn test_chown() {
    let mut vfs = sample();
    vfs.chown("/home", "alice", true).unwrap();
    assert_eq!(vfs.stat("/home/user/readme.txt").unwrap().owner, "alice");

    vfs.chown("/home/user", "bob", false).unwrap();
    assert_eq!(vfs.stat("/home/user").unwrap().owner, "bob");
    assert_eq!(vfs.stat("/home/user/readme.txt").unwrap().owner, "alice");
}

#[test]
fn test_walk_tree_and_usage() {
    let vfs = sample();
    let paths: Vec<String> = vfs
        .walk_tree("/")
        .unwrap()
        .into_iter()
        .map(|(p, _)| p)
        .collect();
    assert_eq!(
        paths,
        vec!["/", "/home", "/home/user", "/home/user/readme.txt"]
    );

    let usage = vfs.usage();
    assert_eq!(usage.files, 1);
    assert_eq!(usage.directories, 3);
    assert_eq!(usage.bytes, 5);
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_.]{0,7}".prop_filter("reserved", |s| s != "." && s != "..")
    }

    proptest! {
        #[test]
        fn write_then_read_returns_content(
            dir in name(),
            file in name(),
            content in proptest::collection::vec(any::<u8>(), 0..256),
        ) {
            let mut vfs = Vfs::new();
            vfs.mkdir(&format!("/{}", dir), "root").unwrap();
            let path = format!("/{}/{}", dir, file);
            vfs.write(&path, &content, "root").unwrap();
            prop_assert_eq!(vfs.read(&path).unwrap(), content.as_slice());
        }

        #[test]
        fn remove_fails_with_not_empty_iff_populated(
            files in proptest::collection::btree_set(name(), 0..5),
        ) {
            let mut vfs = Vfs::new();
            vfs.mkdir("/d", "root").unwrap();
            for f in &files {
                vfs.write(&format!("/d/{}", f), b"x", "root").unwrap();
            }
            let populated = !vfs.list("/d").unwrap().is_empty();
            let result = vfs.remove("/d", false);
            prop_assert_eq!(populated, result == Err(VfsError::NotEmpty));
            prop_assert_eq!(populated, vfs.exists("/d"));
        }

        #[test]
        fn export_import_is_idempotent(
            entries in proptest::collection::vec((name(), name(), ".{0,32}"), 0..8),
        ) {
            let mut vfs = Vfs::new();
            for (dir, file, text) in &entries {
                let dir_path = format!("/{}", dir);
                if !vfs.exists(&dir_path) {
                    vfs.mkdir(&dir_path, dir).unwrap();
                }
                if vfs.is_dir(&dir_path) {
                    let file_path = format!("{}/{}", dir_path, file);
                    let _ = vfs.write(&file_path, text.as_bytes(), file);
                }
            }

            let blob = vfs.export().unwrap();
            let restored = Vfs::import(&blob).unwrap();
            prop_assert_eq!(&restored, &vfs);
            prop_assert_eq!(restored.export().unwrap(), blob);
        }
    }
}
