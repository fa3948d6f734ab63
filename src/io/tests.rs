use super::is_ply_extension;

#[test]
fn ply_extension() {
    macro_rules! check_extension {
        ($($ext:literal)*) => {$(
            assert!(is_ply_extension(concat!("foo.", $ext)));
            assert!(is_ply_extension(concat!("föö.", $ext)));
            assert!(is_ply_extension(concat!("/bar/foo.", $ext)));
        )*}
    }

    check_extension!("ply" "PLY" "pLy");
}

#[test]
fn other_extensions() {
    assert!(!is_ply_extension("foo/bar/"));
    assert!(!is_ply_extension("foo/bar"));
    assert!(!is_ply_extension("foo/bar."));
    assert!(!is_ply_extension("foo/.ply"));
    assert!(!is_ply_extension("foo/bar.pcd"));
    assert!(!is_ply_extension("foo/bar.ply.txt"));
}
