use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

fn scratch_path() -> PathBuf {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir()
        .join(format!("portal-cli-test-{}-{n}", std::process::id()))
        .join("token")
}

#[test]
fn missing_file_loads_none() {
    let store = FileTokenStore::new(scratch_path());
    assert_eq!(store.load(), None);
}

#[test]
fn save_creates_parent_and_round_trips() {
    let path = scratch_path();
    let store = FileTokenStore::new(&path);

    store.save("abc123").unwrap();

    assert!(path.exists());
    assert_eq!(store.load().as_deref(), Some("abc123"));
    store.clear().unwrap();
    assert!(!path.exists());
}

#[test]
fn clear_missing_file_is_ok() {
    let store = FileTokenStore::new(scratch_path());
    store.clear().unwrap();
}

#[test]
fn whitespace_only_file_reads_as_absent() {
    let path = scratch_path();
    let store = FileTokenStore::new(&path);
    store.save("  \n").unwrap();
    assert_eq!(store.load(), None);
    store.clear().unwrap();
}

#[cfg(unix)]
#[test]
fn saved_token_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;
    let path = scratch_path();
    let store = FileTokenStore::new(&path);
    store.save("secret").unwrap();
    let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600);
    store.clear().unwrap();
}

#[cfg(unix)]
#[test]
fn save_tightens_a_world_readable_file() {
    use std::os::unix::fs::PermissionsExt;
    let path = scratch_path();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "stale-token-with-longer-content").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

    let store = FileTokenStore::new(&path);
    store.save("fresh").unwrap();

    let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600);
    assert_eq!(store.load().as_deref(), Some("fresh"));
    store.clear().unwrap();
}

#[test]
fn default_path_ends_with_key() {
    let path = FileTokenStore::default_path("token");
    assert!(path.ends_with(".portal/token"));
}
