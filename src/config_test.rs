use super::*;
use std::sync::Mutex;

// Every test here mutates the same process-wide variables.
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// # Safety
/// Callers must hold `ENV_LOCK`.
unsafe fn clear_env() {
    unsafe {
        std::env::remove_var("CONSTELLATION_API_BASE_URL");
        std::env::remove_var("CONSTELLATION_TOKEN_FILE");
        std::env::remove_var("CONSTELLATION_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("CONSTELLATION_CONNECT_TIMEOUT_SECS");
        std::env::remove_var("CONSTELLATION_HEALTH_STALE_SECS");
    }
}

#[test]
fn from_env_defaults() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe { clear_env() };

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
    assert_eq!(cfg.token_path, default_token_path());
    assert_eq!(
        cfg.timeouts,
        Timeouts { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    );
    assert_eq!(cfg.health_stale_after(), Duration::from_secs(30));
}

#[test]
fn from_env_parses_overrides() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_env();
        std::env::set_var("CONSTELLATION_API_BASE_URL", "https://api.example.test/api/");
        std::env::set_var("CONSTELLATION_TOKEN_FILE", "/tmp/constellation-test/token");
        std::env::set_var("CONSTELLATION_REQUEST_TIMEOUT_SECS", "42");
        std::env::set_var("CONSTELLATION_CONNECT_TIMEOUT_SECS", "7");
        std::env::set_var("CONSTELLATION_HEALTH_STALE_SECS", "5");
    }

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.api_base_url, "https://api.example.test/api");
    assert_eq!(cfg.token_path, PathBuf::from("/tmp/constellation-test/token"));
    assert_eq!(cfg.timeouts, Timeouts { request_secs: 42, connect_secs: 7 });
    assert_eq!(cfg.health_stale_secs, 5);

    unsafe { clear_env() };
}

#[test]
fn from_env_bad_numbers_fall_back_to_defaults() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_env();
        std::env::set_var("CONSTELLATION_REQUEST_TIMEOUT_SECS", "soon");
        std::env::set_var("CONSTELLATION_CONNECT_TIMEOUT_SECS", "-1");
    }

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.timeouts.request_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    assert_eq!(cfg.timeouts.connect_secs, DEFAULT_CONNECT_TIMEOUT_SECS);

    unsafe { clear_env() };
}

#[test]
fn from_env_empty_base_url_errors() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_env();
        std::env::set_var("CONSTELLATION_API_BASE_URL", "  ");
    }

    let err = ClientConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::Empty { var: "CONSTELLATION_API_BASE_URL" }));

    unsafe { clear_env() };
}

#[test]
fn explicit_base_url_ignores_invalid_env_value() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_env();
        std::env::set_var("CONSTELLATION_API_BASE_URL", "ftp://stale.example.test");
        std::env::set_var("CONSTELLATION_REQUEST_TIMEOUT_SECS", "12");
    }

    let cfg = ClientConfig::from_env_with_base_url(Some("http://127.0.0.1:8000/api/")).unwrap();
    assert_eq!(cfg.api_base_url, "http://127.0.0.1:8000/api");
    assert_eq!(cfg.timeouts.request_secs, 12);
    assert!(ClientConfig::from_env().is_err());

    unsafe { clear_env() };
}

#[test]
fn explicit_base_url_is_still_validated() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe { clear_env() };

    let err = ClientConfig::from_env_with_base_url(Some("  ")).unwrap_err();
    assert!(matches!(err, ConfigError::Empty { var: "api_base_url" }));
}

#[test]
fn for_base_url_rejects_non_http_scheme() {
    let err = ClientConfig::for_base_url("ftp://files.example.test").unwrap_err();
    assert!(err.to_string().contains("http://"));
}

#[test]
fn for_base_url_strips_trailing_slashes() {
    let cfg = ClientConfig::for_base_url("http://127.0.0.1:9000//").unwrap();
    assert_eq!(cfg.api_base_url, "http://127.0.0.1:9000");
}

#[test]
fn default_token_path_ends_with_storage_key() {
    assert!(default_token_path().ends_with(TOKEN_STORAGE_KEY));
}
