use std::io::Write;

use coursehub_net::config::CONFIG_FILE_ENV;
use coursehub_net::prelude::*;

// One test per binary: it mutates the process environment.
#[test]
fn config_file_env_then_prefixed_overrides() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        "database = \"coaching\"\nbase_url = \"https://api.example.com\"\nlocal_port = 4100"
    )
    .unwrap();

    std::env::set_var(CONFIG_FILE_ENV, file.path());
    let cfg = ApiConfig::load().unwrap();
    assert_eq!(cfg.database, "coaching");
    assert_eq!(cfg.local_port, 4100);
    assert_eq!(cfg.key_scheme, KeyScheme::Wide);

    std::env::set_var("COURSEHUB__DATABASE", "marketplace");
    std::env::set_var("COURSEHUB__LOCAL_PORT", "4200");
    std::env::set_var("COURSEHUB__KEY_SCHEME", "legacy");
    let cfg = ApiConfig::load().unwrap();
    assert_eq!(cfg.database, "marketplace");
    assert_eq!(cfg.local_port, 4200);
    assert_eq!(cfg.key_scheme, KeyScheme::Legacy);
    assert_eq!(cfg.base_url, "https://api.example.com");
    assert_eq!(cfg.local_base().unwrap().as_str(), "http://localhost:4200/");

    std::env::remove_var(CONFIG_FILE_ENV);
    std::env::remove_var("COURSEHUB__DATABASE");
    std::env::remove_var("COURSEHUB__LOCAL_PORT");
    std::env::remove_var("COURSEHUB__KEY_SCHEME");
}
