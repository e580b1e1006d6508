//! Environment-backed flags. Kept in their own test binary since they mutate
//! process environment.

use std::io::Write;

use clap::Parser;

use statdash_console::cli::{load_config, Cli};

#[test]
fn environment_overrides_file_and_flags_override_environment() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[backend]\nbase_url = \"http://file:9000\"\n[logging]\nlevel = \"warn\""
    )
    .unwrap();
    let path = file.path().to_str().unwrap();

    std::env::remove_var("STATDASH_BASE_URL");
    std::env::remove_var("STATDASH_LOG");
    let cli = Cli::try_parse_from(["statdash", "ping", "--config", path]).unwrap();
    let config = load_config(&cli).unwrap();
    assert_eq!(config.backend.base_url, "http://file:9000");
    assert_eq!(config.logging.level, "warn");

    std::env::set_var("STATDASH_BASE_URL", "http://env:7000");
    std::env::set_var("STATDASH_LOG", "debug");
    let cli = Cli::try_parse_from(["statdash", "ping", "--config", path]).unwrap();
    let config = load_config(&cli).unwrap();
    assert_eq!(config.backend.base_url, "http://env:7000");
    assert_eq!(config.logging.level, "debug");

    let cli = Cli::try_parse_from([
        "statdash",
        "ping",
        "--config",
        path,
        "--base-url",
        "http://flag:6000",
    ])
    .unwrap();
    let config = load_config(&cli).unwrap();
    assert_eq!(config.backend.base_url, "http://flag:6000");
    assert_eq!(config.logging.level, "debug");

    std::env::remove_var("STATDASH_BASE_URL");
    std::env::remove_var("STATDASH_LOG");
}
