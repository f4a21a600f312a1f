use accountdesk::logger::Logger;

#[test]
fn test_logging_disabled_keeps_memory_buffer() {
    let logger = Logger::from_config(false).unwrap();
    assert!(!logger.is_enabled());
    assert!(logger.log_file().is_none());

    logger.log("Test message".to_string());
    let logs = logger.get_logs();
    assert!(logs.iter().any(|entry| entry.contains("Test message")));
}

#[test]
fn test_logs_are_newest_first_and_timestamped() {
    let logger = Logger::new();
    logger.log("first".to_string());
    logger.log("second".to_string());

    let logs = logger.get_logs();
    assert_eq!(logs.len(), 2);
    assert!(logs[0].ends_with("second"));
    assert!(logs[1].ends_with("first"));
    assert!(logs[0].starts_with('['));
}

#[test]
fn test_buffer_is_bounded() {
    let logger = Logger::new();
    for i in 0..1100 {
        logger.log(format!("entry {i}"));
    }
    let logs = logger.get_logs();
    assert_eq!(logs.len(), 1000);
    assert!(logs[0].ends_with("entry 1099"));
    assert!(logs[999].ends_with("entry 100"));
}

#[test]
fn test_clear() {
    let logger = Logger::new();
    logger.log("something".to_string());
    logger.clear();
    assert!(logger.get_logs().is_empty());
}

#[test]
fn test_clones_share_the_buffer() {
    let logger = Logger::new();
    let other = logger.clone();
    other.log("from clone".to_string());
    assert_eq!(logger.get_logs().len(), 1);
}

#[test]
fn test_log_file_path_is_under_data_dir() {
    if let Ok(path) = Logger::get_log_file_path() {
        assert!(path.ends_with("accountdesk/accountdesk.log"));
    }
}

#[test]
fn test_log_file_inactive_when_backend_already_installed() {
    // Whichever call runs first in this binary takes the single backend slot
    let _ = Logger::from_config(false);

    let path = std::env::temp_dir()
        .join(format!("accountdesk-test-{}", std::process::id()))
        .join("accountdesk.log");
    let logger = Logger::install(Some(path.clone())).unwrap();
    assert!(!logger.is_enabled());
    assert!(logger.log_file().is_none());
    assert!(logger
        .get_logs()
        .iter()
        .any(|entry| entry.contains("Logger already installed")));

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}
