use super::*;

#[test]
fn test_defaults_apply_without_sources() {
    let settings = Settings::from_toml("").unwrap();

    assert_eq!(settings.server.port, 8080);
    assert_eq!(settings.worker.max_retries, 3);
    assert_eq!(settings.worker.poll_interval(), Duration::from_secs(1));
    assert_eq!(settings.barrier.ceiling_secs, 30);
    assert_eq!(settings.timeouts.store_ms, 500);
    assert_eq!(settings.roulette.interval, "biweekly");
    assert!(!settings.bot.dev_mode);
    assert!(!settings.metrics.enabled);
}

#[test]
fn test_toml_overrides_defaults() {
    let settings = Settings::from_toml(
        r#"
        [database]
        url = "postgres://localhost/chat_roulette"

        [worker]
        concurrency = 8
        job_deadline_secs = 120

        [bot]
        user_id = "UBOT"
        dev_mode = true
        "#,
    )
    .unwrap();

    assert_eq!(settings.database.url, "postgres://localhost/chat_roulette");
    assert_eq!(settings.database.max_connections, Some(20));
    assert_eq!(settings.worker.concurrency, 8);
    assert_eq!(settings.worker.job_deadline(), Duration::from_secs(120));
    assert_eq!(settings.bot.user_id, "UBOT");
    assert!(settings.bot.dev_mode);
}

#[test]
fn test_invalid_value_is_rejected() {
    let result = Settings::from_toml(
        r#"
        [server]
        port = "not-a-port"
        "#,
    );
    assert!(result.is_err());
}
