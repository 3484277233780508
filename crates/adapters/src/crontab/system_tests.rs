// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn prune_keeps_newest_backups() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..5 {
        std::fs::write(dir.path().join(format!("crontab-2026012{i}-120000.000.txt")), "").unwrap();
    }
    std::fs::write(dir.path().join("unrelated.txt"), "").unwrap();

    let removed = prune_backups(dir.path(), 3).await.unwrap();
    assert_eq!(removed, 2);

    let mut left: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    left.sort();
    assert_eq!(
        left,
        vec![
            "crontab-20260122-120000.000.txt",
            "crontab-20260123-120000.000.txt",
            "crontab-20260124-120000.000.txt",
            "unrelated.txt",
        ]
    );
}

#[tokio::test]
async fn prune_with_few_backups_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("crontab-20260120-120000.000.txt"), "").unwrap();
    assert_eq!(prune_backups(dir.path(), 20).await.unwrap(), 0);
}

#[tokio::test]
async fn missing_binary_is_command_failure() {
    let crontab = SystemCrontab {
        program: "/nonexistent/crontab".to_string(),
        ..SystemCrontab::default()
    };
    assert!(matches!(
        crontab.list_entries().await,
        Err(CrontabError::CommandFailed(_))
    ));
    assert!(crontab.add_entry("0 9 * * * x").await.is_err());
}
