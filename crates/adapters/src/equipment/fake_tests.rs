// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn fake_trigger_records_calls() {
    let trigger = FakeTrigger::new();

    trigger.trigger("hot-tub-heat-on").await.unwrap();
    trigger.trigger("hot-tub-heat-off").await.unwrap();

    assert_eq!(trigger.calls(), vec!["hot-tub-heat-on", "hot-tub-heat-off"]);
    assert_eq!(trigger.count("hot-tub-heat-on"), 1);
}

#[tokio::test]
async fn injected_failure_is_recorded_and_returned() {
    let trigger = FakeTrigger::new();
    trigger.fail_event("hot-tub-heat-off", true);

    let err = trigger.trigger("hot-tub-heat-off").await.unwrap_err();
    assert_eq!(
        err,
        TriggerError::Rejected {
            event: "hot-tub-heat-off".into(),
            status: 503
        }
    );
    assert_eq!(trigger.count("hot-tub-heat-off"), 1);

    trigger.fail_event("hot-tub-heat-off", false);
    trigger.trigger("hot-tub-heat-off").await.unwrap();
}
