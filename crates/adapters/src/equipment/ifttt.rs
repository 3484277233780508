// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IFTTT webhook trigger

use super::{EquipmentTrigger, TriggerError};
use async_trait::async_trait;
use std::time::Duration;

/// Fires Maker webhooks: `POST {base}/trigger/{event}/with/key/{key}`
#[derive(Clone)]
pub struct IftttTrigger {
    base_url: String,
    key: String,
    timeout: Duration,
}

impl IftttTrigger {
    pub fn new(base_url: impl Into<String>, key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            key: key.into(),
            timeout,
        }
    }

    fn url(&self, event: &str) -> String {
        format!(
            "{}/trigger/{}/with/key/{}",
            self.base_url.trim_end_matches('/'),
            event,
            self.key
        )
    }
}

impl std::fmt::Debug for IftttTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IftttTrigger")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl EquipmentTrigger for IftttTrigger {
    async fn trigger(&self, event: &str) -> Result<(), TriggerError> {
        let url = self.url(event);
        let timeout = self.timeout;
        let owned_event = event.to_string();

        // ureq is blocking
        let outcome = tokio::task::spawn_blocking(move || {
            let agent = ureq::Agent::new_with_config(
                ureq::Agent::config_builder()
                    .timeout_global(Some(timeout))
                    .http_status_as_error(false)
                    .build(),
            );
            agent
                .post(&url)
                .header("Content-Type", "application/json")
                .send("{}")
                .map(|response| response.status().as_u16())
        })
        .await;

        let status = match outcome {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                return Err(TriggerError::Transport {
                    event: owned_event,
                    message: e.to_string(),
                })
            }
            Err(e) => {
                return Err(TriggerError::Transport {
                    event: owned_event,
                    message: e.to_string(),
                })
            }
        };

        if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(TriggerError::Rejected {
                event: owned_event,
                status,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_embeds_event_and_key() {
        let trigger = IftttTrigger::new(
            "https://maker.ifttt.com/",
            "k3y",
            Duration::from_secs(10),
        );
        assert_eq!(
            trigger.url("hot-tub-heat-on"),
            "https://maker.ifttt.com/trigger/hot-tub-heat-on/with/key/k3y"
        );
    }

    #[test]
    fn debug_hides_key() {
        let trigger = IftttTrigger::new("https://maker.ifttt.com", "k3y", Duration::from_secs(10));
        assert!(!format!("{:?}", trigger).contains("k3y"));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let trigger = IftttTrigger::new("http://127.0.0.1:1", "k", Duration::from_secs(2));
        let err = trigger.trigger("hot-tub-heat-on").await.unwrap_err();
        assert!(matches!(err, TriggerError::Transport { .. }), "{err:?}");
    }
}
