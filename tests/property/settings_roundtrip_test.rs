//! Property-based tests for ExtensionSettings serialization round-trip.
//!
//! These tests verify that ExtensionSettings can be serialized to JSON
//! and deserialized back without data loss for arbitrary valid inputs.

use proptest::prelude::*;
use vaultfill::types::settings::{
    AutofillPolicy, AutofillSettings, ExtensionSettings, MessengerSettings, SaveSettings,
    SaveTrigger, ServiceSettings,
};

// --- Arbitrary strategies for all settings sub-types ---

fn arb_policy() -> impl Strategy<Value = AutofillPolicy> {
    prop_oneof![
        Just(AutofillPolicy::ClickThrough),
        (0u64..10_000).prop_map(|delay_ms| AutofillPolicy::Automatic { delay_ms }),
    ]
}

fn arb_trigger() -> impl Strategy<Value = SaveTrigger> {
    prop_oneof![Just(SaveTrigger::Submit), Just(SaveTrigger::PasswordInput)]
}

fn arb_service_settings() -> impl Strategy<Value = ServiceSettings> {
    ("https?://[a-z]{3,10}(\\.[a-z]{2,4})?(:[0-9]{2,4})?", 1u64..120).prop_map(
        |(server_url, request_timeout_secs)| ServiceSettings {
            server_url,
            request_timeout_secs,
        },
    )
}

fn arb_autofill_settings() -> impl Strategy<Value = AutofillSettings> {
    (
        arb_policy(),
        1u64..600_000,
        1u32..10,
        0u64..10_000,
        0u64..10_000,
        0u64..10_000,
        0u64..1_000,
    )
        .prop_map(
            |(
                policy,
                cache_duration_ms,
                max_fetch_attempts,
                retry_delay_ms,
                debounce_ms,
                settle_delay_ms,
                picker_dismiss_delay_ms,
            )| AutofillSettings {
                policy,
                cache_duration_ms,
                max_fetch_attempts,
                retry_delay_ms,
                debounce_ms,
                settle_delay_ms,
                picker_dismiss_delay_ms,
            },
        )
}

fn arb_settings() -> impl Strategy<Value = ExtensionSettings> {
    (
        arb_service_settings(),
        arb_autofill_settings(),
        arb_trigger(),
        1u64..60_000,
    )
        .prop_map(|(service, autofill, trigger, liveness_interval_ms)| ExtensionSettings {
            service,
            autofill,
            save: SaveSettings { trigger },
            messenger: MessengerSettings {
                liveness_interval_ms,
            },
        })
}

proptest! {
    #[test]
    fn settings_json_roundtrip(settings in arb_settings()) {
        let json = serde_json::to_string(&settings).unwrap();
        let back: ExtensionSettings = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, settings);
    }

    #[test]
    fn policy_carries_mode_tag(policy in arb_policy()) {
        let value = serde_json::to_value(&policy).unwrap();
        let mode = value.get("mode").and_then(|m| m.as_str()).unwrap();
        match policy {
            AutofillPolicy::ClickThrough => prop_assert_eq!(mode, "click_through"),
            AutofillPolicy::Automatic { .. } => prop_assert_eq!(mode, "automatic"),
        }
    }
}
