//! Property tests for filename extraction and step decoding.

use proptest::prelude::*;

use eupp_ingest::{IngestError, decode_step, extract};

fn token() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("ctr".to_string()),
        Just("ens".to_string()),
        Just("efi".to_string()),
        Just("hr".to_string()),
        "[a-z]{1,8}".prop_filter("must not start the params marker", |s| !s.starts_with("params")),
    ]
}

fn kind() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("analysis"), Just("forecast"), Just("reforecast")]
}

proptest! {
    #[test]
    fn extracted_descriptors_never_hold_control_run(
        kind in kind(),
        product in token(),
        sub_kind in token(),
        version in proptest::option::of(0i64..1000),
        four_tokens in any::<bool>(),
    ) {
        let head = if four_tokens {
            format!("{kind}_{product}_{sub_kind}_x")
        } else {
            format!("{kind}_{product}_{sub_kind}")
        };
        let suffix = version.map(|v| format!("_{v}")).unwrap_or_default();
        let name = format!("EU_{head}_params_2017-01{suffix}.grb.index.zip");

        let descriptor = extract(&name).unwrap();
        prop_assert_eq!(descriptor.record_kind.as_str(), kind);
        prop_assert_ne!(descriptor.product.as_str(), "ctr");
        prop_assert_ne!(descriptor.sub_kind.as_str(), "ctr");
        prop_assert_eq!(descriptor.version, version);
    }

    #[test]
    fn names_without_extension_are_rejected(name in "EU_[a-z_]{0,30}") {
        let is_format_error = matches!(extract(&name), Err(IngestError::Format { .. }));
        prop_assert!(is_format_error);
    }

    #[test]
    fn step_ranges_decode_to_their_end(start in 0u32..10_000, end in 0u32..10_000) {
        prop_assert_eq!(decode_step(&format!("{start}-{end}")), Some(i64::from(end)));
        prop_assert_eq!(decode_step(&end.to_string()), Some(i64::from(end)));
    }

    #[test]
    fn non_numeric_steps_are_rejected(value in "[a-z]{1,6}") {
        prop_assert_eq!(decode_step(&value), None);
    }
}
