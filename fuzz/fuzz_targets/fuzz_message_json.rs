#![no_main]

use libfuzzer_sys::fuzz_target;

use beacon_resultsig::DkgResultHashSignatureMessage;

fuzz_target!(|data: &[u8]| {
    // Parse message - should not panic
    if let Ok(message) = serde_json::from_slice::<DkgResultHashSignatureMessage>(data) {
        assert!(message.sender_index().get() >= 1);

        // Round-trip should preserve data
        let json = serde_json::to_vec(&message).unwrap();
        let back: DkgResultHashSignatureMessage = serde_json::from_slice(&json).unwrap();
        assert_eq!(message, back);
    }
});
