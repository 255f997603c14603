#![no_main]

use brainlook_client::router;
use brainlook_client::GameSessionState;

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Exercise the raw deserialization path first (includes serde_json's
    // own UTF-8 validation and error handling for invalid sequences).
    let _ = serde_json::from_slice::<brainlook_client::ServerMessage>(data);

    // Then the full routing path: classification, unknown-kind rejection,
    // and state mutation must never panic on arbitrary input.
    if let Ok(s) = std::str::from_utf8(data) {
        let mut state = GameSessionState::new();
        let _ = router::route(&mut state, s);
    }
});
