#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Outbound messages are only ever produced by the crate, but the parse
    // path must still be robust for tooling that replays captured traffic.
    let _ = serde_json::from_slice::<brainlook_client::ClientMessage>(data);

    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(msg) = serde_json::from_str::<brainlook_client::ClientMessage>(s) {
            // Anything we can parse we must be able to re-encode.
            let _ = serde_json::to_string(&msg);
        }
    }
});
