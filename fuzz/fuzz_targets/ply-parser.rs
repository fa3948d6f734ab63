#![no_main]

use libfuzzer_sys::fuzz_target;
use pc_backend::io::ply::Reader;

fuzz_target!(|data: &[u8]| {
    // Only panics and worse crashes are interesting here. A returned error
    // just means "this is not a valid PLY file", which is fine. Both the raw
    // path and the point cloud path are exercised.
    if let Ok(reader) = Reader::new(data) {
        let _ = reader.into_raw_result();
    }
    let _ = Reader::new(data).and_then(|r| r.read_cloud());
});
