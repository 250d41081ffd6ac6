#![no_main]
use libfuzzer_sys::fuzz_target;
use tiffwalk::walk::{Needle, Walker};

fuzz_target!(|data: &[u8]| {
    let mut decoder = if let Ok(d) = tiffwalk::decoder::Decoder::new(std::io::Cursor::new(data)) {
        d
    } else {
        return;
    };

    let _ = Walker::new(&mut decoder).search_all(&Needle::Integer(0));
    let _ = Walker::new(&mut decoder).search_all(&Needle::from("II"));
});
