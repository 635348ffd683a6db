//! Save / load round trips through every storage path, and rejection of
//! damaged files.

use std::path::PathBuf;
use std::sync::Arc;

use lexfst::builder::{BuilderOptions, FstBuilder};
use lexfst::enumerator::BytesFstEnum;
use lexfst::fst::SharedBytes;
use lexfst::outputs::{ByteSequenceOutputs, CharSequenceOutputs, PositiveIntOutputs};
use lexfst::{Fst, FstEnum, FstError, InputType};
use lexfst_core::DataOutput;

fn words() -> Vec<(String, u64)> {
    let mut words: Vec<(String, u64)> = (0..500u64)
        .map(|i| (format!("{}{:x}", ["alpha", "beta", "gamma"][(i % 3) as usize], i * 37), i))
        .collect();
    words.sort();
    words.dedup_by(|a, b| a.0 == b.0);
    words
}

fn build(options: BuilderOptions) -> Fst<PositiveIntOutputs> {
    let mut b = FstBuilder::with_options(InputType::Byte1, PositiveIntOutputs, options).unwrap();
    b.add_bytes(b"", 42).unwrap();
    for (w, v) in words() {
        b.add_str(&w, v).unwrap();
    }
    b.finish().unwrap().unwrap()
}

fn saved(fst: &Fst<PositiveIntOutputs>) -> Vec<u8> {
    let mut out = Vec::new();
    fst.save(&mut out).unwrap();
    out
}

fn assert_same_contents(a: &Fst<PositiveIntOutputs>, b: &Fst<PositiveIntOutputs>) {
    let (mut ea, mut eb) = (BytesFstEnum::new(a), BytesFstEnum::new(b));
    loop {
        let x = ea.next().unwrap().map(|io| io.cloned());
        let y = eb.next().unwrap().map(|io| io.cloned());
        assert_eq!(x, y);
        if x.is_none() {
            break;
        }
    }
}

/// Header for a byte-labelled FST without empty output, followed by `body`.
fn raw_fst(start_node: u64, num_bytes: u64, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.write_u32_be(0x3fd7_6c17);
    out.write_string("FST");
    out.write_u32_be(1);
    out.write_byte(0);
    out.write_byte(InputType::Byte1.tag());
    out.write_vlong(start_node);
    out.write_vlong(num_bytes);
    out.write_bytes(body);
    out
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("lexfst-{}-{name}", std::process::id()))
}

#[test]
fn heap_and_shared_loads_match_the_built_fst() {
    for page_bits in [1, 4, 15] {
        let fst = build(BuilderOptions {
            bytes_page_bits: page_bits,
            ..BuilderOptions::default()
        });
        let bytes = saved(&fst);

        let heap = Fst::from_bytes(&bytes, PositiveIntOutputs).unwrap();
        assert!(heap.is_on_heap());
        assert_eq!(heap.num_bytes(), fst.num_bytes());
        assert_eq!(heap.empty_output(), Some(&42));
        assert_same_contents(&fst, &heap);

        let source: SharedBytes = Arc::new(bytes.clone());
        let shared = Fst::from_shared(source, PositiveIntOutputs).unwrap();
        assert!(!shared.is_on_heap());
        assert_same_contents(&fst, &shared);

        // Saving a loaded FST reproduces the file.
        assert_eq!(saved(&heap), bytes);
        assert_eq!(saved(&shared), bytes);
    }
}

#[test]
fn path_round_trip() {
    let fst = build(BuilderOptions::default());
    let path = temp_path("round-trip.fst");
    fst.save_to_path(&path).unwrap();
    let loaded = Fst::read_from_path(&path, PositiveIntOutputs).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_same_contents(&fst, &loaded);
}

#[cfg(feature = "mmap")]
#[test]
fn mmap_round_trip() {
    let fst = build(BuilderOptions::default());
    let path = temp_path("mmap.fst");
    fst.save_to_path(&path).unwrap();
    let mapped = Fst::open_mmap(&path, PositiveIntOutputs).unwrap();
    assert!(!mapped.is_on_heap());
    assert_same_contents(&fst, &mapped);
    drop(mapped);
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn wide_alphabet_with_sequence_outputs() {
    let mut b = FstBuilder::new(InputType::Byte2, CharSequenceOutputs::new());
    let entries = [("caf\u{e9}", "coffee"), ("na\u{ef}ve", "naive"), ("\u{1F600}", "grin")];
    for (k, v) in entries {
        b.add_str(k, v.encode_utf16().collect()).unwrap();
    }
    let fst = b.finish().unwrap().unwrap();
    let mut bytes = Vec::new();
    fst.save(&mut bytes).unwrap();
    let loaded = Fst::from_bytes(&bytes, CharSequenceOutputs::new()).unwrap();
    assert_eq!(loaded.input_type(), InputType::Byte2);
    for (k, v) in entries {
        let labels = lexfst_core::utf16_labels(k);
        assert_eq!(loaded.get(&labels).unwrap(), Some(v.encode_utf16().collect::<Vec<u16>>()));
    }
}

#[test]
fn truncated_files_are_rejected() {
    let bytes = saved(&build(BuilderOptions::default()));
    for cut in [0, 3, 8, 12, bytes.len() / 2, bytes.len() - 1] {
        let part = &bytes[..cut];
        assert!(Fst::from_bytes(part, PositiveIntOutputs).is_err(), "heap load of {cut} bytes");
        let source: SharedBytes = Arc::new(part.to_vec());
        assert!(Fst::from_shared(source, PositiveIntOutputs).is_err(), "shared load of {cut} bytes");
    }
}

#[test]
fn damaged_headers_are_identified() {
    let bytes = saved(&build(BuilderOptions::default()));

    let mut bad = bytes.clone();
    bad[0] ^= 0xff;
    assert!(matches!(Fst::from_bytes(&bad, PositiveIntOutputs), Err(FstError::InvalidMagic(_))));

    let mut bad = bytes.clone();
    bad[5] = b'X';
    assert!(matches!(
        Fst::from_bytes(&bad, PositiveIntOutputs),
        Err(FstError::CodecMismatch { .. })
    ));

    let mut bad = bytes.clone();
    bad[11] = 9;
    assert!(matches!(
        Fst::from_bytes(&bad, PositiveIntOutputs),
        Err(FstError::UnsupportedVersion { found: 9, .. })
    ));
}

#[test]
fn large_empty_output_round_trips() {
    let big: Vec<u8> = (0..100_000u32).map(|i| (i % 253) as u8).collect();
    let mut b = FstBuilder::new(InputType::Byte1, ByteSequenceOutputs::new());
    b.add_bytes(b"", big.clone()).unwrap();
    b.add_bytes(b"k", b"v".to_vec()).unwrap();
    let fst = b.finish().unwrap().unwrap();
    let mut bytes = Vec::new();
    fst.save(&mut bytes).unwrap();

    let loaded = Fst::from_bytes(&bytes, ByteSequenceOutputs::new()).unwrap();
    assert_eq!(loaded.get_bytes(b"").unwrap(), Some(big.clone()));
    assert_eq!(loaded.get_bytes(b"k").unwrap(), Some(b"v".to_vec()));
    let streamed = Fst::load(bytes.as_slice(), ByteSequenceOutputs::new()).unwrap();
    assert_eq!(streamed.get_bytes(b"").unwrap(), Some(big));
}

#[test]
fn body_length_beyond_the_input_is_rejected() {
    let bytes = raw_fst(2, 1 << 40, &[0, b'a', 11]);
    assert!(matches!(
        Fst::from_bytes(&bytes, PositiveIntOutputs),
        Err(FstError::Decode(_))
    ));
    assert!(Fst::load(bytes.as_slice(), PositiveIntOutputs).is_err());
    let source: SharedBytes = Arc::new(bytes);
    assert!(Fst::from_shared(source, PositiveIntOutputs).is_err());
}

#[test]
fn targets_must_point_below_their_node() {
    // One final arc 'a' with no target: pad byte, label, flags FINAL|LAST|STOP.
    let good = raw_fst(2, 3, &[0, b'a', 11]);
    let fst = Fst::from_bytes(&good, PositiveIntOutputs).unwrap();
    assert_eq!(fst.get_bytes(b"a").unwrap(), Some(0));

    // Arc 'a' whose target is its own node.
    let looping = raw_fst(3, 4, &[0, 3, b'a', 2]);
    let fst = Fst::from_bytes(&looping, PositiveIntOutputs).unwrap();
    assert!(matches!(fst.get_bytes(b"aa"), Err(FstError::Corrupt(_))));
    assert!(matches!(FstEnum::new(&fst).next(), Err(FstError::Corrupt(_))));
    assert!(matches!(FstEnum::new(&fst).seek_floor(&[b'b' as i32]), Err(FstError::Corrupt(_))));
}

#[test]
fn non_final_arc_without_target_is_corrupt() {
    // Arc 'a' flagged LAST|STOP but not FINAL: a dead end that accepts nothing.
    let bytes = raw_fst(2, 3, &[0, b'a', 10]);
    let fst = Fst::from_bytes(&bytes, PositiveIntOutputs).unwrap();
    assert!(matches!(FstEnum::new(&fst).seek_floor(&[b'b' as i32]), Err(FstError::Corrupt(_))));
}
