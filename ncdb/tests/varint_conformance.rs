//! Backend-equivalence contract for the varint codec: the accelerated entry
//! points must be byte-identical to the portable reference for every
//! representable value, and the portable decoder is the oracle for both.

use coverdb_ncdb::varint::{self, portable};
use rand::{Rng, SeedableRng};
use test_case::test_case;

#[test_case(0; "zero")]
#[test_case(1; "one")]
#[test_case(127; "single byte max")]
#[test_case(128; "two byte min")]
#[test_case(300; "small")]
#[test_case((1u64 << 32) - 1; "u32 max")]
#[test_case(1u64 << 32; "u32 max plus one")]
#[test_case((1u64 << 32) + 1; "above u32")]
#[test_case(1u64 << 53; "two to the 53")]
#[test_case(u64::MAX; "u64 max")]
fn test_backends_emit_identical_bytes(value: u64) {
    let mut fast = Vec::new();
    varint::write(value, &mut fast);
    let mut reference = Vec::new();
    portable::write(value, &mut reference);
    assert_eq!(fast, reference);

    // The portable decoder recovers the exact value from either encoding.
    assert_eq!(portable::read(&fast, 0).unwrap(), (value, fast.len()));
    assert_eq!(varint::read(&reference, 0).unwrap(), (value, fast.len()));
    assert_eq!(varint::size(value), fast.len());
}

#[test]
fn test_bulk_backends_agree_on_mixed_sequences() {
    let sequences: Vec<Vec<u64>> = vec![
        vec![],
        vec![0],
        vec![0, 1, 2, 3, 127],
        vec![128, 0, (1 << 32) + 1, 5, 1 << 53],
        vec![u64::MAX; 7],
    ];
    for values in sequences {
        let fast = varint::encode_all(&values);
        let reference = portable::encode_all(&values);
        assert_eq!(fast, reference);

        let (decoded, consumed) = varint::decode_all(&fast, values.len(), 0).unwrap();
        let (oracle, oracle_consumed) = portable::decode_all(&fast, values.len(), 0).unwrap();
        assert_eq!(decoded, oracle);
        assert_eq!(consumed, oracle_consumed);
        assert_eq!(decoded, values);
    }
}

#[test]
fn test_randomized_equivalence() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0xC0FFEE);
    for _ in 0..200 {
        let len = rng.gen_range(0..256);
        let values: Vec<u64> = (0..len)
            .map(|_| {
                // Mix magnitudes so both the one-byte fast path and long
                // encodings appear in the same run.
                let bits = rng.gen_range(0..64);
                rng.gen::<u64>() >> bits
            })
            .collect();

        let fast = varint::encode_all(&values);
        assert_eq!(fast, portable::encode_all(&values));

        let (decoded, consumed) = varint::decode_all(&fast, values.len(), 0).unwrap();
        assert_eq!(decoded, values);
        assert_eq!(consumed, fast.len());
        assert_eq!(
            portable::decode_all(&fast, values.len(), 0).unwrap().0,
            values
        );
    }
}

#[test]
fn test_both_backends_reject_truncation_identically() {
    let mut buf = Vec::new();
    varint::write(1 << 53, &mut buf);
    for cut in 0..buf.len() {
        let truncated = &buf[..cut];
        assert_eq!(
            varint::read(truncated, 0),
            portable::read(truncated, 0),
            "cut at {cut}"
        );
        assert!(varint::read(truncated, 0).is_err());
    }
}
