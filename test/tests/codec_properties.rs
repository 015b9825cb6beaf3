/// Property tests for the bit codecs: full and delta floats, prefixed and
/// segmented integers, and delta baselines.
use proptest::prelude::*;

use tandem_shared::{
    float, integer, read_angle_delta, write_angle_delta, BitReader, BitWriter, DeltaBaseline,
    DeltaSerde, NormalizedFloat, PrefixedInteger, SegmentedInteger, Serde,
};

fn any_f32() -> impl Strategy<Value = f32> {
    any::<u32>().prop_map(f32::from_bits)
}

proptest! {
    #[test]
    fn full_float_is_bit_identical(value in any_f32()) {
        let mut writer = BitWriter::new();
        float::write_full(&mut writer, value);
        prop_assert_eq!(writer.bits_written(), 32);

        let bytes = writer.to_bytes();
        let mut reader = BitReader::new(&bytes);
        let decoded = float::read_full(&mut reader).unwrap();
        prop_assert_eq!(decoded.to_bits(), value.to_bits());
    }

    #[test]
    fn unchanged_float_costs_one_bit(value in any_f32()) {
        let mut writer = BitWriter::new();
        let changed = float::write_delta(&mut writer, value, value);
        prop_assert!(!changed);
        prop_assert_eq!(writer.bits_written(), 1);

        let bytes = writer.to_bytes();
        let mut reader = BitReader::new(&bytes);
        let decoded = float::read_delta(&mut reader, value).unwrap();
        prop_assert_eq!(decoded.to_bits(), value.to_bits());
    }

    #[test]
    fn float_delta_reconstructs_new_value(old in any_f32(), new in any_f32()) {
        prop_assume!(old.to_bits() != new.to_bits());

        let mut writer = BitWriter::new();
        prop_assert!(float::write_delta(&mut writer, old, new));
        prop_assert_eq!(writer.bits_written(), float::delta_bit_length(old, new));

        let bytes = writer.to_bytes();
        let mut reader = BitReader::new(&bytes);
        let decoded = float::read_delta(&mut reader, old).unwrap();
        prop_assert_eq!(decoded.to_bits(), new.to_bits());
    }

    #[test]
    fn prefixed_signed_at_every_resolution(value in any::<i64>(), resolution in 1u8..=16) {
        let mut writer = BitWriter::new();
        integer::write_prefixed(&mut writer, value, resolution);
        prop_assert_eq!(writer.bits_written(), integer::prefixed_bit_length(value, resolution));

        let bytes = writer.to_bytes();
        let mut reader = BitReader::new(&bytes);
        prop_assert_eq!(integer::read_prefixed(&mut reader, resolution).unwrap(), value);
    }

    #[test]
    fn prefixed_unsigned_at_every_resolution(value in any::<u64>(), resolution in 1u8..=16) {
        let mut writer = BitWriter::new();
        integer::write_prefixed_unsigned(&mut writer, value, resolution);

        let bytes = writer.to_bytes();
        let mut reader = BitReader::new(&bytes);
        prop_assert_eq!(
            integer::read_prefixed_unsigned(&mut reader, resolution).unwrap(),
            value
        );
    }

    #[test]
    fn segmented_within_max_bits(
        (segment_bits, max_bits, value) in (1u8..=12, 12u8..=40).prop_flat_map(|(segment, max)| {
            let limit = (1i64 << max) - 1;
            (Just(segment), Just(max), -limit..=limit)
        })
    ) {
        let mut writer = BitWriter::new();
        integer::write_segmented(&mut writer, value, segment_bits, max_bits);
        prop_assert_eq!(
            writer.bits_written(),
            integer::segmented_bit_length(value, segment_bits, max_bits)
        );

        let bytes = writer.to_bytes();
        let mut reader = BitReader::new(&bytes);
        prop_assert_eq!(
            integer::read_segmented(&mut reader, segment_bits, max_bits).unwrap(),
            value
        );
    }

    #[test]
    fn angle_delta_reconstructs_new_value(old in -1.0f32..=1.0, new in -1.0f32..=1.0) {
        let old = NormalizedFloat::new(old);
        let new = NormalizedFloat::new(new);

        let mut writer = BitWriter::new();
        let changed = write_angle_delta(&mut writer, old, new);
        prop_assert_eq!(changed, old != new);

        let bytes = writer.to_bytes();
        let mut reader = BitReader::new(&bytes);
        prop_assert_eq!(read_angle_delta(&mut reader, old).unwrap(), new);
    }

    #[test]
    fn integer_delta_survives_wrapping(old in any::<i32>(), new in any::<i32>()) {
        let mut writer = BitWriter::new();
        new.ser_delta(&old, &mut writer);

        let bytes = writer.to_bytes();
        let mut reader = BitReader::new(&bytes);
        prop_assert_eq!(i32::de_delta(&old, &mut reader).unwrap(), new);
    }

    #[test]
    fn baseline_stream_tracks_every_value(values in proptest::collection::vec(any_f32(), 1..20)) {
        let mut sender = DeltaBaseline::<f32>::new();
        let mut receiver = DeltaBaseline::<f32>::new();

        for value in values {
            let mut writer = BitWriter::new();
            sender.write(&value, &mut writer);

            let bytes = writer.to_bytes();
            let mut reader = BitReader::new(&bytes);
            let decoded = receiver.read(&mut reader).unwrap();
            prop_assert_eq!(decoded.to_bits(), value.to_bits());
        }
    }
}

#[test]
fn small_deltas_are_cheap() {
    let mut writer = BitWriter::new();
    float::write_delta(&mut writer, 1.0, 1.0000001);
    // changed + sign + exponent (sign, 2, stop) + mantissa (sign, 9, stop)
    assert_eq!(writer.bits_written(), 2 + 4 + 11);
}

#[test]
fn typed_wrappers_match_free_functions() {
    let value = PrefixedInteger::<true, 5>::new(-300i32);
    let mut writer = BitWriter::new();
    value.ser(&mut writer);
    assert_eq!(writer.bits_written(), integer::prefixed_bit_length(-300, 5));

    let bytes = writer.to_bytes();
    let mut reader = BitReader::new(&bytes);
    assert_eq!(PrefixedInteger::<true, 5>::de(&mut reader).unwrap().get(), -300);

    let value = SegmentedInteger::<9, 23>::new(-4_000_000i32);
    let mut writer = BitWriter::new();
    value.ser(&mut writer);

    let bytes = writer.to_bytes();
    let mut reader = BitReader::new(&bytes);
    assert_eq!(SegmentedInteger::<9, 23>::de(&mut reader).unwrap().get(), -4_000_000);
}

#[test]
fn reset_baseline_sends_full_value_again() {
    let mut sender = DeltaBaseline::<u32>::new();
    let mut receiver = DeltaBaseline::<u32>::new();

    for value in [10u32, 11] {
        let mut writer = BitWriter::new();
        sender.write(&value, &mut writer);
        let bytes = writer.to_bytes();
        assert_eq!(receiver.read(&mut BitReader::new(&bytes)).unwrap(), value);
    }

    sender.reset();
    receiver.reset();
    assert!(!sender.is_synced());

    let mut writer = BitWriter::new();
    sender.write(&12, &mut writer);
    assert_eq!(writer.bits_written(), 32);
    let bytes = writer.to_bytes();
    assert_eq!(receiver.read(&mut BitReader::new(&bytes)).unwrap(), 12);
}
