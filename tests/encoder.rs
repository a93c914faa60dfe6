mod common;

use common::decode;
use smart_leds_trait::RGB8;
use ws2812_spi_dma::encoder::{encode, FrameWriter};
use ws2812_spi_dma::pixels::{ColorOrder, Pixels, Solid, FULL_SCALE};
use ws2812_spi_dma::pattern::Profile;
use ws2812_spi_dma::{BufferTooSmall, ONE_BYTE_190NS, THREE_BYTE_50NS};

#[test]
fn single_green_pixel_one_byte_per_bit() {
    let profile = ONE_BYTE_190NS;
    let mut buffer = [0xAAu8; 26];
    let colors = [RGB8::new(0x00, 0xFF, 0x00)];
    let mut pixels = Pixels::new(&colors, ColorOrder::Rgb, FULL_SCALE);

    let content = encode(&profile.table, profile.framing, &mut pixels, &mut buffer).unwrap();

    assert_eq!(content, 24);
    let mut expected = vec![0x00u8];
    expected.extend([0xC0; 8]);
    expected.extend([0xFC; 8]);
    expected.extend([0xC0; 8]);
    expected.push(0x00);
    assert_eq!(&buffer[..], &expected[..]);
}

#[test]
fn lowest_red_bit_three_bytes_per_bit() {
    let profile = THREE_BYTE_50NS;
    let mut buffer = vec![0x55u8; profile.buffer_len(2)];
    let colors = [RGB8::new(0x01, 0x00, 0x00), RGB8::new(0x00, 0x00, 0x00)];
    let mut pixels = Pixels::new(&colors, ColorOrder::Rgb, FULL_SCALE);

    let content = encode(&profile.table, profile.framing, &mut pixels, &mut buffer).unwrap();
    assert_eq!(content, 2 * 24 * 3);

    let one = [0xFF, 0xFF, 0x80];
    let zero = [0xFF, 0x00, 0x00];
    let groups: Vec<&[u8]> = buffer[..content].chunks_exact(3).collect();
    assert_eq!(groups.len(), 48);
    for (i, group) in groups.iter().enumerate() {
        // Bit 7 of the red channel is the lsb
        if i == 7 {
            assert_eq!(*group, &one[..], "bit {i}");
        } else {
            assert_eq!(*group, &zero[..], "bit {i}");
        }
    }
    assert_eq!(buffer[content], 0x00);
}

#[test]
fn empty_stream_is_only_framing() {
    let profile = ONE_BYTE_190NS;
    let mut buffer = [0xAAu8; 26];
    let mut pixels = Pixels::new(&[], ColorOrder::Rgb, FULL_SCALE);

    let content = encode(&profile.table, profile.framing, &mut pixels, &mut buffer).unwrap();

    assert_eq!(content, 0);
    assert_eq!(&buffer[..2], &[0x00, 0x00]);
    // Nothing past the framing is touched
    assert!(buffer[2..].iter().all(|b| *b == 0xAA));
}

/// Encode the first `n` of `colors` for every `n` up to the capacity of a
/// buffer sized for all of them, and decode each frame again
fn check_round_trip<const N: usize>(profile: Profile<N>, colors: &[RGB8]) {
    let capacity = colors.len();
    let idle = profile.table.idle();
    let leading = profile.framing.leading;
    for n in 0..=capacity {
        let mut buffer = vec![0xAAu8; profile.buffer_len(capacity)];
        let mut pixels = Pixels::new(&colors[..n], ColorOrder::Grb, FULL_SCALE);

        let content = encode(&profile.table, profile.framing, &mut pixels, &mut buffer).unwrap();

        assert_eq!(content, n * 24 * N, "{n} leds");
        let end = leading + content;
        assert!(buffer[..leading].iter().all(|b| *b == idle), "{n} leds");
        assert!(
            buffer[end..end + profile.framing.trailing].iter().all(|b| *b == idle),
            "{n} leds"
        );
        let components: Vec<u8> = colors[..n].iter().flat_map(|c| [c.g, c.r, c.b]).collect();
        assert_eq!(
            decode(&buffer[leading..end], profile.table.one(), profile.table.zero()),
            components,
            "{n} leds"
        );
        if n == capacity {
            assert_eq!(end + profile.framing.trailing, buffer.len());
        }
    }
}

#[test]
fn frames_decode_back_to_components() {
    let colors: Vec<RGB8> = (0..17u8)
        .map(|i| RGB8::new(i.wrapping_mul(37), i.wrapping_mul(101) ^ 0x5A, 255 - i))
        .collect();

    check_round_trip(ONE_BYTE_190NS, &colors);
    check_round_trip(THREE_BYTE_50NS, &colors);
    check_round_trip(ONE_BYTE_190NS, &colors[..1]);
}

#[test]
fn undersized_buffer_is_rejected_untouched() {
    let profile = ONE_BYTE_190NS;
    let mut buffer = [0xAAu8; 25];
    let colors = [RGB8::new(0x00, 0xFF, 0x00)];
    let mut pixels = Pixels::new(&colors, ColorOrder::Rgb, FULL_SCALE);

    assert_eq!(
        encode(&profile.table, profile.framing, &mut pixels, &mut buffer),
        Err(BufferTooSmall { len: 25, needed: 26 })
    );
    assert!(buffer.iter().all(|b| *b == 0xAA));

    let mut tiny = [0xAAu8; 1];
    assert!(matches!(
        FrameWriter::new(&profile.table, profile.framing, &mut tiny),
        Err(BufferTooSmall { len: 1, needed: 2 })
    ));

    let mut buffer = [0xAAu8; 25];
    let mut writer = FrameWriter::new(&profile.table, profile.framing, &mut buffer).unwrap();
    assert_eq!(
        writer.push([0, 0, 0]),
        Err(BufferTooSmall { len: 25, needed: 26 })
    );
    assert_eq!(writer.finish(), 0);
    assert_eq!(&buffer[..3], &[0x00, 0x00, 0xAA]);
}

#[test]
fn solid_color_fills_every_pixel() {
    let profile = ONE_BYTE_190NS;
    let mut buffer = vec![0u8; profile.buffer_len(4)];
    let mut pixels = Solid::new(RGB8::new(0x80, 0, 0x01), 3, ColorOrder::Rgb, FULL_SCALE);

    let content = encode(&profile.table, profile.framing, &mut pixels, &mut buffer).unwrap();

    assert_eq!(content, 3 * 24);
    assert_eq!(
        decode(&buffer[1..1 + content], &[0xFC], &[0xC0]),
        [0x80u8, 0, 0x01].repeat(3)
    );
}

#[test]
fn writer_counts_content_bytes() {
    let profile = THREE_BYTE_50NS;
    let mut buffer = vec![0u8; profile.buffer_len(1)];
    let mut writer = FrameWriter::new(&profile.table, profile.framing, &mut buffer).unwrap();
    assert_eq!(writer.content_len(), 0);
    writer.push([0xFF, 0x00, 0xFF]).unwrap();
    assert_eq!(writer.content_len(), 72);
    assert_eq!(writer.finish(), 72);
    assert_eq!(buffer[72], 0x00);
    assert_eq!(&buffer[..3], &[0xFF, 0xFF, 0x80]);
}
