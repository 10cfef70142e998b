//! Encoded-polyline codec.
//!
//! Coordinates are delta-encoded as zigzag-signed integers at 1e-5 degree
//! precision, split into 5-bit chunks with a 0x20 continuation bit and an
//! ASCII offset of 63. The decoder is infallible: a truncated trailing
//! chunk or an unpaired latitude simply ends the sequence, and callers
//! treat an empty result as "no usable path".

use crate::geo::LatLng;

const PRECISION: f64 = 1e5;
const ASCII_OFFSET: u8 = 63;
const CONTINUATION_BIT: i64 = 0x20;
const CHUNK_MASK: i64 = 0x1f;

#[must_use]
pub fn decode(encoded: &str) -> Vec<LatLng> {
    let bytes = encoded.as_bytes();
    let mut points = Vec::new();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    loop {
        let Some((delta_lat, next)) = decode_value(bytes, index) else {
            break;
        };
        let Some((delta_lng, after)) = decode_value(bytes, next) else {
            break;
        };
        lat += delta_lat;
        lng += delta_lng;
        index = after;
        #[allow(clippy::cast_precision_loss)]
        points.push(LatLng::new(lat as f64 / PRECISION, lng as f64 / PRECISION));
    }

    points
}

fn decode_value(bytes: &[u8], mut index: usize) -> Option<(i64, usize)> {
    let mut accumulated: i64 = 0;
    let mut shift = 0u32;

    loop {
        let byte = *bytes.get(index)?;
        let chunk = i64::from(byte.checked_sub(ASCII_OFFSET)?);
        index += 1;
        if shift > 60 {
            // Corrupt continuation run; there is no error path here.
            return None;
        }
        accumulated |= (chunk & CHUNK_MASK) << shift;
        shift += 5;
        if chunk & CONTINUATION_BIT == 0 {
            break;
        }
    }

    let delta = if accumulated & 1 == 1 {
        !(accumulated >> 1)
    } else {
        accumulated >> 1
    };
    Some((delta, index))
}

#[must_use]
pub fn encode(points: &[LatLng]) -> String {
    let mut out = String::with_capacity(points.len() * 8);
    let mut previous_lat: i64 = 0;
    let mut previous_lng: i64 = 0;

    for point in points {
        let lat = quantize(point.lat);
        let lng = quantize(point.lng);
        encode_value(lat - previous_lat, &mut out);
        encode_value(lng - previous_lng, &mut out);
        previous_lat = lat;
        previous_lng = lng;
    }

    out
}

#[allow(clippy::cast_possible_truncation)]
fn quantize(degrees: f64) -> i64 {
    (degrees * PRECISION).round() as i64
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn encode_value(value: i64, out: &mut String) {
    let mut zigzag = if value < 0 { !(value << 1) } else { value << 1 } as u64;
    while zigzag >= 0x20 {
        out.push((((0x20 | (zigzag & 0x1f)) as u8) + ASCII_OFFSET) as char);
        zigzag >>= 5;
    }
    out.push(((zigzag as u8) + ASCII_OFFSET) as char);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const REFERENCE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

    fn assert_close(actual: LatLng, lat: f64, lng: f64) {
        assert!((actual.lat - lat).abs() < 1e-9, "lat {} != {lat}", actual.lat);
        assert!((actual.lng - lng).abs() < 1e-9, "lng {} != {lng}", actual.lng);
    }

    #[test]
    fn decodes_reference_fixture() {
        let points = decode(REFERENCE);
        assert_eq!(points.len(), 3);
        assert_close(points[0], 38.5, -120.2);
        assert_close(points[1], 40.7, -120.95);
        assert_close(points[2], 43.252, -126.453);
    }

    #[test]
    fn encodes_reference_fixture() {
        let points = [
            LatLng::new(38.5, -120.2),
            LatLng::new(40.7, -120.95),
            LatLng::new(43.252, -126.453),
        ];
        assert_eq!(encode(&points), REFERENCE);
    }

    #[test]
    fn empty_input_yields_no_points() {
        assert!(decode("").is_empty());
    }

    #[test]
    fn truncated_trailing_chunk_is_dropped() {
        // Last longitude value cut mid-chunk: the complete pairs survive.
        let full = decode(REFERENCE);
        let truncated = decode(&REFERENCE[..REFERENCE.len() - 1]);
        assert_eq!(truncated.len(), full.len() - 1);
        assert_eq!(truncated[0], full[0]);
    }

    #[test]
    fn unpaired_latitude_is_dropped() {
        // A single encoded value has no longitude partner.
        let mut out = String::new();
        encode_value(3850_000, &mut out);
        assert!(decode(&out).is_empty());
    }

    proptest! {
        #[test]
        fn round_trips_quantized_points(
            raw in proptest::collection::vec((-90_00000i64..=90_00000, -180_00000i64..=180_00000), 0..32)
        ) {
            #[allow(clippy::cast_precision_loss)]
            let points: Vec<LatLng> = raw
                .iter()
                .map(|&(lat, lng)| LatLng::new(lat as f64 / 1e5, lng as f64 / 1e5))
                .collect();
            let decoded = decode(&encode(&points));
            prop_assert_eq!(decoded.len(), points.len());
            for (decoded, original) in decoded.iter().zip(&points) {
                prop_assert!((decoded.lat - original.lat).abs() < 1e-9);
                prop_assert!((decoded.lng - original.lng).abs() < 1e-9);
            }
        }
    }
}
