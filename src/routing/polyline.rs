//! Encoded polyline decoding (precision 5).

use crate::error::RoutingError;
use crate::routing::Coordinate;

const FACTOR: f64 = 1e5;

/// Decode an encoded polyline into `[lon, lat]` pairs.
pub fn decode(encoded: &str) -> Result<Vec<Coordinate>, RoutingError> {
    let bytes = encoded.as_bytes();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lon: i64 = 0;
    let mut points = Vec::new();

    while index < bytes.len() {
        lat += next_value(bytes, &mut index)?;
        lon += next_value(bytes, &mut index)?;
        points.push([lon as f64 / FACTOR, lat as f64 / FACTOR]);
    }

    Ok(points)
}

fn next_value(bytes: &[u8], index: &mut usize) -> Result<i64, RoutingError> {
    let mut result: i64 = 0;
    let mut shift = 0;

    loop {
        let byte = match bytes.get(*index) {
            Some(&b) => b,
            None => return Err(RoutingError::Transient("truncated polyline".into())),
        };
        if !(63..127).contains(&byte) || shift > 60 {
            return Err(RoutingError::Transient(format!("invalid polyline byte {} at {}", byte, index)));
        }
        *index += 1;

        let chunk = (byte - 63) as i64;
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }

    Ok(if result & 1 == 1 { !(result >> 1) } else { result >> 1 })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Coordinate, b: Coordinate) -> bool {
        (a[0] - b[0]).abs() < 1e-9 && (a[1] - b[1]).abs() < 1e-9
    }

    #[test]
    fn test_reference_polyline() {
        // (38.5, -120.2), (40.7, -120.95), (43.252, -126.453)
        let points = decode("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
        assert_eq!(points.len(), 3);
        assert!(close(points[0], [-120.2, 38.5]));
        assert!(close(points[1], [-120.95, 40.7]));
        assert!(close(points[2], [-126.453, 43.252]));
    }

    #[test]
    fn test_empty_polyline() {
        assert!(decode("").unwrap().is_empty());
    }

    #[test]
    fn test_truncated_polyline_rejected() {
        assert!(decode("_p~iF~ps|").is_err());
        assert!(decode("_p~iF").is_err());
    }

    #[test]
    fn test_invalid_character_rejected() {
        assert!(decode("_p~iF\n~ps|U").is_err());
    }
}
