use geo::LineString;

/// Encode a lon/lat ring as an encoded polyline string (precision 1e-5).
/// Points are written in lat/lon order, the encoding's native axis order.
pub fn encode_polyline(ring: &LineString<f64>) -> String {
    fn push_value(out: &mut String, delta: i64) {
        let mut value = if delta < 0 { !(delta << 1) } else { delta << 1 };
        while value >= 0x20 {
            out.push(char::from((((value & 0x1f) | 0x20) + 63) as u8));
            value >>= 5;
        }
        out.push(char::from((value + 63) as u8));
    }

    let mut out = String::new();
    let (mut prev_lat, mut prev_lon) = (0i64, 0i64);
    for coord in ring.coords() {
        let lat = (coord.y * 1e5).round() as i64;
        let lon = (coord.x * 1e5).round() as i64;
        push_value(&mut out, lat - prev_lat);
        push_value(&mut out, lon - prev_lon);
        (prev_lat, prev_lon) = (lat, lon);
    }
    out
}
