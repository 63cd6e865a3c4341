//! Apparent wind from true wind + boat speed

/// Compute apparent wind (speed kts, angle deg) from true wind and boat
/// speed.
///
/// The angle is folded to [0, 180] by absolute value, so the port /
/// starboard distinction is not carried. Returns (0, 0) when there is no
/// true wind.
pub fn apparent_wind(tws_kts: f64, twa_deg: f64, boat_speed_kts: f64) -> (f64, f64) {
    if tws_kts == 0.0 {
        return (0.0, 0.0);
    }

    let twa_rad = twa_deg.to_radians();

    // True wind vector: x across the boat, y along the course
    let twx = tws_kts * twa_rad.sin();
    let twy = tws_kts * twa_rad.cos();

    // Apparent wind = true wind - boat velocity
    let awx = twx;
    let awy = twy - boat_speed_kts;

    let aws = (awx * awx + awy * awy).sqrt();
    let awa = awx.atan2(awy).to_degrees().abs();

    (aws, awa)
}
