// Geodesy module - UTM zone selection and coordinate projection
//
// Provides:
// - UTM EPSG code selection from a (lat, lon) in degrees
// - WGS84 lat/lon <-> UTM easting/northing (transverse Mercator,
//   Karney series, sub-centimetre inside a zone)
//
// Uses WGS84 ellipsoid model for Earth

use crate::error::{OdscanError, Result};
use std::f64::consts::PI;

/// Degrees to radians conversion factor
const DTOR: f64 = PI / 180.0;

/// Radians to degrees conversion factor
const RTOD: f64 = 180.0 / PI;

/// WGS84 ellipsoid semi-major axis (equatorial radius) in meters
const WGS84_A: f64 = 6378137.0;

/// WGS84 ellipsoid flattening factor
const WGS84_F: f64 = 1.0 / 298.257223563;

/// UTM scale factor on the central meridian
const UTM_K0: f64 = 0.9996;

/// UTM false easting in meters
const FALSE_EASTING: f64 = 500_000.0;

/// UTM false northing for the southern hemisphere in meters
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Third flattening of the WGS84 ellipsoid
#[inline]
fn third_flattening() -> f64 {
    WGS84_F / (2.0 - WGS84_F)
}

/// Rectifying radius A = a/(1+n) * (1 + n^2/4 + n^4/64)
#[inline]
fn rectifying_radius() -> f64 {
    let n = third_flattening();
    WGS84_A / (1.0 + n) * (1.0 + n * n / 4.0 + n * n * n * n / 64.0)
}

/// Forward series coefficients (geographic -> transverse Mercator)
#[inline]
fn alpha() -> [f64; 3] {
    let n = third_flattening();
    let n2 = n * n;
    let n3 = n2 * n;
    [
        n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0,
        13.0 * n2 / 48.0 - 3.0 * n3 / 5.0,
        61.0 * n3 / 240.0,
    ]
}

/// Inverse series coefficients (transverse Mercator -> conformal)
#[inline]
fn beta() -> [f64; 3] {
    let n = third_flattening();
    let n2 = n * n;
    let n3 = n2 * n;
    [
        n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0,
        n2 / 48.0 + n3 / 15.0,
        17.0 * n3 / 480.0,
    ]
}

/// Series coefficients from conformal to geographic latitude
#[inline]
fn delta() -> [f64; 3] {
    let n = third_flattening();
    let n2 = n * n;
    let n3 = n2 * n;
    [
        2.0 * n - 2.0 * n2 / 3.0 - 2.0 * n3,
        7.0 * n2 / 3.0 - 8.0 * n3 / 5.0,
        56.0 * n3 / 15.0,
    ]
}

/// Returns the EPSG code string of the UTM zone covering a coordinate.
///
/// Northern hemisphere zones map to EPSG:326xx, southern to EPSG:327xx.
/// UTM is only defined for latitudes in [-80, 84]; anything outside is
/// a hard error, there is no fallback projection.
pub fn utm_epsg(latitude: f64, longitude: f64) -> Result<String> {
    if !(-80.0..=84.0).contains(&latitude) {
        return Err(OdscanError::UtmLatitudeOutOfRange(latitude));
    }

    let zone = ((longitude + 180.0) / 6.0) as u32 + 1;
    let zone = zone.min(60);

    let code = if latitude >= 0.0 {
        32600 + zone
    } else {
        32700 + zone
    };

    Ok(format!("EPSG:{}", code))
}

/// A WGS84 -> UTM transverse Mercator projection for one zone.
///
/// All entities in a run share a single projection; the zone is either
/// configured explicitly or auto-selected from the median coordinate
/// of the cleaned input.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    zone: u8,
    north: bool,
}

impl Projection {
    /// Parse a projected CRS string of the form "EPSG:326xx" (northern
    /// hemisphere) or "EPSG:327xx" (southern hemisphere).
    pub fn from_epsg(crs: &str) -> Result<Self> {
        let code: u32 = crs
            .strip_prefix("EPSG:")
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| OdscanError::UnsupportedCrs(crs.to_string()))?;

        let (base, north) = if (32601..=32660).contains(&code) {
            (32600, true)
        } else if (32701..=32760).contains(&code) {
            (32700, false)
        } else {
            return Err(OdscanError::UnsupportedCrs(crs.to_string()));
        };

        Ok(Projection {
            zone: (code - base) as u8,
            north,
        })
    }

    /// Central meridian of this zone in radians.
    fn central_meridian(&self) -> f64 {
        ((self.zone as f64 - 1.0) * 6.0 - 180.0 + 3.0) * DTOR
    }

    /// Projects WGS84 lat/lon in degrees to (easting, northing) in meters.
    pub fn forward(&self, latitude: f64, longitude: f64) -> (f64, f64) {
        let lat = latitude * DTOR;
        let dl = longitude * DTOR - self.central_meridian();

        let n = third_flattening();
        let e = 2.0 * n.sqrt() / (1.0 + n);

        // Conformal latitude
        let sin_lat = lat.sin();
        let t = (sin_lat.atanh() - e * (e * sin_lat).atanh()).sinh();

        let xi_p = t.atan2(dl.cos());
        let eta_p = (dl.sin() / (1.0 + t * t).sqrt()).atanh();

        let a = alpha();
        let mut xi = xi_p;
        let mut eta = eta_p;
        for (j, &aj) in a.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            xi += aj * (k * xi_p).sin() * (k * eta_p).cosh();
            eta += aj * (k * xi_p).cos() * (k * eta_p).sinh();
        }

        let ra = rectifying_radius();
        let x = FALSE_EASTING + UTM_K0 * ra * eta;
        let mut y = UTM_K0 * ra * xi;
        if !self.north {
            y += FALSE_NORTHING_SOUTH;
        }

        (x, y)
    }

    /// Projects (easting, northing) in meters back to WGS84 lat/lon in degrees.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let ra = rectifying_radius();

        let northing = if self.north {
            y
        } else {
            y - FALSE_NORTHING_SOUTH
        };
        let xi = northing / (UTM_K0 * ra);
        let eta = (x - FALSE_EASTING) / (UTM_K0 * ra);

        let b = beta();
        let mut xi_p = xi;
        let mut eta_p = eta;
        for (j, &bj) in b.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            xi_p -= bj * (k * xi).sin() * (k * eta).cosh();
            eta_p -= bj * (k * xi).cos() * (k * eta).sinh();
        }

        let chi = (xi_p.sin() / eta_p.cosh()).asin();

        let d = delta();
        let mut lat = chi;
        for (j, &dj) in d.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            lat += dj * (k * chi).sin();
        }

        let lon = self.central_meridian() + eta_p.sinh().atan2(xi_p.cos());

        (lat * RTOD, lon * RTOD)
    }
}
