//! CIE94 and CIEDE2000 color difference in Lab space.

use crate::color::Lab;

/// Parametric weights of the CIE94 formula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cie94Weights {
    pub kl: f64,
    pub k1: f64,
    pub k2: f64,
}

/// CIE94 weights for textiles.
pub const CIE94_TEXTILES: Cie94Weights = Cie94Weights {
    kl: 2.0,
    k1: 0.048,
    k2: 0.014,
};

/// CIE94 weights for graphic arts.
pub const CIE94_GRAPHIC_ARTS: Cie94Weights = Cie94Weights {
    kl: 1.0,
    k1: 0.045,
    k2: 0.015,
};

/// Squared CIE94 ΔE between two Lab colors. The first color is the reference.
pub fn cie94_squared(lab1: &Lab, lab2: &Lab, w: &Cie94Weights) -> f64 {
    let dl = lab1.l - lab2.l;
    let da = lab1.a - lab2.a;
    let db = lab1.b - lab2.b;
    let c1 = lab1.chroma();
    let c2 = lab2.chroma();
    let dc = c1 - c2;

    let dh_sq = da * da + db * db - dc * dc;
    let dh = if dh_sq < 0.0 { 0.0 } else { dh_sq.sqrt() };

    let l_term = dl / w.kl;
    let c_term = dc / (1.0 + w.k1 * c1);
    let h_term = dh / (1.0 + w.k2 * c1);
    l_term * l_term + c_term * c_term + h_term * h_term
}

const POW25_7: f64 = 6_103_515_625.0; // 25^7

/// Squared CIEDE2000 ΔE (kL = kC = kH = 1).
pub fn ciede2000_squared(lab1: &Lab, lab2: &Lab) -> f64 {
    let c1 = lab1.chroma();
    let c2 = lab2.chroma();
    let c_mean_7 = ((c1 + c2) / 2.0).powi(7);
    let g = 0.5 * (1.0 - (c_mean_7 / (c_mean_7 + POW25_7)).sqrt());

    let a1p = (1.0 + g) * lab1.a;
    let a2p = (1.0 + g) * lab2.a;
    let c1p = (a1p * a1p + lab1.b * lab1.b).sqrt();
    let c2p = (a2p * a2p + lab2.b * lab2.b).sqrt();
    let c1p_c2p = c1p * c2p;

    let h1p = hue_angle(lab1.b, a1p);
    let h2p = hue_angle(lab2.b, a2p);

    let dlp = lab2.l - lab1.l;
    let dcp = c2p - c1p;
    let dhp = hue_difference(c1p_c2p, h1p, h2p);
    let dhp_big = 2.0 * c1p_c2p.sqrt() * (dhp / 2.0).to_radians().sin();

    let lp_mean = (lab1.l + lab2.l) / 2.0;
    let cp_mean = (c1p + c2p) / 2.0;
    let hp_mean = hue_mean(c1p_c2p, h1p, h2p);

    let t = 1.0 - 0.17 * (hp_mean - 30.0).to_radians().cos()
        + 0.24 * (2.0 * hp_mean).to_radians().cos()
        + 0.32 * (3.0 * hp_mean + 6.0).to_radians().cos()
        - 0.20 * (4.0 * hp_mean - 63.0).to_radians().cos();

    let d_theta = 30.0 * (-((hp_mean - 275.0) / 25.0).powi(2)).exp();
    let cp_mean_7 = cp_mean.powi(7);
    let rc = 2.0 * (cp_mean_7 / (cp_mean_7 + POW25_7)).sqrt();

    let l50 = (lp_mean - 50.0) * (lp_mean - 50.0);
    let sl = 1.0 + 0.015 * l50 / (20.0 + l50).sqrt();
    let sc = 1.0 + 0.045 * cp_mean;
    let sh = 1.0 + 0.015 * cp_mean * t;
    let rt = -(2.0 * d_theta).to_radians().sin() * rc;

    let l_term = dlp / sl;
    let c_term = dcp / sc;
    let h_term = dhp_big / sh;
    l_term * l_term + c_term * c_term + h_term * h_term + rt * c_term * h_term
}

/// Hue angle in degrees, `0..360`.
fn hue_angle(b: f64, ap: f64) -> f64 {
    if b == 0.0 && ap == 0.0 {
        return 0.0;
    }
    let h = b.atan2(ap).to_degrees();
    if h < 0.0 {
        h + 360.0
    } else {
        h
    }
}

/// Signed hue difference, wrapped across 0/360.
fn hue_difference(c1p_c2p: f64, h1p: f64, h2p: f64) -> f64 {
    if c1p_c2p == 0.0 {
        return 0.0;
    }
    let diff = h2p - h1p;
    if diff.abs() <= 180.0 {
        diff
    } else if diff > 180.0 {
        diff - 360.0
    } else {
        diff + 360.0
    }
}

/// Mean hue, taking the short way around the circle.
fn hue_mean(c1p_c2p: f64, h1p: f64, h2p: f64) -> f64 {
    let sum = h1p + h2p;
    if c1p_c2p == 0.0 {
        return sum;
    }
    if (h1p - h2p).abs() <= 180.0 {
        sum / 2.0
    } else if sum < 360.0 {
        (sum + 360.0) / 2.0
    } else {
        (sum - 360.0) / 2.0
    }
}
