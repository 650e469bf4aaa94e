//! Packed `0xAARRGGBB` colour helpers.

/// Packs channels into an ARGB value.
#[inline]
pub const fn rgba(red: u8, green: u8, blue: u8, alpha: u8) -> u32 {
    (alpha as u32) << 24 | (red as u32) << 16 | (green as u32) << 8 | blue as u32
}

/// Packs an opaque colour.
#[inline]
pub const fn rgb(red: u8, green: u8, blue: u8) -> u32 {
    rgba(red, green, blue, 0xff)
}

#[inline]
pub const fn alpha(color: u32) -> u8 {
    (color >> 24) as u8
}

#[inline]
pub const fn red(color: u32) -> u8 {
    (color >> 16) as u8
}

#[inline]
pub const fn green(color: u32) -> u8 {
    (color >> 8) as u8
}

#[inline]
pub const fn blue(color: u32) -> u8 {
    color as u8
}

/// Luminance weighted 11:16:5, the classic integer grey formula.
#[inline]
pub const fn gray(color: u32) -> u8 {
    ((red(color) as u32 * 11 + green(color) as u32 * 16 + blue(color) as u32 * 5) / 32) as u8
}

/// Converts a straight ARGB colour to premultiplied form.
pub fn premultiply(color: u32) -> u32 {
    let a = alpha(color) as u32;
    match a {
        0xff => color,
        0 => 0,
        _ => {
            let mul = |c: u8| ((c as u32 * a + 127) / 255) as u8;
            rgba(mul(red(color)), mul(green(color)), mul(blue(color)), a as u8)
        }
    }
}

/// Converts a premultiplied ARGB colour back to straight form.
pub fn unpremultiply(color: u32) -> u32 {
    let a = alpha(color) as u32;
    match a {
        0xff => color,
        0 => 0,
        _ => {
            let div = |c: u8| ((c as u32 * 255 + a / 2) / a).min(255) as u8;
            rgba(div(red(color)), div(green(color)), div(blue(color)), a as u8)
        }
    }
}

/// Composites the straight colour `top` over the premultiplied colour
/// `bottom`, returning a premultiplied result rounded once per channel.
pub fn source_over(bottom: u32, top: u32) -> u32 {
    let a = alpha(top) as u32;
    match a {
        0 => bottom,
        0xff => top,
        _ => {
            let inv = 255 - a;
            let mix = |t: u8, b: u8| ((a * t as u32 + inv * b as u32 + 127) / 255) as u8;
            rgba(
                mix(red(top), red(bottom)),
                mix(green(top), green(bottom)),
                mix(blue(top), blue(bottom)),
                ((a * 255 + inv * alpha(bottom) as u32 + 127) / 255) as u8,
            )
        }
    }
}

/// Per-channel average of two colours, without unpacking.
#[inline]
pub const fn color_mix_50(c1: u32, c2: u32) -> u32 {
    (((c1 ^ c2) & 0xfefe_fefe) >> 1) + (c1 & c2)
}

/// Three quarters of `c1`, one quarter of `c2`.
#[inline]
pub const fn color_mix_75(c1: u32, c2: u32) -> u32 {
    color_mix_50(c1, color_mix_50(c1, c2))
}

/// One quarter of `c1`, three quarters of `c2`.
#[inline]
pub const fn color_mix_25(c1: u32, c2: u32) -> u32 {
    color_mix_50(color_mix_50(c1, c2), c2)
}
