pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

/// Blend a straight-alpha RGBA8 pixel over an opaque RGB8 pixel.
pub(crate) fn over_opaque(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let a = u16::from(src[3]);
    if a == 255 {
        return [src[0], src[1], src[2], 255];
    }
    if a == 0 {
        return [dst[0], dst[1], dst[2], 255];
    }
    let inv = 255 - a;
    let mut out = [0u8, 0, 0, 255];
    for i in 0..3 {
        let v = mul_div255_u16(u16::from(src[i]), a) + mul_div255_u16(u16::from(dst[i]), inv);
        out[i] = v.min(255) as u8;
    }
    out
}

/// Blend a premultiplied RGBA8 pixel over an opaque RGB8 pixel.
pub(crate) fn premul_over_opaque(dst: [u8; 4], src_premul: [u8; 4]) -> [u8; 4] {
    let inv = 255 - u16::from(src_premul[3]);
    let mut out = [0u8, 0, 0, 255];
    for i in 0..3 {
        let v = u16::from(src_premul[i]) + mul_div255_u16(u16::from(dst[i]), inv);
        out[i] = v.min(255) as u8;
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
