pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

/// Convert premultiplied RGBA8 back to straight alpha.
pub(crate) fn unpremul_rgba8(rgba: [u8; 4]) -> [u8; 4] {
    let [r, g, b, a] = rgba;
    if a == 0 {
        return [0, 0, 0, 0];
    }
    let a32 = u32::from(a);
    let un = |c: u8| ((u32::from(c) * 255 + a32 / 2) / a32).min(255) as u8;
    [un(r), un(g), un(b), a]
}
