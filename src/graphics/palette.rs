use image::Rgba;

pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

pub const CGA_PALETTE: [Rgba<u8>; 4] = [
    Rgba([0, 0, 0, 255]),
    Rgba([0, 255, 255, 255]),
    Rgba([255, 0, 255, 255]),
    Rgba([255, 255, 255, 255]),
];

pub const EGA_PALETTE: [Rgba<u8>; 16] = [
    Rgba([0, 0, 0, 255]),
    Rgba([0, 0, 170, 255]),
    Rgba([0, 170, 0, 255]),
    Rgba([0, 170, 170, 255]),
    Rgba([170, 0, 0, 255]),
    Rgba([170, 0, 170, 255]),
    Rgba([170, 85, 0, 255]),
    Rgba([170, 170, 170, 255]),
    Rgba([85, 85, 85, 255]),
    Rgba([85, 85, 255, 255]),
    Rgba([85, 255, 85, 255]),
    Rgba([85, 255, 255, 255]),
    Rgba([255, 85, 85, 255]),
    Rgba([255, 85, 255, 255]),
    Rgba([255, 255, 85, 255]),
    Rgba([255, 255, 255, 255]),
];
