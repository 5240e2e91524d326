use macroquad::color::{Color, YELLOW};
use rand::Rng;

pub const BACKGROUND: Color = rgb(0x000000);
/// Walls, baffles, pegs and dividers.
pub const FOREGROUND: Color = rgb(0x555555);

pub const BALL_COLORS: [Color; 8] = [
    rgb(0xff2d55),
    rgb(0x5856d6),
    rgb(0xff9500),
    rgb(0xffcc00),
    rgb(0xff3b30),
    rgb(0x5ac8fa),
    rgb(0x007aff),
    rgb(0x4cd964),
];

pub const fn rgb(hex: u32) -> Color {
    Color::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
        1.0,
    )
}

/// Pick one colour for every ball on a board. Falls back to yellow on an empty palette.
pub fn sample<R: Rng + ?Sized>(colors: &[Color], rng: &mut R) -> Color {
    if colors.is_empty() {
        return YELLOW;
    }
    colors[rng.gen_range(0..colors.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn rgb_splits_channels() {
        let c = rgb(0xff9500);
        assert_eq!(c.r, 1.0);
        assert!((c.g - 149.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.b, 0.0);
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn sample_stays_in_palette() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..32 {
            let c = sample(&BALL_COLORS, &mut rng);
            assert!(BALL_COLORS.contains(&c));
        }
    }

    #[test]
    fn empty_palette_is_yellow() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(sample(&[], &mut rng), YELLOW);
    }
}
