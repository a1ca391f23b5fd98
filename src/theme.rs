//! Level themes
//!
//! Twenty mood themes cycle every five levels; boss levels always use the
//! arena theme. Themes are pure data - the renderer decides what the colours mean.

use rand::Rng;

/// Number of consecutive levels that share a theme
pub const LEVELS_PER_THEME: u32 = 5;

/// Music track played during boss fights
pub const BOSS_TRACK: &str = "bossBattle";

/// A platform colour in HSL (hue degrees, saturation/lightness percent)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

/// Distance fog
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: u32,
    pub near: f32,
    pub far: f32,
}

/// Randomised HSL range used to tint each platform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub hue: (f32, f32),
    pub saturation: (f32, f32),
    pub lightness: (f32, f32),
}

impl Palette {
    const fn new(hue: (f32, f32), saturation: (f32, f32), lightness: (f32, f32)) -> Self {
        Self {
            hue,
            saturation,
            lightness,
        }
    }
}

/// A visual/mood theme
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    /// Translation key, e.g. `themes.prairie`
    pub name_key: &'static str,
    /// Background clear colour (0xRRGGBB)
    pub background: u32,
    pub fog: Fog,
    /// Ambient light intensity
    pub ambient_light: f32,
    pub palette: Palette,
}

impl Theme {
    /// Short name (the part after `themes.`)
    pub fn short_name(&self) -> &'static str {
        self.name_key
            .split_once('.')
            .map(|(_, name)| name)
            .unwrap_or(self.name_key)
    }

    /// Music track looped while this theme is on screen
    pub fn music_track(&self) -> &'static str {
        if self.name_key == BOSS_THEME.name_key {
            BOSS_TRACK
        } else {
            self.short_name()
        }
    }

    /// Sample a platform colour from the theme palette
    pub fn platform_color<R: Rng + ?Sized>(&self, rng: &mut R) -> Hsl {
        let Palette {
            hue,
            saturation,
            lightness,
        } = self.palette;
        let h = (hue.0 + rng.random::<f32>() * hue.1) % 360.0;
        let s = saturation.0 + rng.random::<f32>() * saturation.1;
        let l = lightness.0 + rng.random::<f32>() * lightness.1;
        Hsl { h, s, l }
    }
}

const fn theme(
    name_key: &'static str,
    background: u32,
    fog: (u32, f32, f32),
    ambient_light: f32,
    palette: Palette,
) -> Theme {
    Theme {
        name_key,
        background,
        fog: Fog {
            color: fog.0,
            near: fog.1,
            far: fog.2,
        },
        ambient_light,
        palette,
    }
}

/// Regular level themes in play order
pub static LEVEL_THEMES: [Theme; 20] = [
    theme("themes.prairie", 0x87CEEB, (0x87CEEB, 50.0, 150.0), 0.8,
        Palette::new((120.0, 40.0), (70.0, 0.0), (50.0, 0.0))),
    theme("themes.desert", 0xF0E68C, (0xF0E68C, 40.0, 140.0), 0.9,
        Palette::new((30.0, 20.0), (50.0, 20.0), (60.0, 10.0))),
    theme("themes.lava_cave", 0x110500, (0x8B0000, 20.0, 100.0), 0.5,
        Palette::new((10.0, 20.0), (30.0, 0.0), (20.0, 10.0))),
    theme("themes.haunted_forest", 0x0A190A, (0x1A2A1A, 30.0, 110.0), 0.4,
        Palette::new((90.0, 20.0), (25.0, 0.0), (25.0, 10.0))),
    theme("themes.glacier", 0xDDEEFF, (0xDDEEFF, 30.0, 120.0), 0.9,
        Palette::new((190.0, 20.0), (80.0, 0.0), (70.0, 10.0))),
    theme("themes.seabed", 0x00008B, (0x0000CD, 25.0, 100.0), 0.6,
        Palette::new((200.0, 40.0), (70.0, 0.0), (40.0, 10.0))),
    theme("themes.cyberpunk", 0x000022, (0x2A004A, 40.0, 130.0), 0.6,
        Palette::new((280.0, 60.0), (90.0, 0.0), (30.0, 0.0))),
    theme("themes.ancient_ruins", 0x998B7E, (0x998B7E, 45.0, 145.0), 0.7,
        Palette::new((35.0, 15.0), (20.0, 0.0), (50.0, 15.0))),
    theme("themes.sky_city", 0xB0E0E6, (0xB0E0E6, 60.0, 160.0), 0.95,
        Palette::new((50.0, 20.0), (70.0, 0.0), (80.0, 0.0))),
    theme("themes.candyland", 0xFFC0CB, (0xFFD1DC, 40.0, 130.0), 0.9,
        Palette::new((330.0, 40.0), (100.0, 0.0), (85.0, 0.0))),
    theme("themes.volcanic_ash", 0x222222, (0x444444, 15.0, 90.0), 0.3,
        Palette::new((0.0, 0.0), (0.0, 0.0), (15.0, 10.0))),
    theme("themes.crystal_caverns", 0x191970, (0x30195C, 25.0, 110.0), 0.5,
        Palette::new((240.0, 60.0), (80.0, 0.0), (55.0, 0.0))),
    theme("themes.mushroom_forest", 0x00203F, (0xADEFD1, 30.0, 120.0), 0.4,
        Palette::new((160.0, 40.0), (60.0, 0.0), (40.0, 0.0))),
    theme("themes.gloom_swamp", 0x2F4F4F, (0x556B2F, 20.0, 95.0), 0.4,
        Palette::new((85.0, 20.0), (30.0, 0.0), (20.0, 0.0))),
    theme("themes.steampunk_city", 0x6B4F3A, (0x8B7355, 35.0, 125.0), 0.6,
        Palette::new((25.0, 10.0), (40.0, 0.0), (35.0, 0.0))),
    theme("themes.cosmic_void", 0x000010, (0x100020, 50.0, 150.0), 0.7,
        Palette::new((250.0, 80.0), (90.0, 0.0), (50.0, 0.0))),
    theme("themes.japanese_garden", 0x98FB98, (0xADFF2F, 40.0, 130.0), 0.8,
        Palette::new((100.0, 20.0), (40.0, 0.0), (60.0, 0.0))),
    theme("themes.autumn_forest", 0xD2691E, (0xFFA500, 30.0, 110.0), 0.75,
        Palette::new((20.0, 25.0), (80.0, 0.0), (50.0, 0.0))),
    theme("themes.synthwave_sunset", 0x2E0249, (0x570A57, 40.0, 140.0), 0.6,
        Palette::new((310.0, 40.0), (95.0, 0.0), (45.0, 0.0))),
    theme("themes.toy_room", 0xFFFFE0, (0xFFFFF0, 50.0, 150.0), 0.9,
        Palette::new((0.0, 360.0), (90.0, 0.0), (70.0, 0.0))),
];

/// Dark red arena used by every boss level
pub static BOSS_THEME: Theme = theme(
    "themes.boss_arena",
    0x100010,
    (0x8B0000, 15.0, 80.0),
    0.3,
    Palette::new((0.0, 0.0), (30.0, 0.0), (15.0, 0.0)),
);

/// Theme for a regular level (levels 1-5 share the first theme, and so on)
pub fn theme_for_level(level: u32) -> &'static Theme {
    let index = (level.saturating_sub(1) / LEVELS_PER_THEME) as usize % LEVEL_THEMES.len();
    &LEVEL_THEMES[index]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_theme_cycles_every_five_levels() {
        assert_eq!(theme_for_level(1).name_key, "themes.prairie");
        assert_eq!(theme_for_level(5).name_key, "themes.prairie");
        assert_eq!(theme_for_level(6).name_key, "themes.desert");
        assert_eq!(theme_for_level(100).name_key, "themes.toy_room");
        // Wraps back to the start after 100 levels
        assert_eq!(theme_for_level(101).name_key, "themes.prairie");
    }

    #[test]
    fn test_music_track_names() {
        assert_eq!(theme_for_level(12).music_track(), "lava_cave");
        assert_eq!(BOSS_THEME.music_track(), BOSS_TRACK);
    }

    #[test]
    fn test_platform_color_stays_in_palette() {
        let mut rng = Pcg32::seed_from_u64(7);
        for theme in &LEVEL_THEMES {
            for _ in 0..20 {
                let c = theme.platform_color(&mut rng);
                assert!((0.0..360.0).contains(&c.h));
                assert!(c.s >= theme.palette.saturation.0);
                assert!(c.s <= theme.palette.saturation.0 + theme.palette.saturation.1);
                assert!(c.l >= theme.palette.lightness.0);
            }
        }
    }
}
