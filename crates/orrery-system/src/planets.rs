//! Static planet fact sheet.
//!
//! Radii, distances and speeds are display constants tuned for the scene,
//! not physical values. Speeds are radians per second at time scale 1.

use std::collections::HashSet;
use std::fmt;

/// 8-bit sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::hex(0xFFFFFF);

    /// `0xRRGGBB` to a color.
    pub const fn hex(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xFF) as u8,
            g: ((value >> 8) & 0xFF) as u8,
            b: (value & 0xFF) as u8,
        }
    }

    /// Parse `#RRGGBB` (the leading `#` is optional).
    pub fn from_hex_str(s: &str) -> Option<Self> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Self::hex)
    }

    /// Linear-light RGB in `[0, 1]`, ready for shading.
    pub fn to_linear(self) -> [f32; 3] {
        fn channel(c: u8) -> f32 {
            let c = f32::from(c) / 255.0;
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        [channel(self.r), channel(self.g), channel(self.b)]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Planet classification shown as a badge in the info panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanetKind {
    Terrestrial,
    GasGiant,
    IceGiant,
}

impl PlanetKind {
    pub fn label(self) -> &'static str {
        match self {
            PlanetKind::Terrestrial => "Terrestrial",
            PlanetKind::GasGiant => "Gas Giant",
            PlanetKind::IceGiant => "Ice Giant",
        }
    }
}

impl fmt::Display for PlanetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A flat ring band around a planet, offsets relative to the planet radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingBand {
    pub inner_offset: f32,
    pub outer_offset: f32,
    pub color: Rgb,
    pub opacity: f32,
}

/// One immutable row of the fact sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanetRecord {
    pub name: &'static str,
    /// Display radius in scene units.
    pub radius: f32,
    /// Orbital distance from the sun in scene units.
    pub distance: f32,
    /// Orbital angular speed in radians per second at time scale 1.
    pub speed: f32,
    pub color: Rgb,
    pub kind: PlanetKind,
    pub moons: u32,
    pub description: &'static str,
    pub facts: &'static [&'static str],
    pub rings: &'static [RingBand],
}

/// Index into [`PLANETS`]. Only constructible for valid indices, so a
/// selection held as a `PlanetId` always names a real record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlanetId(u8);

impl PlanetId {
    /// `Some` when `index` is inside the table.
    pub fn new(index: usize) -> Option<Self> {
        (index < PLANETS.len()).then_some(Self(index as u8))
    }

    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    pub fn record(self) -> &'static PlanetRecord {
        &PLANETS[self.index()]
    }
}

const SATURN_RINGS: &[RingBand] = &[
    RingBand {
        inner_offset: 0.5,
        outer_offset: 1.2,
        color: Rgb::hex(0xCCCCCC),
        opacity: 0.7,
    },
    RingBand {
        inner_offset: 1.3,
        outer_offset: 1.8,
        color: Rgb::hex(0xAAAAAA),
        opacity: 0.5,
    },
];

/// Number of rows in [`PLANETS`].
pub const PLANET_COUNT: usize = 8;

/// The eight planets, innermost first.
pub static PLANETS: [PlanetRecord; PLANET_COUNT] = [
    PlanetRecord {
        name: "Mercury",
        radius: 0.4,
        distance: 8.0,
        speed: 0.02,
        color: Rgb::hex(0x8C7853),
        kind: PlanetKind::Terrestrial,
        moons: 0,
        description: "The closest planet to the Sun and the smallest in our solar system.",
        facts: &[
            "One day on Mercury lasts 59 Earth days",
            "Temperature ranges from -290°F to 800°F",
            "Has no atmosphere to speak of",
            "Named after the Roman messenger god",
        ],
        rings: &[],
    },
    PlanetRecord {
        name: "Venus",
        radius: 0.7,
        distance: 12.0,
        speed: 0.015,
        color: Rgb::hex(0xFFC649),
        kind: PlanetKind::Terrestrial,
        moons: 0,
        description: "The hottest planet in our solar system due to its thick atmosphere.",
        facts: &[
            "Surface temperature is about 900°F",
            "Has a thick, toxic atmosphere",
            "Rotates backwards compared to most planets",
            "Often called Earth's twin due to similar size",
        ],
        rings: &[],
    },
    PlanetRecord {
        name: "Earth",
        radius: 0.8,
        distance: 16.0,
        speed: 0.01,
        color: Rgb::hex(0x6B93D6),
        kind: PlanetKind::Terrestrial,
        moons: 1,
        description: "Our home planet, the only known planet with life.",
        facts: &[
            "71% of the surface is covered by water",
            "Has a strong magnetic field",
            "Only planet known to harbor life",
            "Has one natural satellite: the Moon",
        ],
        rings: &[],
    },
    PlanetRecord {
        name: "Mars",
        radius: 0.6,
        distance: 20.0,
        speed: 0.008,
        color: Rgb::hex(0xCD5C5C),
        kind: PlanetKind::Terrestrial,
        moons: 2,
        description: "The red planet, known for its iron oxide surface.",
        facts: &[
            "Has the largest volcano in the solar system",
            "A day on Mars is 24 hours and 37 minutes",
            "Has polar ice caps made of frozen CO2 and water",
            "Has two small moons: Phobos and Deimos",
        ],
        rings: &[],
    },
    PlanetRecord {
        name: "Jupiter",
        radius: 2.5,
        distance: 32.0,
        speed: 0.005,
        color: Rgb::hex(0xD8CA9D),
        kind: PlanetKind::GasGiant,
        moons: 79,
        description: "The largest planet in our solar system.",
        facts: &[
            "Has a Great Red Spot storm larger than Earth",
            "Made mostly of hydrogen and helium",
            "Has at least 79 known moons",
            "Acts as a cosmic vacuum cleaner for asteroids",
        ],
        rings: &[],
    },
    PlanetRecord {
        name: "Saturn",
        radius: 2.0,
        distance: 45.0,
        speed: 0.003,
        color: Rgb::hex(0xFAD5A5),
        kind: PlanetKind::GasGiant,
        moons: 82,
        description: "Famous for its spectacular ring system.",
        facts: &[
            "Has the most extensive ring system",
            "Less dense than water",
            "Has at least 82 known moons",
            "Takes 29.5 Earth years to orbit the Sun",
        ],
        rings: SATURN_RINGS,
    },
    PlanetRecord {
        name: "Uranus",
        radius: 1.5,
        distance: 60.0,
        speed: 0.002,
        color: Rgb::hex(0x4FD0E4),
        kind: PlanetKind::IceGiant,
        moons: 27,
        description: "An ice giant that rotates on its side.",
        facts: &[
            "Rotates on its side at a 98-degree angle",
            "Made of water, methane, and ammonia ices",
            "Has faint rings",
            "Has 27 known moons",
        ],
        rings: &[],
    },
    PlanetRecord {
        name: "Neptune",
        radius: 1.4,
        distance: 75.0,
        speed: 0.001,
        color: Rgb::hex(0x4169E1),
        kind: PlanetKind::IceGiant,
        moons: 14,
        description: "The windiest planet with speeds up to 1,200 mph.",
        facts: &[
            "Has the fastest winds in the solar system",
            "Takes 165 Earth years to orbit the Sun",
            "Has 14 known moons",
            "Made of water, methane, and ammonia ices",
        ],
        rings: &[],
    },
];

/// The whole table.
pub fn all() -> &'static [PlanetRecord] {
    &PLANETS
}

/// Every valid id, innermost planet first.
pub fn ids() -> impl Iterator<Item = PlanetId> {
    (0..PLANETS.len()).filter_map(PlanetId::new)
}

pub fn get(id: PlanetId) -> &'static PlanetRecord {
    id.record()
}

/// Case-insensitive lookup by name.
pub fn find(name: &str) -> Option<PlanetId> {
    PLANETS
        .iter()
        .position(|p| p.name.eq_ignore_ascii_case(name.trim()))
        .and_then(PlanetId::new)
}

/// A defect in a planet table.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TableError {
    #[error("planet name `{0}` appears more than once")]
    DuplicateName(&'static str),
    #[error("planet `{name}` has non-positive {field}: {value}")]
    NonPositive {
        name: &'static str,
        field: &'static str,
        value: f32,
    },
    #[error("planet `{0}` has an empty name or description")]
    MissingText(&'static str),
}

/// Check a table for unique names and strictly positive, finite numbers.
/// Moon counts may be zero.
pub fn validate(table: &[PlanetRecord]) -> Result<(), TableError> {
    let mut names = HashSet::new();
    for p in table {
        if p.name.is_empty() || p.description.is_empty() {
            return Err(TableError::MissingText(p.name));
        }
        if !names.insert(p.name.to_ascii_lowercase()) {
            return Err(TableError::DuplicateName(p.name));
        }
        for (field, value) in [
            ("radius", p.radius),
            ("distance", p.distance),
            ("speed", p.speed),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(TableError::NonPositive {
                    name: p.name,
                    field,
                    value,
                });
            }
        }
    }
    Ok(())
}
