use std::collections::BTreeMap;
use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::PaletteConfig;
use crate::error::{FleetError, Result};
use crate::record::normalize_id;

/// Fallback color for ids missing from a static palette.
pub const DEFAULT_FALLBACK_COLOR: &str = "#999";

/// Supplies colors for ids seen for the first time under the dynamic policy.
pub trait ColorSource: fmt::Debug + Send {
    fn next_color(&mut self) -> String;
}

/// Uniform random `#rrggbb` colors, reproducible when seeded.
#[derive(Debug)]
pub struct RandomColorSource {
    rng: StdRng,
}

impl RandomColorSource {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl ColorSource for RandomColorSource {
    fn next_color(&mut self) -> String {
        format!("#{:06x}", self.rng.gen_range(0..=0xFF_FFFFu32))
    }
}

/// Hands out colors from a fixed list in order, wrapping around.
#[derive(Debug, Clone)]
pub struct CyclingColorSource {
    colors: Vec<String>,
    next: usize,
}

impl CyclingColorSource {
    pub fn new<I, S>(colors: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let colors: Vec<String> = colors.into_iter().map(Into::into).collect();
        if colors.is_empty() {
            return Err(FleetError::Config(
                "cycle palette needs at least one color".to_string(),
            ));
        }
        Ok(Self { colors, next: 0 })
    }
}

impl ColorSource for CyclingColorSource {
    fn next_color(&mut self) -> String {
        let color = self.colors[self.next % self.colors.len()].clone();
        self.next = (self.next + 1) % self.colors.len();
        color
    }
}

#[derive(Debug)]
enum Policy {
    Static { fallback: String },
    Dynamic { source: Box<dyn ColorSource> },
}

/// Session-wide mapping from normalized facility id to display color.
///
/// Entries are only ever added. Under the static policy the table is fixed
/// at construction and unknown ids resolve to the fallback without being
/// stored; under the dynamic policy the first lookup of an unseen id draws a
/// color from the source and keeps it.
#[derive(Debug)]
pub struct ColorRegistry {
    policy: Policy,
    colors: BTreeMap<String, String>,
}

impl ColorRegistry {
    pub fn with_static_palette<I, K, V>(palette: I, fallback: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let colors = palette
            .into_iter()
            .map(|(id, color)| (normalize_id(id.as_ref()), color.into()))
            .collect();
        Self {
            policy: Policy::Static {
                fallback: fallback.into(),
            },
            colors,
        }
    }

    pub fn dynamic(source: impl ColorSource + 'static) -> Self {
        Self {
            policy: Policy::Dynamic {
                source: Box::new(source),
            },
            colors: BTreeMap::new(),
        }
    }

    pub fn from_config(config: &PaletteConfig) -> Result<Self> {
        config.validate()?;
        Ok(match config {
            PaletteConfig::Static { colors, fallback } => {
                Self::with_static_palette(colors, fallback.clone())
            }
            PaletteConfig::Random { seed } => Self::dynamic(RandomColorSource::new(*seed)),
            PaletteConfig::Cycle { colors } => {
                Self::dynamic(CyclingColorSource::new(colors.iter().cloned())?)
            }
        })
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.policy, Policy::Dynamic { .. })
    }

    /// Color for `id`, generating and storing one under the dynamic policy.
    ///
    /// A blank id names no facility: it gets the fallback color and is never
    /// stored.
    pub fn resolve(&mut self, id: &str) -> String {
        let key = normalize_id(id);
        if let Some(color) = self.colors.get(&key) {
            return color.clone();
        }
        match &mut self.policy {
            Policy::Static { fallback } => fallback.clone(),
            Policy::Dynamic { .. } if key.is_empty() => DEFAULT_FALLBACK_COLOR.to_string(),
            Policy::Dynamic { source } => {
                let color = source.next_color();
                debug!(facility_id = %key, color = %color, "assigned facility color");
                self.colors.insert(key, color.clone());
                color
            }
        }
    }

    /// Make sure `id` has a color. No-op under the static policy.
    pub fn pre_assign(&mut self, id: &str) {
        if self.is_dynamic() {
            self.resolve(id);
        }
    }

    /// Stored color for `id`, without generating one.
    pub fn lookup(&self, id: &str) -> Option<&str> {
        self.colors.get(&normalize_id(id)).map(String::as_str)
    }

    /// The id→color table in id order, for legends.
    pub fn legend(&self) -> Vec<(&str, &str)> {
        self.colors
            .iter()
            .map(|(id, color)| (id.as_str(), color.as_str()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle(colors: &[&str]) -> ColorRegistry {
        ColorRegistry::dynamic(CyclingColorSource::new(colors.iter().copied()).unwrap())
    }

    #[test]
    fn static_palette_falls_back_without_storing() {
        let mut reg = ColorRegistry::with_static_palette([("l07", "#e41a1c")], DEFAULT_FALLBACK_COLOR);
        assert_eq!(reg.resolve(" L07 "), "#e41a1c");
        assert_eq!(reg.resolve("X99"), "#999");
        reg.pre_assign("X99");
        assert_eq!(reg.lookup("X99"), None);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn dynamic_resolve_is_idempotent_and_case_insensitive() {
        let mut reg = cycle(&["#111111", "#222222"]);
        let first = reg.resolve("l07");
        assert_eq!(first, "#111111");
        assert_eq!(reg.resolve("L07"), first);
        assert_eq!(reg.resolve(" L07 "), first);
        assert_eq!(reg.resolve("L08"), "#222222");
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn blank_id_gets_fallback_without_an_entry() {
        let mut reg = cycle(&["#111111", "#222222"]);
        assert_eq!(reg.resolve(""), DEFAULT_FALLBACK_COLOR);
        assert_eq!(reg.resolve("   "), DEFAULT_FALLBACK_COLOR);
        reg.pre_assign(" ");
        assert!(reg.is_empty());
        // The first real facility still gets the first color
        assert_eq!(reg.resolve("L07"), "#111111");
    }

    #[test]
    fn from_config_rejects_colliding_static_ids() {
        let config = PaletteConfig::Static {
            colors: [("l07", "#1"), ("L07", "#2")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            fallback: DEFAULT_FALLBACK_COLOR.to_string(),
        };
        assert!(matches!(
            ColorRegistry::from_config(&config),
            Err(FleetError::Config(_))
        ));
    }

    #[test]
    fn pre_assign_stores_a_color() {
        let mut reg = cycle(&["#111111"]);
        assert!(reg.lookup("a1").is_none());
        reg.pre_assign("a1");
        assert_eq!(reg.lookup("A1"), Some("#111111"));
    }

    #[test]
    fn cycle_wraps_around() {
        let mut source = CyclingColorSource::new(["#a", "#b"]).unwrap();
        let drawn: Vec<String> = (0..3).map(|_| source.next_color()).collect();
        assert_eq!(drawn, ["#a", "#b", "#a"]);
    }

    #[test]
    fn empty_cycle_is_rejected() {
        assert!(CyclingColorSource::new(Vec::<String>::new()).is_err());
    }

    #[test]
    fn seeded_random_colors_are_reproducible_hex() {
        let mut a = RandomColorSource::new(Some(7));
        let mut b = RandomColorSource::new(Some(7));
        for _ in 0..16 {
            let color = a.next_color();
            assert_eq!(color, b.next_color());
            assert_eq!(color.len(), 7);
            assert!(color.starts_with('#'));
            assert!(color[1..].chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn legend_is_sorted_by_id() {
        let mut reg = cycle(&["#1", "#2"]);
        reg.resolve("zeta");
        reg.resolve("alpha");
        assert_eq!(reg.legend(), vec![("ALPHA", "#2"), ("ZETA", "#1")]);
    }
}
