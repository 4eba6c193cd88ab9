use anyhow::{anyhow, bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A user-defined activity label.
///
/// `id` is the slug of `name` taken when the category was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "shared::Category", into = "shared::Category")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: Rgb,
}

impl Category {
    /// Lowercase the name and keep only `[a-z0-9]`
    pub fn slug_for(name: &str) -> String {
        name.to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            .collect()
    }

    /// Categories offered before the user has created any of their own
    pub fn defaults() -> Vec<Category> {
        [
            ("fitness", "Fitness & Yoga", 0x28a745),
            ("meals", "Meals", 0xffc107),
            ("study", "Study", 0x17a2b8),
            ("exam", "Exams", 0xdc3545),
            ("travel", "Travel", 0x6f42c1),
        ]
        .into_iter()
        .map(|(id, name, color)| Category {
            id: id.to_string(),
            name: name.to_string(),
            color: Rgb(color),
        })
        .collect()
    }

    /// Check a whole category list: ids unique, names unique ignoring case
    pub fn validate_set(categories: &[Category]) -> anyhow::Result<()> {
        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for category in categories {
            if !ids.insert(category.id.as_str()) {
                bail!("Category id '{}' appears more than once", category.id);
            }
            if !names.insert(category.name.to_lowercase()) {
                bail!("Category name '{}' appears more than once", category.name);
            }
        }
        Ok(())
    }
}

impl TryFrom<shared::Category> for Category {
    type Error = anyhow::Error;

    fn try_from(dto: shared::Category) -> Result<Self, Self::Error> {
        if dto.id.trim().is_empty() {
            bail!("Category '{}' has an empty id", dto.name);
        }
        if dto.name.trim().is_empty() {
            bail!("Category '{}' has an empty name", dto.id);
        }
        let color = dto
            .color
            .parse::<Rgb>()
            .with_context(|| format!("Invalid color for category '{}'", dto.id))?;
        Ok(Category {
            id: dto.id,
            name: dto.name,
            color,
        })
    }
}

impl From<Category> for shared::Category {
    fn from(category: Category) -> Self {
        shared::Category {
            id: category.id,
            name: category.name,
            color: category.color.to_string(),
        }
    }
}

/// 24-bit RGB color, written as `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u32);

impl Rgb {
    fn channels(self) -> [i32; 3] {
        let value = self.0 & 0x00ff_ffff;
        [
            ((value >> 16) & 0xff) as i32,
            ((value >> 8) & 0xff) as i32,
            (value & 0xff) as i32,
        ]
    }

    fn from_channels(channels: [i32; 3]) -> Rgb {
        let [r, g, b] = channels.map(|c| c.clamp(0, 255) as u32);
        Rgb((r << 16) | (g << 8) | b)
    }

    fn shift(self, amount: f64) -> Rgb {
        let delta = (255.0 * amount).round() as i32;
        Rgb::from_channels(self.channels().map(|c| c + delta))
    }

    /// Add `round(255 * amount)` to every channel, clamped
    pub fn lighten(self, amount: f64) -> Rgb {
        self.shift(amount)
    }

    /// Subtract `round(255 * amount)` from every channel, clamped
    pub fn darken(self, amount: f64) -> Rgb {
        self.shift(-amount)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{:06x}", self.0 & 0x00ff_ffff)
    }
}

impl std::str::FromStr for Rgb {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(anyhow!("Color '{}' is not in #rrggbb form", s));
        }
        let value = u32::from_str_radix(hex, 16)?;
        Ok(Rgb(value))
    }
}
