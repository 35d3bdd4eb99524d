//! Static species catalog helpers: sprite sets and sprite URL lookup.
//!
//! Read-only data; nothing here touches the replicated state.

use once_cell::sync::Lazy;
use regex::Regex;

use dexwatch_protocol::{SpeciesRef, SpriteSet};

pub const SPRITE_BASE_URL: &str = "https://play.pokemonshowdown.com/sprites/";

static SPRITE_SLUG: Lazy<Regex> =
    Lazy::new(|| Regex::new("[^a-z0-9]").expect("sprite slug pattern compiles"));

static SPRITE_SETS: Lazy<Vec<SpriteSet>> = Lazy::new(|| {
    [
        ("Red/Blue/Yellow", "gen1rb", 1),
        ("Red/Green", "gen1rg", 1),
        ("Gold/Silver/Crystal", "gen2", 2),
        ("Gold/Silver (Shiny)", "gen2-shiny", 2),
        ("Ruby/Sapphire/Emerald", "gen3", 3),
        ("Ruby/Sapphire/Emerald (Shiny)", "gen3rs-shiny", 3),
        ("FireRed/LeafGreen", "gen3frlg-shiny", 3),
        ("Diamond/Pearl/Platinum", "gen4", 4),
        ("Diamond/Pearl/Platinum (Shiny)", "gen4-shiny", 4),
        ("Black/White", "gen5", 5),
        ("Black/White (Shiny)", "gen5-shiny", 5),
        ("Black/White (Animated)", "gen5ani", 5),
        ("Black/White (Animated, Shiny)", "gen5ani-shiny", 5),
        ("X/Y", "gen6", 6),
    ]
    .into_iter()
    .map(|(name, path, gen)| SpriteSet {
        name: name.to_string(),
        path: path.to_string(),
        gen,
    })
    .collect()
});

pub fn builtin_sprite_sets() -> &'static [SpriteSet] {
    &SPRITE_SETS
}

pub fn find_sprite_set(path: &str) -> Option<&'static SpriteSet> {
    SPRITE_SETS.iter().find(|set| set.path == path)
}

/// The sprite file for a species: an explicit override wins, otherwise the
/// species name is slugged (lowercased, non-alphanumerics stripped).
pub fn sprite_file_name(species: &SpeciesRef) -> String {
    if let Some(sprite) = species.sprite.as_ref() {
        return sprite.clone();
    }
    let lowered = species.name.to_lowercase();
    format!("{}.png", SPRITE_SLUG.replace_all(&lowered, ""))
}

pub fn sprite_url(set: &SpriteSet, species: &SpeciesRef) -> String {
    format!(
        "{}{}/{}",
        SPRITE_BASE_URL,
        set.path,
        sprite_file_name(species)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn species(name: &str, sprite: Option<&str>) -> SpeciesRef {
        SpeciesRef {
            id: 1,
            name: name.to_string(),
            sprite: sprite.map(|s| s.to_string()),
            default_state: None,
        }
    }

    #[test]
    fn builtin_sets_cover_every_generation_once() {
        let sets = builtin_sprite_sets();
        assert_eq!(sets.len(), 14);
        assert!(sets.iter().any(|set| set.path == "gen1rb"));
        assert!(sets.iter().all(|set| (1..=6).contains(&set.gen)));
    }

    #[test]
    fn find_sprite_set_matches_by_path() {
        assert_eq!(find_sprite_set("gen2").map(|s| s.gen), Some(2));
        assert!(find_sprite_set("gen99").is_none());
    }

    #[test]
    fn sprite_file_slugs_awkward_names() {
        assert_eq!(sprite_file_name(&species("Pikachu", None)), "pikachu.png");
        assert_eq!(sprite_file_name(&species("Mr. Mime", None)), "mrmime.png");
        assert_eq!(
            sprite_file_name(&species("Farfetch'd", None)),
            "farfetchd.png"
        );
    }

    #[test]
    fn sprite_override_wins() {
        assert_eq!(
            sprite_file_name(&species("Pikachu", Some("pikachu-surf.png"))),
            "pikachu-surf.png"
        );
    }

    #[test]
    fn sprite_url_joins_set_and_file() {
        let set = find_sprite_set("gen1rb").unwrap();
        assert_eq!(
            sprite_url(set, &species("Mew", None)),
            "https://play.pokemonshowdown.com/sprites/gen1rb/mew.png"
        );
    }
}
