//! # Highlights
//!
//! Groups analysed assets by tag. A tag needs at least two members to become
//! a highlight and each highlight keeps at most ten of them. Highlights are
//! rebuilt from scratch after every pipeline run and never stored.

use bridge_traits::time::Clock;
use core_library::TaggedAsset;
use indexmap::{IndexMap, IndexSet};
use rand::seq::SliceRandom;
use serde::Serialize;

pub const MIN_HIGHLIGHT_MEMBERS: usize = 2;
pub const MAX_HIGHLIGHT_IMAGES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightKind {
    Tag,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    pub id: String,
    pub title: String,
    pub images: Vec<TaggedAsset>,
    #[serde(rename = "type")]
    pub kind: HighlightKind,
}

impl Highlight {
    /// A member chosen uniformly at random; differs between calls.
    pub fn pick_cover(&self) -> Option<&TaggedAsset> {
        self.images.choose(&mut rand::thread_rng())
    }
}

fn capitalize(tag: &str) -> String {
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Build highlights in first-seen tag order.
pub fn group_highlights(assets: &[TaggedAsset], clock: &dyn Clock) -> Vec<Highlight> {
    let mut groups: IndexMap<&str, Vec<&TaggedAsset>> = IndexMap::new();
    for asset in assets {
        // A tag repeated in one answer still counts the asset once.
        let tags: IndexSet<&str> = asset.tags().iter().map(String::as_str).collect();
        for tag in tags {
            groups.entry(tag).or_default().push(asset);
        }
    }

    let stamp = clock.unix_timestamp_millis();
    groups
        .into_iter()
        .filter(|(_, members)| members.len() >= MIN_HIGHLIGHT_MEMBERS)
        .map(|(tag, members)| Highlight {
            id: format!("tag-{}-{}", tag, stamp),
            title: format!("{} collection", capitalize(tag)),
            images: members
                .into_iter()
                .take(MAX_HIGHLIGHT_IMAGES)
                .cloned()
                .collect(),
            kind: HighlightKind::Tag,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::media::MediaKind;
    use bridge_traits::time::FixedClock;
    use core_library::{Asset, LocalAsset, TagResult};

    fn tagged(id: &str, tags: &[&str]) -> TaggedAsset {
        let asset = Asset::Local(LocalAsset {
            id: id.to_string(),
            file_name: format!("{}.jpg", id),
            uri: format!("file:///dcim/{}.jpg", id),
            media_kind: MediaKind::Photo,
            width: 1,
            height: 1,
            creation_time: Some(1),
            modification_time: None,
            duration: None,
            is_backed_up: false,
        });
        TaggedAsset::enriched(
            asset,
            TagResult {
                tags: tags.iter().map(|t| t.to_string()).collect(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_beach_collection() {
        let clock = FixedClock::from_millis(1_700_000_000_000);
        let assets = vec![
            tagged("1", &["beach"]),
            tagged("2", &["beach"]),
            tagged("3", &["mountain"]),
        ];

        let highlights = group_highlights(&assets, &clock);

        assert_eq!(highlights.len(), 1);
        assert_eq!(highlights[0].title, "Beach collection");
        assert_eq!(highlights[0].id, "tag-beach-1700000000000");
        assert_eq!(highlights[0].kind, HighlightKind::Tag);
        let ids: Vec<_> = highlights[0].images.iter().map(|a| a.asset.id()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_multi_tag_membership_and_order() {
        let clock = FixedClock::from_millis(0);
        let assets = vec![
            tagged("1", &["sky", "city"]),
            tagged("2", &["city", "sky"]),
            tagged("3", &["city"]),
        ];

        let titles: Vec<_> = group_highlights(&assets, &clock)
            .into_iter()
            .map(|h| (h.title, h.images.len()))
            .collect();

        assert_eq!(
            titles,
            vec![("Sky collection".to_string(), 2), ("City collection".to_string(), 3)]
        );
    }

    #[test]
    fn test_repeated_tag_counts_asset_once() {
        let clock = FixedClock::from_millis(0);

        let single = vec![tagged("only", &["beach", "beach"])];
        assert!(group_highlights(&single, &clock).is_empty());

        let pair = vec![tagged("1", &["beach", "beach"]), tagged("2", &["beach"])];
        let highlights = group_highlights(&pair, &clock);
        assert_eq!(highlights.len(), 1);
        let ids: Vec<_> = highlights[0].images.iter().map(|a| a.asset.id()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_cap_and_unenriched_assets() {
        let clock = FixedClock::from_millis(0);
        let mut assets: Vec<_> = (0..15).map(|i| tagged(&i.to_string(), &["dog"])).collect();
        assets.push(TaggedAsset::plain(tagged("x", &[]).asset));

        let highlights = group_highlights(&assets, &clock);

        assert_eq!(highlights.len(), 1);
        assert_eq!(highlights[0].images.len(), MAX_HIGHLIGHT_IMAGES);
        let cover = highlights[0].pick_cover().unwrap();
        assert!(highlights[0].images.contains(cover));
    }
}
