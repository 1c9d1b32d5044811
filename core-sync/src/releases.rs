//! # Release Aggregation
//!
//! Accumulates the albums delivered by each artist job into a single
//! deduplicated set, and answers the questions the host asks of it: which
//! releases came out on which day, which ids fall into a date window and
//! what a playlist covering that window should be called.

use bridge_traits::{Album, AlbumGroup};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One release with every followed artist that contributed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub album: Album,
    /// Contributing followed artists per release group, in arrival order.
    pub artist_ids: BTreeMap<AlbumGroup, Vec<String>>,
}

impl Release {
    fn new(album: Album) -> Self {
        let mut artist_ids = BTreeMap::new();
        artist_ids.insert(album.group, vec![album.artist_id.clone()]);
        Self { album, artist_ids }
    }

    fn add_artist(&mut self, group: AlbumGroup, artist_id: String) {
        let ids = self.artist_ids.entry(group).or_default();
        if !ids.contains(&artist_id) {
            ids.push(artist_id);
        }
    }

    pub fn id(&self) -> &str {
        &self.album.id
    }

    pub fn release_date(&self) -> &str {
        &self.album.release_date
    }
}

/// Deduplicated releases in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseSet {
    releases: Vec<Release>,
    index: HashMap<String, usize>,
}

impl ReleaseSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one artist's albums. Albums released before `min_date` are
    /// dropped; an album already in the set only gains the contributing
    /// artist under the album's group.
    pub fn merge(&mut self, albums: impl IntoIterator<Item = Album>, min_date: &str) {
        for album in albums {
            if album.release_date.as_str() < min_date {
                continue;
            }

            match self.index.get(&album.id) {
                Some(&position) => {
                    self.releases[position].add_artist(album.group, album.artist_id);
                }
                None => {
                    self.index.insert(album.id.clone(), self.releases.len());
                    self.releases.push(Release::new(album));
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Release> {
        self.index.get(id).map(|&position| &self.releases[position])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Release> {
        self.releases.iter()
    }

    /// Releases grouped by date, newest date first. Within a date releases
    /// are ordered by name, ignoring case.
    pub fn by_date(&self) -> Vec<(String, Vec<&Release>)> {
        let mut days: BTreeMap<&str, Vec<&Release>> = BTreeMap::new();
        for release in &self.releases {
            days.entry(release.release_date()).or_default().push(release);
        }

        days.into_iter()
            .rev()
            .map(|(date, mut releases)| {
                releases.sort_by(|a, b| {
                    a.album
                        .name
                        .to_lowercase()
                        .cmp(&b.album.name.to_lowercase())
                        .then_with(|| a.album.name.cmp(&b.album.name))
                });
                (date.to_string(), releases)
            })
            .collect()
    }

    /// Ids of releases dated `start..=end`, oldest day first. Only full
    /// `YYYY-MM-DD` dates can fall into a window.
    pub fn ids_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<String> {
        self.by_date()
            .into_iter()
            .rev()
            .filter(|(day, _)| {
                parse_release_date(day).is_some_and(|day| start <= day && day <= end)
            })
            .flat_map(|(_, releases)| releases.into_iter().map(|release| release.id().to_string()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a ReleaseSet {
    type Item = &'a Release;
    type IntoIter = std::slice::Iter<'a, Release>;

    fn into_iter(self) -> Self::IntoIter {
        self.releases.iter()
    }
}

/// Default playlist name for a date window, e.g. `"Mar 5 Releases"` or
/// `"Mar 5 - Mar 11 Releases"`.
pub fn playlist_name(start: NaiveDate, end: NaiveDate) -> String {
    let first = start.format("%b %-d");
    if start == end {
        format!("{} Releases", first)
    } else {
        format!("{} - {} Releases", first, end.format("%b %-d"))
    }
}

/// Parses a full `YYYY-MM-DD` release date.
pub fn parse_release_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, DATE_FORMAT).ok()
}
