use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::sotw::*;

#[derive(Debug, Clone, Deserialize)]
struct PlaylistExport {
    items: Vec<PlaylistItem>,
}

#[derive(Debug, Clone, Deserialize)]
struct PlaylistItem {
    added_at: DateTime<Utc>,
    added_by: Option<PlaylistUser>,
    track: Option<PlaylistTrack>,
}

#[derive(Debug, Clone, Deserialize)]
struct PlaylistUser {
    id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct PlaylistTrack {
    name: String,
    artists: Vec<PlaylistArtist>,
}

#[derive(Debug, Clone, Deserialize)]
struct PlaylistArtist {
    name: String,
}

/// A track of the playlist, before mapping to the participants.
#[derive(Eq, PartialEq, Debug, Clone)]
struct PlaylistEntry {
    added_at: DateTime<Utc>,
    title: String,
    artists: String,
    added_by: String,
}

pub fn read_playlist_json(
    path: &str,
    source: &SubmissionSource,
    participants: &[Participant],
) -> SotwResult<Vec<Submission>> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let export: PlaylistExport =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    info!("read_playlist_json: {} tracks in {:?}", export.items.len(), path);

    select_submissions(playlist_entries(export), source, participants)
}

// Items without a track (removed from the catalog) are skipped.
fn playlist_entries(export: PlaylistExport) -> Vec<PlaylistEntry> {
    export
        .items
        .into_iter()
        .filter_map(|item| {
            let track = item.track?;
            Some(PlaylistEntry {
                added_at: item.added_at,
                title: track.name,
                artists: track
                    .artists
                    .iter()
                    .map(|a| a.name.clone())
                    .collect::<Vec<String>>()
                    .join(", "),
                added_by: item.added_by.map(|u| u.id).unwrap_or_default(),
            })
        })
        .collect()
}

/// Keeps the tracks of this round and attributes them to the participants.
fn select_submissions(
    mut entries: Vec<PlaylistEntry>,
    source: &SubmissionSource,
    participants: &[Participant],
) -> SotwResult<Vec<Submission>> {
    let song_count = source.song_count.context(MissingConfigOptionSnafu {
        option: "songCount",
    })?;
    let offset = source.offset.unwrap_or(0);

    // Most recent first.
    entries.sort_by(|a, b| b.added_at.cmp(&a.added_at));

    let excluded = source.excluded.clone().unwrap_or_default();
    entries.retain(|e| {
        let drop = excluded
            .iter()
            .any(|x| x.title == e.title && x.artists == e.artists);
        if drop {
            info!("select_submissions: excluding {} - {}", e.title, e.artists);
        }
        !drop
    });

    let end = (offset + song_count).min(entries.len());
    if end < offset + song_count {
        warn!(
            "select_submissions: requested {} songs from position {}, only {} available",
            song_count,
            offset,
            end.saturating_sub(offset)
        );
    }
    let round_entries: &[PlaylistEntry] = entries.get(offset..end).unwrap_or(&[]);

    let usernames: HashMap<&str, &Participant> = participants
        .iter()
        .flat_map(|p| {
            p.usernames
                .iter()
                .flatten()
                .map(move |u| (u.as_str(), p))
        })
        .collect();

    let mut res: Vec<Submission> = Vec::new();
    for e in round_entries.iter() {
        let (submitter, title) = match usernames.get(e.added_by.as_str()) {
            Some(p) => (
                p.name.clone(),
                p.song_title.clone().unwrap_or_else(|| e.title.clone()),
            ),
            None => {
                warn!(
                    "select_submissions: unknown playlist user {:?} for {}",
                    e.added_by, e.title
                );
                (e.added_by.clone(), e.title.clone())
            }
        };
        debug!(
            "select_submissions: {} - {} by {}",
            title, e.artists, submitter
        );
        res.push(Submission::new(&title, &e.artists, &submitter));
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYLIST: &str = r#"{
        "items": [
            { "added_at": "2022-08-01T10:00:00Z", "added_by": { "id": "old" },
              "track": { "name": "Old Song", "artists": [{ "name": "Someone" }] } },
            { "added_at": "2022-08-09T10:00:00Z", "added_by": { "id": "ann_1987" },
              "track": { "name": "Alpha - Remastered 2011", "artists": [{ "name": "Band A" }] } },
            { "added_at": "2022-08-10T10:00:00Z", "added_by": { "id": "bbb" },
              "track": { "name": "Bravo", "artists": [{ "name": "Band B" }, { "name": "Guest" }] } },
            { "added_at": "2022-08-11T10:00:00Z", "added_by": { "id": "bbb" },
              "track": { "name": "Mistake", "artists": [{ "name": "Band X" }] } },
            { "added_at": "2022-08-11T11:00:00Z", "added_by": null, "track": null }
        ]
    }"#;

    fn participants() -> Vec<Participant> {
        vec![
            Participant {
                name: "Ann".to_string(),
                usernames: Some(vec!["ann_1987".to_string()]),
                song_title: Some("Alpha".to_string()),
                ledger_column: None,
            },
            Participant {
                name: "Ben".to_string(),
                usernames: Some(vec!["bbb".to_string()]),
                song_title: None,
                ledger_column: None,
            },
        ]
    }

    fn source(offset: usize, song_count: usize) -> SubmissionSource {
        SubmissionSource {
            provider: "playlist_json".to_string(),
            file_path: "playlist.json".to_string(),
            offset: Some(offset),
            song_count: Some(song_count),
            excluded: Some(vec![ExcludedSong {
                title: "Mistake".to_string(),
                artists: "Band X".to_string(),
            }]),
        }
    }

    fn entries() -> Vec<PlaylistEntry> {
        let export: PlaylistExport = serde_json::from_str(PLAYLIST).unwrap();
        playlist_entries(export)
    }

    #[test]
    fn selects_the_most_recent_tracks() {
        let res = select_submissions(entries(), &source(0, 2), &participants()).unwrap();
        assert_eq!(
            res,
            vec![
                Submission::new("Bravo", "Band B, Guest", "Ben"),
                Submission::new("Alpha", "Band A", "Ann"),
            ]
        );
    }

    #[test]
    fn offset_and_unknown_users() {
        let res = select_submissions(entries(), &source(2, 5), &participants()).unwrap();
        assert_eq!(res, vec![Submission::new("Old Song", "Someone", "old")]);

        let res = select_submissions(entries(), &source(10, 5), &participants()).unwrap();
        assert!(res.is_empty());
    }

    #[test]
    fn song_count_is_required() {
        let mut s = source(0, 2);
        s.song_count = None;
        assert!(matches!(
            select_submissions(entries(), &s, &participants()),
            Err(SotwError::MissingConfigOption { .. })
        ));
    }
}
