//! `tunestat tracks`: tabular views of the data endpoints.

use anyhow::{Result, bail};
use comfy_table::{ContentArrangement, Table};
use tunestat_core::config::Config;
use tunestat_core::session::ConsentState;
use tunestat_core::tracks::{SavedTrack, TopTrack, TracksClient, VisualizerPoint};

use super::{MountOptions, resolve};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackList {
    Top,
    Saved,
    Visualizer,
}

pub async fn run(config: &Config, options: MountOptions, list: TrackList) -> Result<()> {
    let (state, login_url) = resolve(config, &options).await?;
    let token = match state {
        ConsentState::Authenticated { token, .. } => token,
        ConsentState::NeedsTrackingFix => {
            bail!("Login blocked by browser. Run `tunestat status` for how to fix it.")
        }
        _ => bail!("Not logged in. Run `tunestat login` or visit {login_url}"),
    };

    let client = TracksClient::new(config, token)?;
    let table = match list {
        TrackList::Top => top_table(&client.top_tracks().await?),
        TrackList::Saved => saved_table(&client.saved_tracks().await?),
        TrackList::Visualizer => visualizer_table(&client.taste_visualizer().await?),
    };
    println!("{table}");
    Ok(())
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

fn top_table(tracks: &[TopTrack]) -> Table {
    let mut table = new_table(&["#", "Track", "Artist", "Album", "Listen on Spotify"]);
    for (rank, track) in tracks.iter().enumerate() {
        table.add_row(vec![
            (rank + 1).to_string(),
            track.name.clone(),
            track.artist.clone(),
            track.album.clone(),
            track_link(&track.id),
        ]);
    }
    table
}

fn track_link(id: &str) -> String {
    format!("https://open.spotify.com/track/{id}")
}

fn saved_table(tracks: &[SavedTrack]) -> Table {
    let mut table = new_table(&["Track", "Artist", "Album", "Released", "Duration", "Popularity"]);
    for track in tracks {
        table.add_row(vec![
            track.name.clone(),
            track.artist.clone(),
            track.album.clone(),
            track.release_date.clone(),
            track.duration.clone(),
            track.popularity.to_string(),
        ]);
    }
    table
}

fn visualizer_table(points: &[VisualizerPoint]) -> Table {
    let mut table = new_table(&["Track", "Artist", "Popularity", "Seconds", "Explicit", "Year"]);
    for point in points {
        table.add_row(vec![
            point.name.clone(),
            point.artist.clone(),
            format!("{:.0}", point.x),
            format!("{:.0}", point.y),
            if point.explicit { "yes" } else { "" }.to_string(),
            point.release_year.clone(),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_table_ranks_from_one() {
        let tracks = vec![
            TopTrack {
                id: "1".into(),
                name: "First".into(),
                artist: "A".into(),
                album: "X".into(),
                image: String::new(),
            },
            TopTrack {
                id: "2".into(),
                name: "Second".into(),
                artist: "B".into(),
                album: "Y".into(),
                image: String::new(),
            },
        ];
        let mut table = top_table(&tracks);
        table.set_content_arrangement(ContentArrangement::Disabled);
        let rendered = table.to_string();
        let first = rendered.lines().find(|l| l.contains("First")).unwrap();
        let second = rendered.lines().find(|l| l.contains("Second")).unwrap();
        assert!(first.contains(" 1 "));
        assert!(first.contains("https://open.spotify.com/track/1"));
        assert!(second.contains(" 2 "));
        assert!(second.contains("https://open.spotify.com/track/2"));
    }

    #[test]
    fn visualizer_rounds_coordinates() {
        let points = vec![VisualizerPoint {
            name: "Song".into(),
            artist: "A".into(),
            image: String::new(),
            x: 71.6,
            y: 204.2,
            explicit: true,
            release_year: "2019".into(),
        }];
        let rendered = visualizer_table(&points).to_string();
        let row = rendered.lines().find(|l| l.contains("Song")).unwrap();
        assert!(row.contains("72"));
        assert!(row.contains("204"));
        assert!(row.contains("yes"));
    }
}
