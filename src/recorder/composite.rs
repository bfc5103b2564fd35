//! Composite stream: every enabled source's tracks in one recordable stream

use crate::capture::{MediaStream, MediaTrack, TrackKind};

/// Tracks borrowed from the enabled sources.
///
/// The composite never owns the devices; stopping a recording leaves the
/// sources enabled.
#[derive(Debug, Clone, Default)]
pub struct CompositeStream {
    tracks: Vec<MediaTrack>,
}

impl CompositeStream {
    /// Combine the tracks of `sources`, in order
    pub fn combine<'a>(sources: impl IntoIterator<Item = &'a MediaStream>) -> Self {
        let tracks = sources
            .into_iter()
            .flat_map(|stream| stream.tracks().iter().cloned())
            .collect();
        Self { tracks }
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn count(&self, kind: TrackKind) -> usize {
        self.tracks.iter().filter(|t| t.kind() == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::BufferedTrack;
    use std::sync::Arc;

    fn stream(kinds: &[TrackKind]) -> MediaStream {
        MediaStream::new(
            kinds
                .iter()
                .map(|&k| MediaTrack::new(k, "test", Arc::new(BufferedTrack::new())))
                .collect(),
        )
    }

    #[test]
    fn test_combines_all_tracks() {
        let camera = stream(&[TrackKind::Video, TrackKind::Audio]);
        let screen = stream(&[TrackKind::Video, TrackKind::Audio]);
        let composite = CompositeStream::combine([&camera, &screen]);

        assert_eq!(composite.tracks().len(), 4);
        assert_eq!(composite.count(TrackKind::Video), 2);
        assert_eq!(composite.tracks()[0].id(), camera.tracks()[0].id());
        assert_eq!(composite.tracks()[2].id(), screen.tracks()[0].id());
    }

    #[test]
    fn test_empty_when_no_sources() {
        let composite = CompositeStream::combine(std::iter::empty::<&MediaStream>());
        assert!(composite.is_empty());
    }
}
