use bioslide_common::{Location, Slide, Terms};

use crate::store::AppState;

/// What the slideshow screen shows for the current state.
#[derive(Debug, Clone, PartialEq)]
pub enum SlideshowView {
    /// No slide at the current index.
    Empty { message: String },
    Slide(SlideFrame),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlideFrame {
    pub slide: Slide,
    pub index: usize,
    pub total: usize,
    /// "Slide 2 / 5", localized.
    pub position_label: String,
    pub marker: Option<MapMarker>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapMarker {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl From<&Location> for MapMarker {
    fn from(loc: &Location) -> Self {
        Self { name: loc.name.clone(), lat: loc.lat, lng: loc.lng }
    }
}

impl SlideFrame {
    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < self.total
    }

    /// One flag per slide, true for the current one.
    pub fn progress(&self) -> Vec<bool> {
        (0..self.total).map(|i| i == self.index).collect()
    }
}

impl SlideshowView {
    pub fn from_state(state: &AppState, terms: &Terms) -> Self {
        match state.current_slide() {
            None => SlideshowView::Empty { message: terms.error_generating.to_string() },
            Some(slide) => {
                let index = state.current_slide_index;
                let total = state.slides.len();
                SlideshowView::Slide(SlideFrame {
                    slide: slide.clone(),
                    index,
                    total,
                    position_label: terms.slide_of(index + 1, total),
                    marker: slide.location.as_ref().map(MapMarker::from),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bioslide_common::terms::{ARMENIAN, ENGLISH};

    fn state() -> AppState {
        AppState::default().with_slides(vec![
            Slide::new("1", "A", "a"),
            Slide::new("2", "B", "b").with_location(Location::new("Yerevan", 40.1811, 44.5136)),
            Slide::new("3", "C", "c"),
        ])
    }

    #[test]
    fn empty_deck_shows_error_state() {
        assert_eq!(
            SlideshowView::from_state(&AppState::default(), &ARMENIAN),
            SlideshowView::Empty { message: ARMENIAN.error_generating.into() }
        );
    }

    #[test]
    fn first_slide_cannot_go_back() {
        let SlideshowView::Slide(frame) = SlideshowView::from_state(&state(), &ENGLISH) else {
            panic!("expected a slide");
        };
        assert_eq!(frame.slide.title, "A");
        assert_eq!(frame.position_label, "Slide 1 / 3");
        assert!(!frame.has_previous());
        assert!(frame.has_next());
        assert_eq!(frame.progress(), vec![true, false, false]);
        assert!(frame.marker.is_none());
    }

    #[test]
    fn location_becomes_a_marker() {
        let SlideshowView::Slide(frame) = SlideshowView::from_state(&state().next_slide(), &ENGLISH) else {
            panic!("expected a slide");
        };
        let marker = frame.marker.unwrap();
        assert_eq!(marker.name, "Yerevan");
        assert_eq!(marker.lng, 44.5136);
    }

    #[test]
    fn last_slide_cannot_advance() {
        let s = state().next_slide().next_slide().next_slide();
        let SlideshowView::Slide(frame) = SlideshowView::from_state(&s, &ENGLISH) else {
            panic!("expected a slide");
        };
        assert_eq!(frame.index, 2);
        assert!(!frame.has_next());
        assert!(frame.has_previous());
    }
}
