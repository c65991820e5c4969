//! Graph projection of a deck and the per-slide editor.

use bioslide_common::{ImageCandidate, Slide};

use crate::store::{SlidePatch, Store};

const NODE_X: f64 = 250.0;
const NODE_SPACING_Y: f64 = 150.0;

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    /// Zero-based position in the deck.
    pub index: usize,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeckGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphNode {
    /// 1-based position shown on the node.
    pub fn ordinal(&self) -> usize {
        self.index + 1
    }
}

impl DeckGraph {
    /// One node per slide, top to bottom, with an edge from each slide to
    /// the one presented after it.
    pub fn from_slides(slides: &[Slide]) -> Self {
        let nodes = slides
            .iter()
            .enumerate()
            .map(|(index, slide)| GraphNode {
                id: slide.id.clone(),
                label: slide.title.clone(),
                index,
                x: NODE_X,
                y: index as f64 * NODE_SPACING_Y,
            })
            .collect();
        let edges = slides
            .windows(2)
            .map(|pair| GraphEdge {
                id: format!("e{}-{}", pair[0].id, pair[1].id),
                source: pair[0].id.clone(),
                target: pair[1].id.clone(),
            })
            .collect();
        Self { nodes, edges }
    }
}

/// Which editor field a keystroke belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorField {
    Title,
    Content,
}

impl EditorField {
    pub fn patch(self, value: String) -> SlidePatch {
        match self {
            EditorField::Title => SlidePatch::title(value),
            EditorField::Content => SlidePatch::content(value),
        }
    }

    pub fn next(self) -> Self {
        match self {
            EditorField::Title => EditorField::Content,
            EditorField::Content => EditorField::Title,
        }
    }
}

/// State of the image picker inside the editor.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ImagePicker {
    #[default]
    Idle,
    Loading,
    Ready(Vec<ImageCandidate>),
    NoImages,
}

impl ImagePicker {
    pub fn from_candidates(candidates: Vec<ImageCandidate>) -> Self {
        if candidates.is_empty() {
            ImagePicker::NoImages
        } else {
            ImagePicker::Ready(candidates)
        }
    }

    pub fn candidates(&self) -> &[ImageCandidate] {
        match self {
            ImagePicker::Ready(c) => c,
            _ => &[],
        }
    }
}

/// Draft state for one slide being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorSession {
    pub slide_id: String,
    pub title: String,
    pub content: String,
    pub selected_image: Option<String>,
    pub image_search_term: Option<String>,
    /// Only the image may be changed.
    pub image_only: bool,
    pub focus: EditorField,
    pub picker: ImagePicker,
    pub highlighted: usize,
}

impl EditorSession {
    pub fn open(slide: &Slide) -> Self {
        Self {
            slide_id: slide.id.clone(),
            title: slide.title.clone(),
            content: slide.content.clone(),
            selected_image: slide.image_url.clone(),
            image_search_term: slide.search_term().map(str::to_string),
            image_only: false,
            focus: EditorField::Title,
            picker: ImagePicker::Idle,
            highlighted: 0,
        }
    }

    pub fn open_image_only(slide: &Slide) -> Self {
        Self { image_only: true, ..Self::open(slide) }
    }

    pub fn field_value_mut(&mut self, field: EditorField) -> &mut String {
        match field {
            EditorField::Title => &mut self.title,
            EditorField::Content => &mut self.content,
        }
    }

    /// Whether opening the picker should start a search.
    pub fn wants_images(&self) -> bool {
        self.image_search_term.is_some() && matches!(self.picker, ImagePicker::Idle)
    }

    pub fn set_picker(&mut self, picker: ImagePicker) {
        self.picker = picker;
        self.highlighted = 0;
    }

    pub fn highlight_next(&mut self) {
        let len = self.picker.candidates().len();
        if len > 0 {
            self.highlighted = (self.highlighted + 1).min(len - 1);
        }
    }

    pub fn highlight_previous(&mut self) {
        self.highlighted = self.highlighted.saturating_sub(1);
    }

    /// Choose the highlighted candidate as the slide image.
    pub fn choose_highlighted(&mut self) -> Option<&str> {
        let url = self.picker.candidates().get(self.highlighted)?.url.clone();
        self.selected_image = Some(url);
        self.selected_image.as_deref()
    }

    /// The patch that saving this session applies.
    pub fn to_patch(&self) -> SlidePatch {
        let image_url = Some(self.selected_image.clone().unwrap_or_default());
        if self.image_only {
            SlidePatch { image_url, ..SlidePatch::default() }
        } else {
            SlidePatch {
                title: Some(self.title.clone()),
                content: Some(self.content.clone()),
                image_url,
            }
        }
    }

    pub fn save(&self, store: &Store) {
        let patch = self.to_patch();
        let id = self.slide_id.clone();
        store.update(|s| s.with_slide_update(&id, &patch));
        tracing::info!("saved slide {id}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AppState;

    fn deck() -> Vec<Slide> {
        vec![
            Slide::new("1", "A", "a").with_image_search_term("Einstein"),
            Slide::new("2", "B", "b"),
            Slide::new("3", "C", "c"),
        ]
    }

    #[test]
    fn graph_has_node_per_slide_and_sequential_edges() {
        let graph = DeckGraph::from_slides(&deck());
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.nodes[2].y, 300.0);
        assert_eq!(graph.nodes[1].label, "B");
        assert_eq!(graph.nodes[1].ordinal(), 2);
        let edges: Vec<_> = graph.edges.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(edges, vec!["e1-2", "e2-3"]);
        assert_eq!(graph.edges[0].source, "1");
        assert_eq!(graph.edges[0].target, "2");
    }

    #[test]
    fn single_slide_has_no_edges() {
        let graph = DeckGraph::from_slides(&deck()[..1]);
        assert!(graph.edges.is_empty());
        assert!(DeckGraph::from_slides(&[]).nodes.is_empty());
    }

    #[test]
    fn saving_title_changes_only_that_slide() {
        let store = Store::with_state(AppState::default().with_slides(deck()));
        let before = store.snapshot();

        let mut session = EditorSession::open(&before.slides[1]);
        session.title = "B edited".into();
        session.save(&store);

        let after = store.snapshot();
        assert_eq!(after.slides[0], before.slides[0]);
        assert_eq!(after.slides[2], before.slides[2]);
        assert_eq!(after.slides[1].title, "B edited");
        assert_eq!(after.slides[1].content, "b");
        assert_eq!(after.slides[1].image_url, None);
    }

    #[test]
    fn image_only_session_leaves_text_alone() {
        let store = Store::with_state(AppState::default().with_slides(deck()));
        let mut session = EditorSession::open_image_only(&store.snapshot().slides[0]);
        session.title = "ignored".into();
        session.set_picker(ImagePicker::Ready(vec![ImageCandidate {
            url: "https://img.example/e.jpg".into(),
            title: "E".into(),
            source: "https://img.example".into(),
        }]));
        assert_eq!(session.choose_highlighted(), Some("https://img.example/e.jpg"));
        session.save(&store);

        let slide = store.snapshot().slides[0].clone();
        assert_eq!(slide.title, "A");
        assert_eq!(slide.image_url.as_deref(), Some("https://img.example/e.jpg"));
    }

    #[test]
    fn picker_only_searches_with_a_term() {
        let slides = deck();
        assert!(EditorSession::open(&slides[0]).wants_images());
        assert!(!EditorSession::open(&slides[1]).wants_images());
    }

    #[test]
    fn empty_candidates_mean_no_images() {
        assert_eq!(ImagePicker::from_candidates(vec![]), ImagePicker::NoImages);
    }

    #[test]
    fn highlight_stays_within_candidates() {
        let mut session = EditorSession::open(&deck()[0]);
        let candidate = |n: u8| ImageCandidate {
            url: format!("https://img.example/{n}.jpg"),
            title: String::new(),
            source: String::new(),
        };
        session.set_picker(ImagePicker::Ready(vec![candidate(1), candidate(2)]));
        session.highlight_next();
        session.highlight_next();
        assert_eq!(session.highlighted, 1);
        session.highlight_previous();
        session.highlight_previous();
        assert_eq!(session.highlighted, 0);
    }
}
