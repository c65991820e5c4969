use bioslide_core::slideshow::MapMarker;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Map, MapResolution, Points},
        Block, Borders, Widget,
    },
};

const SPAN_LNG: f64 = 60.0;
const SPAN_LAT: f64 = 40.0;

/// World map with an optional marker, zoomed around the marker.
pub struct LocationMap<'a> {
    marker: &'a MapMarker,
    title: &'a str,
}

impl<'a> LocationMap<'a> {
    pub fn new(marker: &'a MapMarker, title: &'a str) -> Self {
        Self { marker, title }
    }
}

/// Visible window centred on the marker, shifted to stay on the globe.
pub fn bounds(marker: &MapMarker) -> ([f64; 2], [f64; 2]) {
    let window = |center: f64, span: f64, limit: f64| {
        let lo = (center - span / 2.0).clamp(-limit, limit - span);
        [lo, lo + span]
    };
    (window(marker.lng, SPAN_LNG, 180.0), window(marker.lat, SPAN_LAT, 90.0))
}

impl Widget for LocationMap<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (x_bounds, y_bounds) = bounds(self.marker);
        let marker = self.marker;
        Canvas::default()
            .block(Block::default().title(format!(" {}: {} ", self.title, marker.name)).borders(Borders::ALL))
            .marker(symbols::Marker::Braille)
            .x_bounds(x_bounds)
            .y_bounds(y_bounds)
            .paint(move |ctx| {
                ctx.draw(&Map { resolution: MapResolution::High, color: Color::DarkGray });
                ctx.layer();
                ctx.draw(&Points { coords: &[(marker.lng, marker.lat)], color: Color::Red });
                ctx.print(
                    marker.lng,
                    marker.lat,
                    Line::from(Span::styled(format!(" {}", marker.name), Style::default().fg(Color::Yellow))),
                );
            })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(lat: f64, lng: f64) -> MapMarker {
        MapMarker { name: "here".into(), lat, lng }
    }

    #[test]
    fn window_is_centred_on_the_marker() {
        let (x, y) = bounds(&marker(40.0, 44.0));
        assert_eq!(x, [14.0, 74.0]);
        assert_eq!(y, [20.0, 60.0]);
    }

    #[test]
    fn window_stays_on_the_globe() {
        let (x, y) = bounds(&marker(89.0, 179.0));
        assert_eq!(x, [120.0, 180.0]);
        assert_eq!(y, [50.0, 90.0]);
        let (x, _) = bounds(&marker(0.0, -179.0));
        assert_eq!(x, [-180.0, -120.0]);
    }

    #[test]
    fn renders_the_place_name() {
        let area = Rect::new(0, 0, 40, 12);
        let mut buf = Buffer::empty(area);
        let m = MapMarker { name: "Yerevan".into(), lat: 40.18, lng: 44.51 };
        LocationMap::new(&m, "Location").render(area, &mut buf);
        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Location: Yerevan"));
    }
}
