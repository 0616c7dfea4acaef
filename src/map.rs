use tracing::trace;

use crate::columns::COLUMNS;
use crate::domain::DashConfig;
use crate::store::Person;

pub const MAX_ZOOM: u8 = 18;
const MAX_FIT_ZOOM: u8 = 12;
const PAN_STEPS: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapMarker {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
}

/// One marker per filtered record. Pagination does not apply to the map.
pub fn markers(records: &[Person], filtered: &[usize]) -> Vec<MapMarker> {
    filtered
        .iter()
        .map(|&idx| {
            let p = &records[idx];
            MapMarker {
                id: p.id,
                latitude: p.latitude,
                longitude: p.longitude,
            }
        })
        .collect()
}

/// Fixed text block copied to the clipboard for a record.
pub fn summary(person: &Person) -> String {
    let mut lines: Vec<String> = COLUMNS
        .iter()
        .map(|c| format!("{}: {}", c.label(), c.display_value(person)))
        .collect();
    lines.push(format!("GPS: {}, {}", person.latitude, person.longitude));
    lines.join("\n")
}

/// Degrees of longitude visible at `zoom`.
fn lon_span(zoom: u8) -> f64 {
    360.0 / f64::powi(2.0, zoom as i32)
}

/// Terminal cells are about twice as high as wide.
fn lat_span(zoom: u8) -> f64 {
    (lon_span(zoom) / 2.0).min(180.0)
}

#[derive(Debug)]
pub struct MapView {
    pub center: (f64, f64), // (latitude, longitude)
    pub zoom: u8,
    pub selected: Option<i64>,
    pub show_popup: bool,
    home: (f64, f64),
    home_zoom: u8,
}

impl MapView {
    pub fn new(config: &DashConfig) -> Self {
        let zoom = config.map_zoom.min(MAX_ZOOM);
        Self {
            center: config.map_center,
            zoom,
            selected: None,
            show_popup: false,
            home: config.map_center,
            home_zoom: zoom,
        }
    }

    pub fn x_bounds(&self) -> [f64; 2] {
        let half = lon_span(self.zoom) / 2.0;
        [self.center.1 - half, self.center.1 + half]
    }

    pub fn y_bounds(&self) -> [f64; 2] {
        let half = lat_span(self.zoom) / 2.0;
        [self.center.0 - half, self.center.0 + half]
    }

    /// Moves the center by whole steps, one step is an eighth of the view.
    pub fn pan(&mut self, lat_steps: i32, lon_steps: i32) {
        let lat = self.center.0 + lat_steps as f64 * lat_span(self.zoom) / PAN_STEPS;
        let lon = self.center.1 + lon_steps as f64 * lon_span(self.zoom) / PAN_STEPS;
        self.center = (lat.clamp(-90.0, 90.0), lon.clamp(-180.0, 180.0));
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + 1).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = self.zoom.saturating_sub(1);
    }

    pub fn reset(&mut self) {
        self.center = self.home;
        self.zoom = self.home_zoom;
    }

    /// Centers on the bounding box of the filtered markers and picks the
    /// closest zoom that still shows all of them.
    pub fn fit(&mut self, records: &[Person], filtered: &[usize]) {
        let markers = markers(records, filtered);
        if markers.is_empty() {
            return;
        }
        let (mut min_lat, mut max_lat) = (f64::MAX, f64::MIN);
        let (mut min_lon, mut max_lon) = (f64::MAX, f64::MIN);
        for m in &markers {
            min_lat = min_lat.min(m.latitude);
            max_lat = max_lat.max(m.latitude);
            min_lon = min_lon.min(m.longitude);
            max_lon = max_lon.max(m.longitude);
        }
        self.center = ((min_lat + max_lat) / 2.0, (min_lon + max_lon) / 2.0);
        let need_lat = (max_lat - min_lat) * 1.1;
        let need_lon = (max_lon - min_lon) * 1.1;
        self.zoom = (0..=MAX_FIT_ZOOM)
            .rev()
            .find(|&z| lat_span(z) >= need_lat && lon_span(z) >= need_lon)
            .unwrap_or(0);
        trace!("Fit map to {} markers: {:?} z{}", markers.len(), self.center, self.zoom);
    }

    /// Cycles the selection through the filtered records.
    pub fn select_next(&mut self, records: &[Person], filtered: &[usize], forward: bool) {
        if filtered.is_empty() {
            self.selected = None;
            return;
        }
        let current = self
            .selected
            .and_then(|id| filtered.iter().position(|&idx| records[idx].id == id));
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => filtered.len() - 1,
            (Some(pos), true) => (pos + 1) % filtered.len(),
            (Some(pos), false) => (pos + filtered.len() - 1) % filtered.len(),
        };
        self.selected = Some(records[filtered[next]].id);
    }

    pub fn select(&mut self, person: &Person) {
        self.selected = Some(person.id);
        self.center = (person.latitude, person.longitude);
        self.show_popup = true;
    }

    pub fn toggle_popup(&mut self) {
        self.show_popup = self.selected.is_some() && !self.show_popup;
    }

    /// Drops a selection that is no longer part of the filtered subset.
    pub fn sync(&mut self, records: &[Person], filtered: &[usize]) {
        if let Some(id) = self.selected
            && !filtered.iter().any(|&idx| records[idx].id == id)
        {
            trace!("Selected marker {id} was filtered out");
            self.selected = None;
            self.show_popup = false;
        }
    }

    pub fn selected_record<'a>(&self, records: &'a [Person], filtered: &[usize]) -> Option<&'a Person> {
        let id = self.selected?;
        filtered.iter().map(|&idx| &records[idx]).find(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::person;

    fn records() -> Vec<Person> {
        let mut a = person(1, "Aysel", "Mammadova", 1990, "2024-01-15T09:30:00Z");
        a.phone_number = "(501) 234 56 78".into();
        a.gps_code = "WAW-01".into();
        a.latitude = 52.2297;
        a.longitude = 21.0122;
        let mut b = person(2, "Rashad", "Aliyev", 1985, "2024-02-01T00:00:00Z");
        b.latitude = 50.0647;
        b.longitude = 19.945;
        let mut c = person(3, "Aynur", "Huseynova", 2000, "2023-12-31T23:59:00Z");
        c.latitude = 54.352;
        c.longitude = 18.6466;
        vec![a, b, c]
    }

    #[test]
    fn summary_is_a_fixed_block() {
        let records = records();
        assert_eq!(
            summary(&records[0]),
            "ID: 1\n\
             Ad: Aysel\n\
             Soyad: Mammadova\n\
             Telefon: 501-234-56-78\n\
             GPS Kodu: WAW-01\n\
             Doğum ili: 1990\n\
             Tarix və Saat: 15.01.2024 09:30\n\
             GPS: 52.2297, 21.0122"
        );
    }

    #[test]
    fn markers_follow_the_filtered_subset() {
        let records = records();
        assert!(markers(&records, &[]).is_empty());
        let m = markers(&records, &[0, 2]);
        assert_eq!(m.iter().map(|m| m.id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(m[1].latitude, 54.352);
    }

    #[test]
    fn default_viewport_and_zoom_limits() {
        let mut map = MapView::new(&DashConfig::default());
        assert_eq!(map.center, (52.4402961, 20.6717224));
        let [west, east] = map.x_bounds();
        assert!((east - west - 5.625).abs() < 1e-9);

        for _ in 0..30 {
            map.zoom_in();
        }
        assert_eq!(map.zoom, MAX_ZOOM);
        for _ in 0..30 {
            map.zoom_out();
        }
        assert_eq!(map.zoom, 0);
        map.pan(100, -100);
        assert_eq!(map.center, (90.0, -180.0));
        map.reset();
        assert_eq!((map.center, map.zoom), ((52.4402961, 20.6717224), 6));
    }

    #[test]
    fn fit_covers_every_marker() {
        let records = records();
        let mut map = MapView::new(&DashConfig::default());
        map.fit(&records, &[0, 1, 2]);
        let [south, north] = map.y_bounds();
        let [west, east] = map.x_bounds();
        for p in &records {
            assert!(p.latitude >= south && p.latitude <= north);
            assert!(p.longitude >= west && p.longitude <= east);
        }
        assert!(map.zoom > 0);

        let before = (map.center, map.zoom);
        map.fit(&records, &[]);
        assert_eq!((map.center, map.zoom), before);
    }

    #[test]
    fn selection_cycles_and_is_dropped_when_filtered_out() {
        let records = records();
        let mut map = MapView::new(&DashConfig::default());
        map.select_next(&records, &[0, 2], true);
        assert_eq!(map.selected, Some(1));
        map.select_next(&records, &[0, 2], true);
        assert_eq!(map.selected, Some(3));
        map.select_next(&records, &[0, 2], true);
        assert_eq!(map.selected, Some(1));
        map.select_next(&records, &[0, 2], false);
        assert_eq!(map.selected, Some(3));

        map.toggle_popup();
        assert!(map.show_popup);
        assert_eq!(map.selected_record(&records, &[0, 2]).map(|p| p.id), Some(3));

        map.sync(&records, &[0, 1]);
        assert_eq!(map.selected, None);
        assert!(!map.show_popup);
        map.toggle_popup();
        assert!(!map.show_popup);
    }
}
