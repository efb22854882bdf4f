//! Bar chart of the financial breakdown for the selected district.

use crate::data::FinancialDataset;
use crate::view::TRANSITION_MS;
use serde::Serialize;

pub const MARGIN_TOP: f64 = 20.0;
pub const MARGIN_RIGHT: f64 = 20.0;
pub const MARGIN_BOTTOM: f64 = 30.0;
pub const MARGIN_LEFT: f64 = 40.0;

/// Plot area inside the 370×300 chart.
pub const CHART_WIDTH: f64 = 370.0 - MARGIN_LEFT - MARGIN_RIGHT;
pub const CHART_HEIGHT: f64 = 300.0 - MARGIN_TOP - MARGIN_BOTTOM;

const BAND_PADDING: f64 = 0.1;

/// Ordinal scale splitting a pixel range into equal, integer-aligned bands.
#[derive(Debug, Clone, PartialEq)]
pub struct BandScale {
    domain: Vec<String>,
    start: f64,
    step: f64,
    band: f64,
}

impl BandScale {
    /// `padding` is used both between bands and at the outer edges; leftover
    /// pixels from rounding are split evenly on both sides.
    pub fn round_bands(domain: Vec<String>, range: [f64; 2], padding: f64) -> Self {
        let n = domain.len() as f64;
        let [start, stop] = range;
        if domain.is_empty() {
            return Self { domain, start, step: 0.0, band: 0.0 };
        }
        let step = ((stop - start) / (n - padding + 2.0 * padding)).floor();
        let error = stop - start - (n - padding) * step;
        Self {
            domain,
            start: start + (error / 2.0).round(),
            step,
            band: (step * (1.0 - padding)).round(),
        }
    }

    pub fn position(&self, label: &str) -> Option<f64> {
        let index = self.domain.iter().position(|d| d == label)?;
        Some(self.start + self.step * index as f64)
    }

    pub fn bandwidth(&self) -> f64 {
        self.band
    }
}

/// Linear scale from a value domain onto a pixel range. A zero-width domain
/// maps everything onto the start of the range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: [f64; 2],
    range: [f64; 2],
}

impl LinearScale {
    pub fn new(domain: [f64; 2], range: [f64; 2]) -> Self {
        Self { domain, range }
    }

    pub fn map(&self, value: f64) -> f64 {
        let span = self.domain[1] - self.domain[0];
        let t = if span == 0.0 { 0.0 } else { (value - self.domain[0]) / span };
        self.range[0] + t * (self.range[1] - self.range[0])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: Option<f64>,
    pub x: f64,
    pub width: f64,
    pub y: f64,
    pub height: f64,
}

/// Everything needed to redraw the chart for one key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartFrame {
    pub key: Option<String>,
    pub domain: [f64; 2],
    pub bars: Vec<Bar>,
    pub bar_duration_ms: u64,
    /// The value axis redraws once the bars have settled.
    pub axis_delay_ms: u64,
}

/// Lay out one bar per category for `key`. Categories with no value for the
/// key get a zero-height bar at the baseline.
pub fn render_chart(dataset: &FinancialDataset, key: Option<&str>) -> ChartFrame {
    let values: Vec<Option<f64>> = (0..dataset.categories.len())
        .map(|i| key.and_then(|k| dataset.value(i, k)))
        .collect();

    let max = values.iter().flatten().copied().fold(f64::NEG_INFINITY, f64::max);
    let domain = [0.0, if max.is_finite() { max } else { 0.0 }];

    let x = BandScale::round_bands(
        dataset.categories.iter().map(|c| c.label.clone()).collect(),
        [0.0, CHART_WIDTH],
        BAND_PADDING,
    );
    let y = LinearScale::new(domain, [CHART_HEIGHT, 0.0]);

    let bars = dataset
        .categories
        .iter()
        .zip(values)
        .map(|(category, value)| {
            // Negative shares would reach below the baseline; they sit on it.
            let top = value.map_or(CHART_HEIGHT, |v| y.map(v).min(CHART_HEIGHT));
            Bar {
                label: category.label.clone(),
                value,
                x: x.position(&category.label).unwrap_or(0.0),
                width: x.bandwidth(),
                y: top,
                height: CHART_HEIGHT - top,
            }
        })
        .collect();

    ChartFrame {
        key: key.map(str::to_string),
        domain,
        bars,
        bar_duration_ms: TRANSITION_MS,
        axis_delay_ms: TRANSITION_MS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::parse_financial;

    fn dataset() -> FinancialDataset {
        let csv = "letter,E06000001,E06000002\nA,0.2,0.1\nB,0.1,\nC,0.05,0.4\n";
        parse_financial(csv.as_bytes()).unwrap()
    }

    #[test]
    fn domain_tracks_the_key_maximum() {
        let frame = render_chart(&dataset(), Some("E06000001"));
        assert_eq!(frame.domain, [0.0, 0.2]);
        assert_eq!(frame.bars[0].height, CHART_HEIGHT);
        assert_eq!(frame.bars[0].y, 0.0);
        assert!((frame.bars[1].height - CHART_HEIGHT / 2.0).abs() < 1e-9);

        let frame = render_chart(&dataset(), Some("E06000002"));
        assert_eq!(frame.domain, [0.0, 0.4]);
        assert_eq!(frame.bars[2].height, CHART_HEIGHT);
    }

    #[test]
    fn blank_cell_draws_an_empty_bar() {
        let frame = render_chart(&dataset(), Some("E06000002"));
        let bar = &frame.bars[1];
        assert_eq!(bar.value, None);
        assert_eq!(bar.height, 0.0);
        assert_eq!(bar.y, CHART_HEIGHT);
    }

    #[test]
    fn unknown_key_flattens_every_bar() {
        for key in [Some("W06000001"), None] {
            let frame = render_chart(&dataset(), key);
            assert_eq!(frame.domain, [0.0, 0.0]);
            assert_eq!(frame.bars.len(), 3);
            for bar in &frame.bars {
                assert_eq!(bar.height, 0.0);
                assert!(bar.y.is_finite());
            }
        }
    }

    #[test]
    fn negative_value_never_gives_negative_height() {
        let csv = "letter,E06000001\nA,0.2\nB,-0.05\n";
        let frame = render_chart(&parse_financial(csv.as_bytes()).unwrap(), Some("E06000001"));
        assert_eq!(frame.domain, [0.0, 0.2]);
        let bar = &frame.bars[1];
        assert_eq!(bar.value, Some(-0.05));
        assert_eq!(bar.height, 0.0);
        assert_eq!(bar.y, CHART_HEIGHT);
    }

    #[test]
    fn timings_are_fixed() {
        let frame = render_chart(&dataset(), Some("E06000001"));
        assert_eq!(frame.bar_duration_ms, 750);
        assert_eq!(frame.axis_delay_ms, 750);
    }

    #[test]
    fn bands_are_rounded_and_centred() {
        let labels = ["A", "B", "C"].map(String::from).to_vec();
        let scale = BandScale::round_bands(labels, [0.0, 320.0], 0.1);
        // step = floor(320 / 3.1) = 103, leftover 21.3 split evenly.
        assert_eq!(scale.position("A"), Some(11.0));
        assert_eq!(scale.position("C"), Some(217.0));
        assert_eq!(scale.bandwidth(), 93.0);
        assert_eq!(scale.position("D"), None);
    }

    #[test]
    fn empty_dataset_renders_nothing() {
        let frame = render_chart(&FinancialDataset::default(), Some("E06000001"));
        assert!(frame.bars.is_empty());
        assert_eq!(frame.domain, [0.0, 0.0]);
    }
}
