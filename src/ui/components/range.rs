use crate::models::{Crop, ThresholdRange};
use crate::ui::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Read-only view of one min/max band, drawn against a fixed scale.
pub struct RangeWidget<'a> {
    crop: &'a Crop,
    range: ThresholdRange,
}

impl<'a> RangeWidget<'a> {
    pub fn new(crop: &'a Crop, range: ThresholdRange) -> Self {
        Self { crop, range }
    }

    fn scale(&self) -> (f64, f64) {
        match self.range {
            ThresholdRange::Temperature => (-10.0, 50.0),
            ThresholdRange::SoilMoisture | ThresholdRange::Humidity => (0.0, 100.0),
        }
    }
}

impl Widget for RangeWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 3 || area.width < 10 {
            return;
        }

        let (min_field, max_field) = self.range.bounds();
        let min = min_field.get(self.crop);
        let max = max_field.get(self.crop);
        let unit = min_field.unit();
        let inverted = min > max;

        let title = format!("{} Range", self.range.as_str());
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Theme::border());

        let inner = block.inner(area);
        block.render(area, buf);

        let color = if inverted {
            Theme::ERROR
        } else {
            Theme::range_color(self.range)
        };

        let mut spans = vec![
            Span::styled("Min ", Theme::dim()),
            Span::styled(format!("{}{}", min, unit), Theme::header()),
            Span::styled("   Max ", Theme::dim()),
            Span::styled(format!("{}{}", max, unit), Theme::header()),
        ];
        if inverted {
            spans.push(Span::styled("  min > max", Theme::error()));
        }
        Paragraph::new(Line::from(spans)).render(inner, buf);

        if inner.height >= 2 && !inverted {
            let bar = Rect {
                x: inner.x,
                y: inner.y + 1,
                width: inner.width,
                height: 1,
            };

            let (lo, hi) = self.scale();
            let position = |v: f64| {
                let ratio = ((v - lo) / (hi - lo)).clamp(0.0, 1.0);
                bar.x + (ratio * (bar.width.saturating_sub(1)) as f64).round() as u16
            };
            let start = position(min);
            let end = position(max);

            for x in bar.x..bar.x + bar.width {
                let (ch, style) = if x >= start && x <= end {
                    ('█', Style::default().fg(color))
                } else {
                    ('░', Theme::dim())
                };
                buf[(x, bar.y)].set_char(ch).set_style(style);
            }
        }
    }
}
