use crate::app::LoadState;
use crate::logic::SelectionPhase;
use crate::models::{Crop, ThresholdField, ThresholdRange};
use crate::ui::components::{InputWidget, RangeWidget};
use crate::ui::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, StatefulWidget, Widget, Wrap},
};

pub struct SelectCropScreen<'a> {
    pub crops: &'a [Crop],
    pub selected: Option<&'a Crop>,
    pub edited: Option<&'a Crop>,
    pub phase: SelectionPhase,
    pub load_state: &'a LoadState,
    pub list_index: usize,
    pub focused_field: ThresholdField,
    pub input_active: bool,
    pub edit_buffer: &'a str,
    pub status: Option<&'a str>,
}

impl<'a> SelectCropScreen<'a> {
    pub fn new(crops: &'a [Crop], load_state: &'a LoadState) -> Self {
        Self {
            crops,
            selected: None,
            edited: None,
            phase: SelectionPhase::Unselected,
            load_state,
            list_index: 0,
            focused_field: ThresholdField::MinTemperature,
            input_active: false,
            edit_buffer: "",
            status: None,
        }
    }

    pub fn with_selection(
        mut self,
        selected: Option<&'a Crop>,
        edited: Option<&'a Crop>,
        phase: SelectionPhase,
    ) -> Self {
        self.selected = selected;
        self.edited = edited;
        self.phase = phase;
        self
    }

    pub fn with_cursor(mut self, list_index: usize, field: ThresholdField) -> Self {
        self.list_index = list_index;
        self.focused_field = field;
        self
    }

    pub fn input(mut self, active: bool, buffer: &'a str) -> Self {
        self.input_active = active;
        self.edit_buffer = buffer;
        self
    }

    pub fn with_status(mut self, status: Option<&'a str>) -> Self {
        self.status = status;
        self
    }
}

impl Widget for SelectCropScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title
                Constraint::Min(10),   // Content
                Constraint::Length(1), // Status
                Constraint::Length(1), // Nav
            ])
            .split(area);

        let title = Line::from(vec![
            Span::styled("Select Crop", Theme::title()),
            Span::styled(format!(" - {}", self.phase.as_str()), Theme::dim()),
        ]);
        Paragraph::new(title).render(chunks[0], buf);

        match self.load_state {
            LoadState::Loading => {
                Paragraph::new(Span::styled("Loading crops...", Theme::dim()))
                    .render(chunks[1], buf);
            }
            LoadState::Failed(message) => self.render_error(message, chunks[1], buf),
            LoadState::Ready => {
                let content = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
                    .split(chunks[1]);

                self.render_list(content[0], buf);
                self.render_details(content[1], buf);
            }
        }

        if let Some(status) = self.status {
            Paragraph::new(Span::styled(status, Theme::warning())).render(chunks[2], buf);
        }

        Paragraph::new(self.nav_line()).render(chunks[3], buf);
    }
}

impl SelectCropScreen<'_> {
    fn render_error(&self, message: &str, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title("Error")
            .borders(Borders::ALL)
            .border_style(Theme::error());

        let inner = block.inner(area);
        block.render(area, buf);

        let lines = vec![
            Line::from(Span::styled(message.to_string(), Theme::error())),
            Line::from(""),
            Line::from(vec![
                Span::styled("[r]", Theme::nav_key()),
                Span::styled(" Retry", Theme::nav_label()),
            ]),
        ];
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .render(inner, buf);
    }

    fn render_list(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title("Available Crops")
            .borders(Borders::ALL)
            .border_style(Theme::border());

        let selected_id = self.selected.map(|c| c.id);

        let items: Vec<ListItem> = self
            .crops
            .iter()
            .enumerate()
            .map(|(i, crop)| {
                let style = if Some(crop.id) == selected_id {
                    Theme::chosen()
                } else if i == self.list_index {
                    Theme::selected()
                } else {
                    Theme::normal()
                };
                let marker = if i == self.list_index { "> " } else { "  " };
                ListItem::new(Line::from(vec![
                    Span::styled(marker, Theme::highlight()),
                    Span::styled(crop.name.clone(), style),
                ]))
            })
            .collect();

        if items.is_empty() {
            let inner = block.inner(area);
            block.render(area, buf);
            Paragraph::new(Span::styled("The catalog is empty", Theme::dim())).render(inner, buf);
            return;
        }

        // Scrolls to keep the highlighted row visible
        let mut state = ListState::default().with_selected(Some(self.list_index));
        StatefulWidget::render(List::new(items).block(block), area, buf, &mut state);
    }

    fn render_details(&self, area: Rect, buf: &mut Buffer) {
        let Some(crop) = self.edited else {
            let block = Block::default()
                .title("Crop Details")
                .borders(Borders::ALL)
                .border_style(Theme::border());
            let inner = block.inner(area);
            block.render(area, buf);

            let lines = vec![
                Line::from(Span::styled("No Crop Selected", Theme::header())),
                Line::from(Span::styled(
                    "Select a crop from the list to view its details",
                    Theme::dim(),
                )),
            ];
            Paragraph::new(lines)
                .wrap(Wrap { trim: true })
                .render(inner, buf);
            return;
        };

        let title = self.selected.map(|c| c.name.as_str()).unwrap_or(&crop.name);
        let block = Block::default()
            .title(title.to_string())
            .borders(Borders::ALL)
            .border_style(Theme::border_focused());
        let inner = block.inner(area);
        block.render(area, buf);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(9), Constraint::Length(2)])
            .split(inner);

        if self.phase == SelectionPhase::Editing {
            self.render_form(crop, chunks[0], buf);
        } else {
            self.render_ranges(crop, chunks[0], buf);
        }

        let schedule = match (crop.start_time.as_deref(), crop.end_time.as_deref()) {
            (Some(start), Some(end)) if !start.is_empty() && !end.is_empty() => {
                format!("Irrigation {} - {}", start, end)
            }
            _ => "No irrigation window saved".to_string(),
        };
        Paragraph::new(Span::styled(schedule, Theme::dim())).render(chunks[1], buf);
    }

    fn render_ranges(&self, crop: &Crop, area: Rect, buf: &mut Buffer) {
        let constraints: Vec<Constraint> = ThresholdRange::all()
            .iter()
            .map(|_| Constraint::Length(4))
            .collect();
        let areas = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        for (i, range) in ThresholdRange::all().iter().enumerate() {
            RangeWidget::new(crop, *range).render(areas[i], buf);
        }
    }

    fn render_form(&self, crop: &Crop, area: Rect, buf: &mut Buffer) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                ThresholdRange::all()
                    .iter()
                    .map(|_| Constraint::Length(3))
                    .collect::<Vec<_>>(),
            )
            .split(area);

        for (row, range) in ThresholdRange::all().iter().enumerate() {
            let cols = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(rows[row]);

            let (min_field, max_field) = range.bounds();
            for (col, field) in [min_field, max_field].into_iter().enumerate() {
                let focused = field == self.focused_field;
                let editing = focused && self.input_active;
                let value = if editing {
                    self.edit_buffer.to_string()
                } else {
                    field.get(crop).to_string()
                };

                InputWidget::new(field.label(), &value)
                    .focused(focused)
                    .editing(editing)
                    .render(cols[col], buf);
            }
        }
    }

    fn nav_line(&self) -> Line<'static> {
        let mut spans = Vec::new();
        let mut key = |k: &'static str, label: &'static str| {
            spans.push(Span::styled(k, Theme::nav_key()));
            spans.push(Span::styled(label, Theme::nav_label()));
        };

        if self.input_active {
            key("[Enter]", "Save ");
            key("[Esc]", "Cancel");
        } else if self.phase == SelectionPhase::Editing {
            key("[↑↓]", "Field ");
            key("[Enter]", "Edit value ");
            key("[e]", "View only ");
            key("[u]", "Use this crop ");
            key("[q]", "Quit");
        } else {
            key("[↑↓]", "Navigate ");
            key("[Enter]", "Select ");
            if self.phase.has_selection() {
                key("[e]", "Edit values ");
                key("[u]", "Use this crop ");
            }
            key("[r]", "Reload ");
            key("[q]", "Quit");
        }

        Line::from(spans)
    }
}
