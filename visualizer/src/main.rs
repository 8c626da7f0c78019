use iced::{
    mouse, time,
    widget::{
        button,
        canvas::{self, Canvas, Frame, Geometry, Path, Stroke},
        column, scrollable, text, text_input, Column, Container, Row,
    },
    Alignment, Color, Element, Length, Point, Rectangle, Renderer, Size, Subscription, Task,
    Theme,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, time::Duration};
use vigilcore::density::ColorMapper;

fn main() -> iced::Result {
    iced::application(Visualizer::boot, Visualizer::update, Visualizer::view)
        .title(application_title)
        .subscription(application_subscription)
        .theme(application_theme)
        .run()
}

fn application_title(_: &Visualizer) -> String {
    "Vigil Overlay Visualizer".into()
}

fn application_subscription(_: &Visualizer) -> Subscription<Message> {
    time::every(Duration::from_secs(1)).map(|_| Message::Tick)
}

fn application_theme(_: &Visualizer) -> Theme {
    Theme::Dark
}

#[derive(Debug)]
struct Visualizer {
    filter: FilterForm,
    dashboard: Option<DashboardPayload>,
    status: String,
    history: Vec<String>,
}

#[derive(Debug, Clone)]
enum Message {
    Tick,
    DashboardFetched(Result<DashboardPayload, String>),
    FilterFieldChanged(FilterField, String),
    SubmitFilter,
    FilterSubmitted(Result<String, String>),
}

#[derive(Debug, Clone, Copy)]
enum FilterField {
    Classes,
    WindowDays,
}

impl Visualizer {
    fn boot() -> (Self, Task<Message>) {
        (
            Visualizer {
                filter: FilterForm::default(),
                dashboard: None,
                status: "Waiting for tile models...".into(),
                history: Vec::new(),
            },
            Task::perform(fetch_dashboard(), Message::DashboardFetched),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => Task::perform(fetch_dashboard(), Message::DashboardFetched),
            Message::DashboardFetched(Ok(payload)) => {
                let rendered = payload
                    .tiles
                    .iter()
                    .filter(|tile| tile.status == "rendered")
                    .count();
                state.status = format!(
                    "Tile models received: {} cameras / {} rendered",
                    payload.tiles.len(),
                    rendered
                );
                state.push_history(format!(
                    "Tiles: {} cameras, {} renders total",
                    payload.tiles.len(),
                    payload.metrics.renders
                ));
                state.dashboard = Some(payload);
                Task::none()
            }
            Message::DashboardFetched(Err(err)) => {
                state.status = format!("Bridge error: {err}");
                Task::none()
            }
            Message::FilterFieldChanged(field, value) => {
                state.filter.update_field(field, value);
                Task::none()
            }
            Message::SubmitFilter => {
                let payload = state.filter.to_payload();
                Task::perform(post_filter(payload), Message::FilterSubmitted)
            }
            Message::FilterSubmitted(Ok(message)) => {
                state.status = message;
                state.push_history("Filter submitted".into());
                Task::none()
            }
            Message::FilterSubmitted(Err(err)) => {
                state.status = format!("Filter error: {err}");
                Task::none()
            }
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let filter_column = column![
            text("Overlay Filter").size(26),
            text_input("Classes (comma separated, empty = all)", &state.filter.classes)
                .on_input(|value| Message::FilterFieldChanged(FilterField::Classes, value))
                .padding(6),
            text_input("Time window (days)", &state.filter.window_days)
                .on_input(|value| Message::FilterFieldChanged(FilterField::WindowDays, value))
                .padding(6),
            button("Apply filter")
                .on_press(Message::SubmitFilter)
                .padding(10),
            text(&state.status).size(14),
            column![
                text("Parameter definitions").size(16),
                text("Classes: detection classes kept in the overlay; every other class is filtered out.")
                    .size(12),
                text("Time window: how many days of detections each camera tile accumulates.")
                    .size(12),
                text("Tiles refresh on their own 30 s cadence; filter changes repaint immediately.")
                    .size(12),
            ]
            .spacing(4)
            .padding(6),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fixed(340.0));

        let metrics_info = if let Some(dashboard) = &state.dashboard {
            text(format!(
                "Renders: {} | fetch failures: {} | stale drops: {}",
                dashboard.metrics.renders,
                dashboard.metrics.fetch_failures,
                dashboard.metrics.discarded_responses
            ))
            .size(14)
        } else {
            text("Metrics: n/a").size(14)
        };

        let tiles_column = if let Some(dashboard) = &state.dashboard {
            if dashboard.tiles.is_empty() {
                Column::new().push(text("No camera tiles yet").size(14))
            } else {
                dashboard
                    .tiles
                    .iter()
                    .fold(Column::new().spacing(12), |col, tile| {
                        col.push(tile_view(tile))
                    })
            }
        } else {
            Column::new().push(text("Waiting for the dashboard bridge...").size(14))
        };

        let history_list = if state.history.is_empty() {
            Column::new().push(text("No activity yet").size(12))
        } else {
            state
                .history
                .iter()
                .rev()
                .fold(Column::new().spacing(4), |col, entry| {
                    col.push(text(entry.clone()).size(12))
                })
        };

        let telemetry_column = column![
            text("Camera Tiles").size(26),
            metrics_info,
            scrollable(tiles_column).height(Length::Fixed(520.0)),
            text("Activity log").size(16),
            Container::new(scrollable(history_list).height(Length::Fixed(90.0))).padding(6),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fill);

        let layout = Row::new()
            .push(filter_column)
            .push(telemetry_column)
            .spacing(20)
            .align_y(Alignment::Start)
            .padding(20);

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn push_history(&mut self, entry: String) {
        self.history.push(entry);
        if self.history.len() > 20 {
            self.history.remove(0);
        }
    }
}

fn tile_view(tile: &TilePayload) -> Element<'_, Message> {
    let canvas = Canvas::new(HeatTile { tile: tile.clone() })
        .width(Length::Fill)
        .height(Length::Fixed(200.0));

    let classes = tile
        .class_counts
        .iter()
        .map(|(class, count)| format!("{class} {count}"))
        .collect::<Vec<_>>()
        .join(", ");
    let caption = if tile.online {
        format!(
            "{}: {} detections [{}]{}",
            tile.camera_id,
            tile.total_detections,
            tile.status,
            if classes.is_empty() {
                String::new()
            } else {
                format!(" ({classes})")
            }
        )
    } else {
        format!("{}: offline", tile.camera_id)
    };

    column![canvas, text(caption).size(13)].spacing(4).into()
}

async fn fetch_dashboard() -> Result<DashboardPayload, String> {
    let response = reqwest::get("http://127.0.0.1:9100/tiles")
        .await
        .map_err(|e| e.to_string())?;
    response
        .json::<DashboardPayload>()
        .await
        .map_err(|e| e.to_string())
}

async fn post_filter(filter: FilterPayload) -> Result<String, String> {
    let client = reqwest::Client::new();
    let response = client
        .post("http://127.0.0.1:9100/filter")
        .json(&filter)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if response.status().is_success() {
        Ok("Filter applied".into())
    } else {
        let status = response.status();
        let text = response.text().await.unwrap_or_else(|_| "".into());
        Err(format!("{}: {}", status, text))
    }
}

#[derive(Debug, Clone)]
struct FilterForm {
    classes: String,
    window_days: String,
}

impl Default for FilterForm {
    fn default() -> Self {
        Self {
            classes: String::new(),
            window_days: "7".into(),
        }
    }
}

impl FilterForm {
    fn update_field(&mut self, field: FilterField, value: String) {
        match field {
            FilterField::Classes => self.classes = value,
            FilterField::WindowDays => self.window_days = value,
        }
    }

    fn to_payload(&self) -> FilterPayload {
        let classes: Vec<String> = self
            .classes
            .split(',')
            .map(str::trim)
            .filter(|class| !class.is_empty())
            .map(str::to_string)
            .collect();
        FilterPayload {
            time_window_days: self.window_days.trim().parse().ok(),
            classes: if classes.is_empty() { None } else { Some(classes) },
        }
    }
}

#[derive(Debug, Serialize)]
struct FilterPayload {
    time_window_days: Option<u32>,
    classes: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DashboardPayload {
    #[serde(default)]
    tiles: Vec<TilePayload>,
    #[serde(default)]
    metrics: MetricsPayload,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
struct MetricsPayload {
    #[serde(default)]
    renders: usize,
    #[serde(default)]
    fetch_failures: usize,
    #[serde(default)]
    discarded_responses: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct TilePayload {
    camera_id: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    online: bool,
    #[serde(default)]
    total_detections: usize,
    #[serde(default)]
    class_counts: BTreeMap<String, usize>,
    #[serde(default)]
    viewport_width: u32,
    #[serde(default)]
    viewport_height: u32,
    #[serde(default)]
    grid_cols: usize,
    #[serde(default)]
    grid_rows: usize,
    #[serde(default)]
    cell_size: u32,
    #[serde(default)]
    cells: Vec<f32>,
}

#[derive(Clone)]
struct HeatTile {
    tile: TilePayload,
}

impl canvas::Program<Message> for HeatTile {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());

        // Simulated camera frame behind the overlay.
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.06, 0.07, 0.08),
        );
        let horizon = Path::new(|builder| {
            builder.move_to(Point::new(0.0, bounds.height * 0.6));
            builder.line_to(Point::new(bounds.width, bounds.height * 0.55));
        });
        frame.stroke(
            &horizon,
            Stroke::default().with_color(Color::from_rgb(0.16, 0.17, 0.2)),
        );

        if !self.tile.online {
            // Offline placeholder: crossed diagonals, no heat.
            let cross = Path::new(|builder| {
                builder.move_to(Point::ORIGIN);
                builder.line_to(Point::new(bounds.width, bounds.height));
                builder.move_to(Point::new(bounds.width, 0.0));
                builder.line_to(Point::new(0.0, bounds.height));
            });
            frame.stroke(
                &cross,
                Stroke::default()
                    .with_width(2.0)
                    .with_color(Color::from_rgb(0.45, 0.2, 0.2)),
            );
            return vec![frame.into_geometry()];
        }

        if self.tile.grid_cols > 0
            && self.tile.grid_rows > 0
            && self.tile.viewport_width > 0
            && self.tile.viewport_height > 0
        {
            let scale_x = bounds.width / self.tile.viewport_width as f32;
            let scale_y = bounds.height / self.tile.viewport_height as f32;
            let cell = self.tile.cell_size as f32;

            for (index, &value) in self.tile.cells.iter().enumerate() {
                if value <= 0.01 {
                    continue;
                }
                let row = index / self.tile.grid_cols;
                let col = index % self.tile.grid_cols;
                let color = ColorMapper::map(value);
                frame.fill_rectangle(
                    Point::new(col as f32 * cell * scale_x, row as f32 * cell * scale_y),
                    Size::new(cell * scale_x, cell * scale_y),
                    Color::from_rgba8(color.r, color.g, color.b, color.a as f32 / 255.0),
                );
            }
        }

        vec![frame.into_geometry()]
    }
}
