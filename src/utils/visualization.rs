//! Plotting of the planner state with gnuplot
//!
//! Everything is drawn in the Cartesian frame. Frenet quantities (lane
//! bounds, corridor, obstacle margins) go through [`CoordinateTransformer`]
//! first. Layers are collected and rendered into a single set of axes when
//! the figure is saved.

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};

use crate::common::error::{GeometryError, PlannerError, PlannerResult};
use crate::common::types::{ObstacleSet, Path, PositionConstraint, Trajectory};
use crate::planning::coordinate_transform::CoordinateTransformer;

pub mod colors {
    pub const CENTERLINE: &str = "#808080";
    pub const LANE_BOUND: &str = "#000000";
    pub const CANDIDATE: &str = "#9ECAE1";
    pub const SELECTED: &str = "#FFA500";
    pub const OPTIMIZED: &str = "#FF0000";
    pub const CORRIDOR: &str = "#35C788";
    pub const OBSTACLE: &str = "#800080";
    pub const EGO: &str = "#0000FF";
}

/// Vertices of the circle drawn for an obstacle margin
const OBSTACLE_SEGMENTS: usize = 24;

#[derive(Debug, Clone)]
pub struct PathStyle {
    pub color: String,
    pub line_width: f64,
    pub caption: Option<String>,
}

impl PathStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            line_width: 2.0,
            caption: Some(caption.to_string()),
        }
    }

    /// Style without a legend entry
    pub fn uncaptioned(color: &str) -> Self {
        Self { color: color.to_string(), line_width: 1.0, caption: None }
    }

    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }
}

/// Closed polygon, first vertex repeated at the end
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polygon {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Polygon {
    fn closed(mut x: Vec<f64>, mut y: Vec<f64>) -> Self {
        if let (Some(&x0), Some(&y0)) = (x.first(), y.first()) {
            x.push(x0);
            y.push(y0);
        }
        Self { x, y }
    }
}

/// One quad per corridor step with corners
/// `(slb, dub)`, `(sub, dub)`, `(sub, dlb)`, `(slb, dlb)`
pub fn corridor_polygons(
    constraint: &PositionConstraint,
    transformer: &CoordinateTransformer<'_>,
) -> Result<Vec<Polygon>, GeometryError> {
    let n = constraint.len();
    for len in [constraint.slb.len(), constraint.sub.len(), constraint.dub.len()] {
        if len != n {
            return Err(GeometryError::LengthMismatch { expected: n, found: len });
        }
    }
    let mut polygons = Vec::with_capacity(n);
    for i in 0..n {
        let (slb, sub) = (constraint.slb[i], constraint.sub[i]);
        let (dlb, dub) = (constraint.dlb[i], constraint.dub[i]);
        let (x, y) = transformer.points_to_cartesian(&[slb, sub, sub, slb], &[dub, dub, dlb, dlb])?;
        polygons.push(Polygon::closed(x, y));
    }
    Ok(polygons)
}

/// Margin circle of an obstacle, drawn in the Frenet frame
pub fn obstacle_outline(
    s: f64,
    d: f64,
    radius: f64,
    transformer: &CoordinateTransformer<'_>,
) -> Result<Polygon, GeometryError> {
    let (ss, dd): (Vec<f64>, Vec<f64>) = (0..OBSTACLE_SEGMENTS)
        .map(|k| {
            let a = 2.0 * std::f64::consts::PI * k as f64 / OBSTACLE_SEGMENTS as f64;
            (s + radius * a.cos(), d + radius * a.sin())
        })
        .unzip();
    let (x, y) = transformer.points_to_cartesian(&ss, &dd)?;
    Ok(Polygon::closed(x, y))
}

#[derive(Debug, Clone)]
enum Layer {
    Line { x: Vec<f64>, y: Vec<f64>, style: PathStyle },
    Points { x: Vec<f64>, y: Vec<f64>, color: String, caption: String },
}

pub struct Visualizer {
    layers: Vec<Layer>,
    title: String,
    aspect_ratio: Option<f64>,
}

impl Visualizer {
    pub fn new() -> Self {
        Self { layers: Vec::new(), title: String::new(), aspect_ratio: Some(1.0) }
    }

    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    pub fn set_aspect_ratio(&mut self, ratio: Option<f64>) -> &mut Self {
        self.aspect_ratio = ratio;
        self
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn plot_xy(&mut self, x: &[f64], y: &[f64], style: &PathStyle) -> &mut Self {
        self.layers.push(Layer::Line { x: x.to_vec(), y: y.to_vec(), style: style.clone() });
        self
    }

    /// Centerline and both lane bounds
    pub fn plot_path(&mut self, path: &Path) -> Result<&mut Self, GeometryError> {
        let transformer = CoordinateTransformer::new(path);
        let (lx, ly) = transformer.points_to_cartesian(path.s(), path.dub())?;
        let (rx, ry) = transformer.points_to_cartesian(path.s(), path.dlb())?;
        self.plot_xy(path.x(), path.y(), &PathStyle::new(colors::CENTERLINE, "Centerline").with_line_width(1.0));
        self.plot_xy(&lx, &ly, &PathStyle::new(colors::LANE_BOUND, "Lane bounds").with_line_width(1.5));
        self.plot_xy(&rx, &ry, &PathStyle::uncaptioned(colors::LANE_BOUND).with_line_width(1.5));
        Ok(self)
    }

    /// Trajectories without Cartesian samples are skipped
    pub fn plot_trajectory(&mut self, traj: &Trajectory, style: &PathStyle) -> &mut Self {
        if traj.has_cartesian() {
            self.plot_xy(&traj.x, &traj.y, style);
        }
        self
    }

    pub fn plot_candidates(&mut self, candidates: &[Trajectory]) -> &mut Self {
        for (i, traj) in candidates.iter().enumerate() {
            let style = if i == 0 {
                PathStyle::new(colors::CANDIDATE, "Candidates").with_line_width(1.0)
            } else {
                PathStyle::uncaptioned(colors::CANDIDATE)
            };
            self.plot_trajectory(traj, &style);
        }
        self
    }

    pub fn plot_corridor(
        &mut self,
        constraint: &PositionConstraint,
        path: &Path,
    ) -> Result<&mut Self, GeometryError> {
        let transformer = CoordinateTransformer::new(path);
        for (i, poly) in corridor_polygons(constraint, &transformer)?.iter().enumerate() {
            let style = if i == 0 {
                PathStyle::new(colors::CORRIDOR, "Corridor").with_line_width(0.5)
            } else {
                PathStyle::uncaptioned(colors::CORRIDOR).with_line_width(0.5)
            };
            self.plot_xy(&poly.x, &poly.y, &style);
        }
        Ok(self)
    }

    /// Obstacle radius and the margin used for collision checks
    pub fn plot_obstacles(&mut self, obstacles: &ObstacleSet, path: &Path) -> Result<&mut Self, GeometryError> {
        let transformer = CoordinateTransformer::new(path);
        for (i, obs) in obstacles.iter().enumerate() {
            let body = obstacle_outline(obs.s, obs.d, obs.r, &transformer)?;
            let margin = obstacle_outline(obs.s, obs.d, obs.r_mgn, &transformer)?;
            let body_style = if i == 0 {
                PathStyle::new(colors::OBSTACLE, "Obstacles")
            } else {
                PathStyle::uncaptioned(colors::OBSTACLE).with_line_width(2.0)
            };
            self.plot_xy(&body.x, &body.y, &body_style);
            self.plot_xy(&margin.x, &margin.y, &PathStyle::uncaptioned(colors::OBSTACLE).with_line_width(0.5));
        }
        Ok(self)
    }

    pub fn plot_ego(&mut self, x: f64, y: f64) -> &mut Self {
        self.layers.push(Layer::Points {
            x: vec![x],
            y: vec![y],
            color: colors::EGO.to_string(),
            caption: "Ego".to_string(),
        });
        self
    }

    fn render(&self) -> Figure {
        let mut fg = Figure::new();
        let axes = fg.axes2d();
        for layer in &self.layers {
            match layer {
                Layer::Line { x, y, style } => {
                    let mut options = vec![Color(style.color.as_str()), LineWidth(style.line_width)];
                    if let Some(caption) = &style.caption {
                        options.push(Caption(caption.as_str()));
                    }
                    axes.lines(x, y, &options);
                }
                Layer::Points { x, y, color, caption } => {
                    axes.points(
                        x,
                        y,
                        &[Caption(caption.as_str()), Color(color.as_str()), PointSymbol('O'), PointSize(1.5)],
                    );
                }
            }
        }
        if !self.title.is_empty() {
            axes.set_title(&self.title, &[]);
        }
        axes.set_x_label("X [m]", &[]);
        axes.set_y_label("Y [m]", &[]);
        if let Some(ratio) = self.aspect_ratio {
            axes.set_aspect_ratio(AutoOption::Fix(ratio));
        }
        fg
    }

    pub fn save_svg(&self, filename: &str) -> PlannerResult<()> {
        let mut fg = self.render();
        fg.save_to_svg(filename, 800, 600)
            .map_err(|e| PlannerError::Visualization(e.to_string()))
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}
