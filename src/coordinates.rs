//! Mapping between on-screen coordinates and model (time, concentration) coordinates.

/// Half of the width of the hit area around points and lines, in on-screen units.
pub const INT_END: f64 = 4.0;

/// Space left above the highest concentration of a fitted time series, in on-screen units.
pub const PADDING: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis aligned rectangle given by two corners, `x1 <= x2` and `y1 <= y2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Rect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Rect {
    pub fn around(center: Point, half_side: f64) -> Self {
        Self {
            x1: center.x - half_side,
            y1: center.y - half_side,
            x2: center.x + half_side,
            y2: center.y + half_side,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x1 && p.x < self.x2 && p.y >= self.y1 && p.y < self.y2
    }
}

/// Linear scale with `scaled = base * factor`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    factor: f64,
}

impl LinearScale {
    pub fn identity() -> Self {
        Self { factor: 1.0 }
    }

    pub fn new(factor: f64) -> Self {
        Self { factor }
    }

    /// Scale mapping `base` onto `scaled`.
    pub fn fitting(base: f64, scaled: f64) -> Self {
        Self { factor: scaled / base }
    }

    pub fn base(&self, scaled: f64) -> f64 {
        scaled / self.factor
    }

    pub fn scaled(&self, base: f64) -> f64 {
        base * self.factor
    }

    /// Adjust the scale so that the scaled range formerly covered by `old1..old2` is covered by
    /// `new1..new2`.
    pub fn resize(&mut self, old1: f64, new1: f64, old2: f64, new2: f64) {
        let scaled_range = self.scaled(old2) - self.scaled(old1);
        self.factor = scaled_range / (new2 - new1);
    }
}

impl Default for LinearScale {
    fn default() -> Self {
        Self::identity()
    }
}

/// Transformation between on-screen coordinates, where `y` grows downwards, and model
/// coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transformation {
    time_scale: LinearScale,
    concentration_scale: LinearScale,
    width: f64,
    height: f64,
}

impl Transformation {
    /// Identity transformation over a canvas of the given size.
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_scales(LinearScale::identity(), LinearScale::identity(), width, height)
    }

    pub fn with_scales(time_scale: LinearScale, concentration_scale: LinearScale, width: f64, height: f64) -> Self {
        Self {
            time_scale,
            concentration_scale,
            width,
            height,
        }
    }

    /// Transformation showing the time range `0..time_end` across the whole width and the
    /// concentration range `0..concentration_max` below a padding at the top.
    pub fn fitted(width: f64, height: f64, time_end: f64, concentration_max: f64) -> Self {
        Self::with_scales(
            LinearScale::fitting(width, time_end),
            LinearScale::fitting(height - PADDING, concentration_max),
            width,
            height,
        )
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.time_scale.resize(0.0, 0.0, self.width, width);
        self.concentration_scale.resize(0.0, 0.0, self.height, height);
        self.width = width;
        self.height = height;
    }

    pub fn x(&self, time: f64) -> f64 {
        self.time_scale.base(time)
    }

    pub fn y(&self, concentration: f64) -> f64 {
        self.height - self.concentration_scale.base(concentration)
    }

    pub fn time(&self, x: f64) -> f64 {
        self.time_scale.scaled(x)
    }

    pub fn concentration(&self, y: f64) -> f64 {
        self.concentration_scale.scaled(self.height - y)
    }

    /// On-screen position of a model point.
    pub fn to_screen(&self, time: f64, concentration: f64) -> Point {
        Point::new(self.x(time), self.y(concentration))
    }

    /// Model coordinates `(time, concentration)` of an on-screen point.
    pub fn to_model(&self, p: Point) -> Point {
        Point::new(self.time(p.x), self.concentration(p.y))
    }

    /// Largest visible time.
    pub fn time_bound(&self) -> f64 {
        self.time(self.width)
    }

    /// Largest visible concentration.
    pub fn concentration_bound(&self) -> f64 {
        self.concentration(0.0)
    }

    pub fn size(&self) -> Point {
        Point::new(self.width, self.height)
    }
}
