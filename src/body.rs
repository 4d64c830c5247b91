//! Disk state and per-disk kinematics.

/// Lowest speed multiplier the integrator accepts. Smaller requests are raised to it.
pub const MIN_SPEED_MULTIPLIER: f32 = 0.1;

/// Axis-aligned rectangular arena with its origin at `(0, 0)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Arena {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// A disk carrying a number of coins.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
    /// Coins held, always within `[0, max_coins]` of the owning population.
    pub coins: u32,
}

impl Body {
    pub fn new(x: f32, y: f32, vx: f32, vy: f32, radius: f32, coins: u32) -> Self {
        Self {
            x,
            y,
            vx,
            vy,
            radius,
            coins,
        }
    }

    /// Euclidean distance between the two centres.
    #[inline]
    pub fn distance_to(&self, other: &Body) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Move by `dt * speed` along the velocity, then bounce off the arena walls.
    ///
    /// A disk whose edge crosses a wall is put back touching that wall and the
    /// velocity component for that axis is negated. Axes are handled independently.
    pub fn advance(&mut self, dt: f32, speed: f32, arena: &Arena) {
        let scale = dt * clamp_speed(speed);
        self.x += self.vx * scale;
        self.y += self.vy * scale;

        reflect(&mut self.x, &mut self.vx, self.radius, arena.width);
        reflect(&mut self.y, &mut self.vy, self.radius, arena.height);
    }
}

/// Raise a requested speed multiplier to the positive floor.
#[inline]
pub fn clamp_speed(speed: f32) -> f32 {
    if speed.is_nan() {
        return MIN_SPEED_MULTIPLIER;
    }
    speed.max(MIN_SPEED_MULTIPLIER)
}

#[inline]
fn reflect(pos: &mut f32, vel: &mut f32, radius: f32, extent: f32) {
    if *pos - radius < 0.0 {
        *pos = radius;
        *vel = -*vel;
    } else if *pos + radius > extent {
        *pos = extent - radius;
        *vel = -*vel;
    }
}
