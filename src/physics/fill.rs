//! Saturating fill level shared by the body and neck liquid columns.

/// Smallest extent a liquid column is given so its cylinder never degenerates.
pub const MIN_EXTENT: f32 = 0.001;

/// Accumulates the fill level toward the bottle capacity.
#[derive(Debug, Clone)]
pub struct FillController {
    level: f32,
    level_max: f32,
    fill_speed: f32,
    body_height: f32,
    neck_height: f32,
}

impl FillController {
    pub fn new(body_height: f32, neck_height: f32, fill_speed: f32) -> Self {
        Self {
            level: 0.0,
            level_max: body_height + neck_height,
            fill_speed,
            body_height,
            neck_height,
        }
    }

    /// Advance the level by `fill_speed * dt`, clamped at the maximum.
    ///
    /// Returns `true` on the frame the bottle becomes full.
    pub fn advance(&mut self, dt: f32) -> bool {
        if self.level >= self.level_max {
            return false;
        }
        self.level = (self.level + self.fill_speed * dt.max(0.0)).min(self.level_max);
        self.is_full()
    }

    pub fn reset(&mut self) {
        self.level = 0.0;
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn level_max(&self) -> f32 {
        self.level_max
    }

    pub fn fill_speed(&self) -> f32 {
        self.fill_speed
    }

    pub fn is_full(&self) -> bool {
        self.level >= self.level_max
    }

    /// Fraction of the capacity currently filled, in `[0, 1]`.
    pub fn fraction(&self) -> f32 {
        if self.level_max > 0.0 {
            self.level / self.level_max
        } else {
            1.0
        }
    }

    /// Liquid height inside the body.
    pub fn body_fill(&self) -> f32 {
        self.level.min(self.body_height)
    }

    /// Liquid height inside the neck; zero until the body is full.
    pub fn neck_fill(&self) -> f32 {
        (self.level - self.body_height).clamp(0.0, self.neck_height)
    }

    /// Rendered height of the body liquid cylinder.
    pub fn body_extent(&self) -> f32 {
        self.body_fill().max(MIN_EXTENT)
    }

    /// Rendered height of the neck liquid cylinder.
    pub fn neck_extent(&self) -> f32 {
        self.neck_fill().max(MIN_EXTENT)
    }
}
