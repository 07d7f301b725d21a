//! Pointer tilt and click ripple on the action buttons.
//!
//! Pointer moves only record a `Tilt` in a `TiltBoard`; the frame loop writes
//! it out, so a burst of move events costs one style write per button per
//! frame. Touch pointers and reduced motion never tilt.

/// Rotation of a button towards the pointer, in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Tilt {
    pub rx: f64,
    pub ry: f64,
}

impl Tilt {
    /// Tilt for a pointer at (`x`, `y`) inside a `w` x `h` box, both relative
    /// to the box's top-left corner. The centre is flat, the edges reach
    /// `max_deg`.
    pub fn from_pointer(x: f64, y: f64, w: f64, h: f64, max_deg: f64) -> Self {
        if !(w > 0.0 && h > 0.0) || !x.is_finite() || !y.is_finite() {
            return Self::default();
        }
        let nx = (x / w).clamp(0.0, 1.0) * 2.0 - 1.0;
        let ny = (y / h).clamp(0.0, 1.0) * 2.0 - 1.0;
        let max = max_deg.max(0.0);
        // top edge leans back, right edge turns away
        Self { rx: -ny * max, ry: nx * max }
    }

    pub fn is_flat(&self) -> bool {
        self.rx.abs() < 0.005 && self.ry.abs() < 0.005
    }

    /// CSS transform for this tilt combined with a uniform `scale`.
    pub fn transform(&self, scale: f64) -> String {
        if self.is_flat() {
            format!("scale({scale:.3})")
        } else {
            format!(
                "perspective(600px) rotateX({:.2}deg) rotateY({:.2}deg) scale({scale:.3})",
                self.rx, self.ry
            )
        }
    }
}

/// Latest tilt per button plus which ones still have to be written.
#[derive(Clone, Debug, Default)]
pub struct TiltBoard {
    tilts: Vec<Tilt>,
    dirty: Vec<bool>,
}

impl TiltBoard {
    pub fn new(buttons: usize) -> Self {
        Self {
            tilts: vec![Tilt::default(); buttons],
            dirty: vec![false; buttons],
        }
    }

    pub fn get(&self, index: usize) -> Tilt {
        self.tilts.get(index).copied().unwrap_or_default()
    }

    pub fn set(&mut self, index: usize, tilt: Tilt) {
        if let (Some(slot), Some(dirty)) = (self.tilts.get_mut(index), self.dirty.get_mut(index)) {
            if *slot != tilt {
                *slot = tilt;
                *dirty = true;
            }
        }
    }

    /// Indices with an unwritten tilt that `writable` accepts, clearing their
    /// flag. Rejected buttons stay pending for a later frame.
    pub fn take_pending(&mut self, writable: impl Fn(usize) -> bool) -> Vec<usize> {
        let mut out = Vec::new();
        for (i, dirty) in self.dirty.iter_mut().enumerate() {
            if *dirty && writable(i) {
                *dirty = false;
                out.push(i);
            }
        }
        out
    }
}

/// Placement of a click ripple inside its button, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ripple {
    pub left: f64,
    pub top: f64,
    pub size: f64,
}

impl Ripple {
    /// A circle big enough to cover a `w` x `h` button, centred on the click.
    pub fn at(x: f64, y: f64, w: f64, h: f64) -> Self {
        let size = w.max(h).max(0.0);
        Self {
            left: x - size / 2.0,
            top: y - size / 2.0,
            size,
        }
    }
}
