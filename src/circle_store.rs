//! Registry of gesture curves.
//!
//! Curves are addressed by a monotonically increasing [`CurveId`] and are never
//! removed, so the store only grows over a session. A curve's point list is
//! only mutated through [`CircleStore::add_point`] while it is open, and it is
//! finalized exactly once with [`CircleStore::mark_done`].

use crate::{Error, Result};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable handle of a gesture curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CurveId(u64);

impl CurveId {
    /// Wrap a raw id, e.g. one read back from a log or recording
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw numeric value
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CurveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An ordered, append-only 3D point sequence plus its completion flag
#[derive(Debug, Clone)]
pub struct GestureCurve {
    id: CurveId,
    points: Vec<Point3<f64>>,
    done: bool,
}

impl GestureCurve {
    fn new(id: CurveId) -> Self {
        Self {
            id,
            points: Vec::new(),
            done: false,
        }
    }

    /// Curve identifier
    #[must_use]
    pub fn id(&self) -> CurveId {
        self.id
    }

    /// Points in insertion order
    #[must_use]
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// Whether the curve has been finalized
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }
}

/// Immutable copy of a finished curve, handed to the geometry pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct CurveSnapshot {
    /// Curve the points belong to
    pub id: CurveId,
    /// Raw points in insertion order
    pub points: Vec<Point3<f64>>,
}

/// Id-keyed arena of gesture curves
#[derive(Debug, Default)]
pub struct CircleStore {
    curves: Vec<GestureCurve>,
    next_id: u64,
}

impl CircleStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new empty, open curve and return its id
    pub fn create_new_circle(&mut self) -> CurveId {
        let id = CurveId(self.next_id);
        self.next_id += 1;
        self.curves.push(GestureCurve::new(id));
        log::debug!("Created curve {id}");
        id
    }

    /// Append a point to an open curve
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownCurve`] if `id` was never allocated by this store
    /// - [`Error::CurveAlreadyFinished`] if the curve was already finalized
    pub fn add_point(&mut self, id: CurveId, point: Point3<f64>) -> Result<()> {
        let curve = self.get_mut(id)?;
        if curve.done {
            return Err(Error::CurveAlreadyFinished(id));
        }
        curve.points.push(point);
        Ok(())
    }

    /// Finalize a curve.
    ///
    /// A curve can be finalized once. A second call is rejected with
    /// [`Error::CurveAlreadyFinished`] and leaves the curve unchanged, so callers
    /// that only react to `Ok` never run the downstream pipeline twice.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownCurve`] if `id` was never allocated by this store
    /// - [`Error::CurveAlreadyFinished`] on a repeated call
    pub fn mark_done(&mut self, id: CurveId) -> Result<()> {
        let curve = self.get_mut(id)?;
        if curve.done {
            return Err(Error::CurveAlreadyFinished(id));
        }
        curve.done = true;
        log::debug!("Curve {id} finished with {} points", curve.points.len());
        Ok(())
    }

    /// Most recently created curve
    #[must_use]
    pub fn last(&self) -> Option<CurveId> {
        self.curves.last().map(GestureCurve::id)
    }

    /// The most recent curve if it is still open
    #[must_use]
    pub fn open_curve(&self) -> Option<CurveId> {
        self.curves.last().filter(|curve| !curve.done).map(GestureCurve::id)
    }

    /// Look up a curve
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownCurve`] if `id` was never allocated by this store
    pub fn get(&self, id: CurveId) -> Result<&GestureCurve> {
        self.index_of(id).map(|index| &self.curves[index])
    }

    /// Points of a curve
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownCurve`] if `id` was never allocated by this store
    pub fn points(&self, id: CurveId) -> Result<&[Point3<f64>]> {
        self.get(id).map(GestureCurve::points)
    }

    /// Copy a finished curve for the geometry pipeline
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownCurve`] if `id` was never allocated by this store
    /// - [`Error::InvalidInput`] if the curve is still open
    pub fn snapshot(&self, id: CurveId) -> Result<CurveSnapshot> {
        let curve = self.get(id)?;
        if !curve.done {
            return Err(Error::InvalidInput(format!("Curve {id} is still open")));
        }
        Ok(CurveSnapshot {
            id,
            points: curve.points.clone(),
        })
    }

    /// Number of curves ever created
    #[must_use]
    pub fn len(&self) -> usize {
        self.curves.len()
    }

    /// True if no curve was created yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    fn get_mut(&mut self, id: CurveId) -> Result<&mut GestureCurve> {
        let index = self.index_of(id)?;
        Ok(&mut self.curves[index])
    }

    // Ids are dense and start at 0, so the id doubles as the arena index.
    fn index_of(&self, id: CurveId) -> Result<usize> {
        usize::try_from(id.0)
            .ok()
            .filter(|&index| index < self.curves.len())
            .ok_or(Error::UnknownCurve(id))
    }
}
