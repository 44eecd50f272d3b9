use hustle_value::Cell;

/// Supplies the roots of a collection.
///
/// The visitor receives `&mut Cell` so that roots can be updated in place when their objects
/// move. Integers and nulls may be passed too, they are ignored.
pub trait MarkRoots {
    fn mark_roots(&mut self, visit: &mut dyn FnMut(&mut Cell));
}

impl<F> MarkRoots for F
where
    F: FnMut(&mut dyn FnMut(&mut Cell)),
{
    fn mark_roots(&mut self, visit: &mut dyn FnMut(&mut Cell)) {
        self(visit)
    }
}

/// No roots at all: the next collection frees everything.
pub struct NoRoots;

impl MarkRoots for NoRoots {
    fn mark_roots(&mut self, _: &mut dyn FnMut(&mut Cell)) {}
}
