use crate::memory::*;

/// Enum with possible abort strategies.
/// These strategies decide when the iterations of a running k-means calculation stop early,
/// before the iteration cap is reached.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AbortStrategy<T: Primitive> {
	/// Stop directly after the first iteration whose improvement of the distance sum is `<= threshold`.
	/// ## Fields:
	/// - **threshold**: Minimal improvement, that still counts as improvement
    NoImprovement { threshold: T },
    /// Stop once **x** consecutive iterations did not improve the distance sum by more than **threshold**.
	/// ## Fields:
	/// - **x**: Amount of consecutive iterations without improvement, after which the calculation stops
	/// - **threshold**: Minimal improvement, that still counts as improvement
	/// - **abort_on_negative**: Stop instantly when the distance sum grew (**true**), or count it as
	/// "no improvement" (**false**)
	NoImprovementForXIterations { x: usize, threshold: T, abort_on_negative: bool },
	/// Never stop early, always run up to the iteration cap.
	Never,
}
impl<T: Primitive> AbortStrategy<T> {
	pub(crate) fn create_logic(&self) -> AbortLogic<T> {
		AbortLogic { strategy: *self, prev_error: T::infinity(), no_improvement_counter: 0 }
	}
}


/// Running state of an [`AbortStrategy`] during one k-means calculation.
pub(crate) struct AbortLogic<T: Primitive> {
	strategy: AbortStrategy<T>,
	prev_error: T,
	no_improvement_counter: usize,
}
impl<T: Primitive> AbortLogic<T> {
	/// Feed the distance sum of a finished iteration.
	/// ## Returns
	/// - **true** if the calculation should continue
	/// - **false** if the calculation should stop
	pub(crate) fn next(&mut self, error: T) -> bool {
		let improvement = self.prev_error - error;
		self.prev_error = error;
		match self.strategy {
			AbortStrategy::NoImprovement { threshold } => improvement > threshold,
			AbortStrategy::NoImprovementForXIterations { x, threshold, abort_on_negative } => {
				if abort_on_negative && improvement < T::zero() {
					return false;
				}
				if improvement > threshold {
					self.no_improvement_counter = 0;
				} else {
					self.no_improvement_counter += 1;
				}
				self.no_improvement_counter < x
			},
			AbortStrategy::Never => true,
		}
	}
}
