use tokio_util::sync::CancellationToken;

/// Cancellation handle of one actor incarnation, tagged with its generation.
///
/// Generations start at 1 and grow by one per restart. Cancelling the token
/// ends the incarnation and reaches every scope opened from its context.
#[derive(Debug, Clone)]
pub(crate) struct GenerationToken {
	generation: u64,
	cancel: CancellationToken,
}

impl GenerationToken {
	pub fn new(generation: u64, cancel: CancellationToken) -> Self {
		Self { generation, cancel }
	}

	pub const fn generation(&self) -> u64 {
		self.generation
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	pub async fn cancelled(&self) {
		self.cancel.cancelled().await;
	}

	/// Token for a child scope; cancelled along with this incarnation.
	pub fn child(&self) -> CancellationToken {
		self.cancel.child_token()
	}
}
