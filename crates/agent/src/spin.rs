use std::sync::Arc;

use async_trait::async_trait;
use chowbot_core::domain::intent::GuildId;
use chowbot_core::spin::{
    default_candidates, result_message, rolling_message, step_delays, SpinSource, MAX_SPIN_STEPS,
    MIN_SPIN_STEPS,
};
use chowbot_db::WishlistRepository;
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SpinError {
    #[error("spin needs at least one candidate")]
    EmptyPool,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct DisplayError(pub String);

/// The message a spin animates in place.
#[async_trait]
pub trait SpinDisplay: Send + Sync {
    async fn show(&self, text: &str) -> Result<(), DisplayError>;
}

pub struct SpinSelector {
    wishlist: Arc<dyn WishlistRepository>,
}

impl SpinSelector {
    pub fn new(wishlist: Arc<dyn WishlistRepository>) -> Self {
        Self { wishlist }
    }

    /// Explicit items always win; `Wishlist` without a guild is empty.
    pub async fn pick_candidates(
        &self,
        guild: Option<GuildId>,
        explicit_items: Vec<String>,
        source: SpinSource,
    ) -> Vec<String> {
        if !explicit_items.is_empty() {
            return explicit_items;
        }
        match (source, guild) {
            (SpinSource::Default, _) => default_candidates(),
            (SpinSource::Wishlist, Some(guild)) => self.wishlist.list(guild).await,
            (SpinSource::Wishlist, None) => Vec::new(),
            (SpinSource::Auto, Some(guild)) => {
                let items = self.wishlist.list(guild).await;
                if items.is_empty() {
                    default_candidates()
                } else {
                    items
                }
            }
            (SpinSource::Auto, None) => default_candidates(),
        }
    }
}

/// Animated reveal: 8 to 12 uniform draws with growing pauses; the last draw wins.
/// Display errors are logged and the spin carries on.
pub async fn run_spin<R: Rng + Send>(
    candidates: &[String],
    display: &dyn SpinDisplay,
    rng: &mut R,
) -> Result<String, SpinError> {
    if candidates.is_empty() {
        return Err(SpinError::EmptyPool);
    }

    let steps = rng.gen_range(MIN_SPIN_STEPS..=MAX_SPIN_STEPS);
    let mut choice = String::new();
    for delay in step_delays(steps) {
        choice = candidates.choose(rng).cloned().unwrap_or_default();
        if let Err(error) = display.show(&rolling_message(&choice)).await {
            debug!(event_name = "agent.spin.display_failed", error = %error, "spin frame dropped");
        }
        tokio::time::sleep(delay).await;
    }

    if let Err(error) = display.show(&result_message(&choice)).await {
        debug!(event_name = "agent.spin.display_failed", error = %error, "spin result not shown");
    }
    info!(event_name = "agent.spin.completed", steps, pool = candidates.len(), "spin finished");
    Ok(choice)
}
