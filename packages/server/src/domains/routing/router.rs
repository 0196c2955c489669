use serde::Serialize;
use tracing::{debug, info};

use super::extractor::NumberExtractor;
use crate::common::{HolderId, Money, NormalizedNumber, RelayResult};
use crate::config::RelaySettings;
use crate::kernel::RelayStore;

/// An OTP that must be forwarded to its holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryEvent {
    pub holder_id: HolderId,
    pub number: NormalizedNumber,
    /// The number as quoted in the channel text.
    pub matched: String,
    /// The full channel text.
    pub text: String,
    pub credited: Money,
}

impl DeliveryEvent {
    /// Message body sent to the holder.
    pub fn render(&self) -> String {
        format!(
            "🔑 OTP Alert!\n\nFrom: {}\n\nMessage:\n{}",
            self.matched, self.text
        )
    }
}

/// Reconciles channel text against live assignments.
#[derive(Debug, Clone)]
pub struct OtpRouter {
    extractor: NumberExtractor,
    credit: Money,
}

impl OtpRouter {
    pub fn new(settings: &RelaySettings) -> RelayResult<Self> {
        Ok(Self {
            extractor: NumberExtractor::new(&settings.extraction)?,
            credit: settings.otp_credit,
        })
    }

    pub fn credit(&self) -> Money {
        self.credit
    }

    /// Route one channel message.
    ///
    /// Each candidate is settled on its own: the holder is credited and the
    /// assignment cleared together, so replaying the same text is a no-op.
    pub async fn route(&self, text: &str, store: &dyn RelayStore) -> RelayResult<Vec<DeliveryEvent>> {
        let candidates = self.extractor.candidates(text);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let mut deliveries = Vec::new();
        for candidate in candidates {
            let Some(holder_id) = store.resolve(&candidate.number).await? else {
                debug!(number = %candidate.number, "no holder for candidate");
                continue;
            };

            // A concurrent supersede or clear can win between resolve and settle
            if !store
                .settle_match(&candidate.number, holder_id, self.credit)
                .await?
            {
                debug!(number = %candidate.number, holder_id = %holder_id, "assignment gone before settle");
                continue;
            }

            info!(
                number = %candidate.number,
                holder_id = %holder_id,
                credit = %self.credit,
                "OTP matched"
            );
            deliveries.push(DeliveryEvent {
                holder_id,
                number: candidate.number,
                matched: candidate.matched,
                text: text.to_string(),
                credited: self.credit,
            });
        }

        Ok(deliveries)
    }
}
