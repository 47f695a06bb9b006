//! Simulated backend - fixed delay, always succeeds, no network

use std::time::Duration;
use tracing::info;

use crate::notification::channel::{Channel, DeliveryChannel, DeliveryError, OutboundMessage};

/// Prototype backend used when delivery mode is simulated
pub struct SimulatedChannel {
    channel: Channel,
    delay: Duration,
}

impl SimulatedChannel {
    pub fn new(channel: Channel, delay: Duration) -> Self {
        Self { channel, delay }
    }
}

impl DeliveryChannel for SimulatedChannel {
    fn name(&self) -> &str {
        match self.channel {
            Channel::Email => "simulated-email",
            Channel::Whatsapp => "simulated-whatsapp",
        }
    }

    fn channel(&self) -> Channel {
        self.channel
    }

    fn deliver(&self, message: &OutboundMessage<'_>) -> Result<(), DeliveryError> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        info!(
            channel = %self.channel,
            recipient = %message.recipient,
            "Simulated delivery"
        );
        Ok(())
    }
}
