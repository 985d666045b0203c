use serde::Serialize;

use crate::{InstrumentId, Levels, Signal, UtcDateTime};

/// A leveled signal ready for delivery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub instrument: InstrumentId,
    pub signal: Signal,
    pub levels: Levels,
    pub detected_at: UtcDateTime,
}

impl Alert {
    /// Plain-text message body, one field per line.
    pub fn render_text(&self) -> String {
        let mut lines = vec![
            format!("{} - {}", self.instrument, self.signal.kind().label()),
            format!("Price: {}", self.signal.reference_price()),
        ];
        if let Some(pct) = self.signal.percent_change() {
            lines.push(format!("Change: {pct:+.2}%"));
        }
        lines.push(format!("Entry: {}", self.levels.entry));
        lines.push(format!("Stop Loss: {}", self.levels.stop_loss));
        lines.push(format!("Take Profit: {}", self.levels.take_profit));
        lines.push(format!("Time: {}", self.detected_at.format_alert()));
        lines.join("\n")
    }
}
