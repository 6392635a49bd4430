use crate::records::AccessPointRecord;
use serde::Serialize;

/// Highest 2.4 GHz channel counted by default (ETSI/FCC plan).
pub const DEFAULT_MAX_CHANNEL: u8 = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelCount {
    pub channel: u8,
    pub count: usize,
}

/// Access points per channel over `1..=max_channel`, derived from one snapshot.
///
/// Records on channels outside the range are not counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelHistogram {
    pub channels: Vec<ChannelCount>,
    pub most_used_channel: u8,
}

impl ChannelHistogram {
    pub fn from_records(records: &[AccessPointRecord], max_channel: u8) -> Self {
        let mut counts = vec![0usize; max_channel as usize];
        for rec in records {
            if (1..=max_channel).contains(&rec.channel) {
                counts[rec.channel as usize - 1] += 1;
            }
        }

        let channels: Vec<ChannelCount> = counts
            .iter()
            .enumerate()
            .map(|(i, &count)| ChannelCount {
                channel: i as u8 + 1,
                count,
            })
            .collect();

        // Strictly-greater comparison keeps the lowest channel on ties.
        let mut most_used = ChannelCount { channel: 1, count: 0 };
        for c in &channels {
            if c.count > most_used.count {
                most_used = *c;
            }
        }

        Self {
            channels,
            most_used_channel: most_used.channel,
        }
    }

    pub fn count(&self, channel: u8) -> usize {
        self.channels
            .iter()
            .find(|c| c.channel == channel)
            .map(|c| c.count)
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.channels.iter().map(|c| c.count).sum()
    }
}
