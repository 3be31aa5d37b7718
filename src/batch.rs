//! Line-oriented batch filtering: entries in, one JSON decision per line out.
//!
//! Input lines are either `VideoEntry` JSON objects
//! (`{"title": "...", "channel": "...", "short": false}`) or bare titles.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{BufRead, Write};

use crate::BrainFilterError;
use crate::classify::Classifier;
use crate::config::FilterSettings;
use crate::policy::{Verdict, VideoEntry, evaluate};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub total: u64,
    pub filtered: u64,
}

#[derive(Serialize)]
struct Decision<'a> {
    title: Option<&'a str>,
    channel: Option<&'a str>,
    #[serde(flatten)]
    verdict: &'a Verdict,
}

/// Distinct entries remembered per run before the cache starts over.
const DEDUP_CAPACITY: usize = 4096;

/// Only a JSON object is an entry; any other line is a bare title.
pub(crate) fn parse_entry(line: &str) -> VideoEntry {
    match serde_json::from_str::<serde_json::Value>(line) {
        Ok(value) if value.is_object() => {
            VideoEntry::deserialize(value).unwrap_or_else(|_| VideoEntry::titled(line))
        }
        _ => VideoEntry::titled(line),
    }
}

/// Verdicts for entries already seen in this run, cleared when full.
struct VerdictCache {
    capacity: usize,
    entries: HashMap<VideoEntry, Verdict>,
}

impl VerdictCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
        }
    }

    fn get(&self, entry: &VideoEntry) -> Option<Verdict> {
        self.entries.get(entry).cloned()
    }

    fn insert(&mut self, entry: VideoEntry, verdict: Verdict) {
        if self.entries.len() >= self.capacity {
            log::debug!("dedup cache full ({} entries), clearing", self.entries.len());
            self.entries.clear();
        }
        self.entries.insert(entry, verdict);
    }
}

/// Evaluate every entry read from `reader` and write decisions to `writer`.
///
/// Identical entries are classified once while the dedup cache still holds
/// them; it starts over after `DEDUP_CAPACITY` distinct entries.
pub fn run_batch<R: BufRead, W: Write>(
    reader: R,
    mut writer: W,
    classifier: &mut Classifier,
    settings: &FilterSettings,
    hour: u8,
) -> Result<Stats, BrainFilterError> {
    let mut stats = Stats::default();
    let mut seen = VerdictCache::new(DEDUP_CAPACITY);

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let entry = parse_entry(line);
        let verdict = match seen.get(&entry) {
            Some(v) => v,
            None => {
                let v = evaluate(classifier, &entry, hour, settings);
                seen.insert(entry.clone(), v.clone());
                v
            }
        };

        stats.total += 1;
        if verdict.filter {
            stats.filtered += 1;
        }

        let decision = Decision {
            title: entry.title.as_deref(),
            channel: entry.channel.as_deref(),
            verdict: &verdict,
        };
        serde_json::to_writer(&mut writer, &decision)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    if stats.filtered > 0 {
        log::info!("{}/{} entries filtered", stats.filtered, stats.total);
    }
    Ok(stats)
}
