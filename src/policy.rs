//! Filtering policy: settings + hour + classifier → hide or show.
//!
//! Every failure path allows the entry. A title is only hidden when a
//! loaded model positively assigns it to a filtered category (or its
//! channel is blocked, or it is a Short while "shorts" is filtered).

use chrono::Timelike;
use serde::{Deserialize, Serialize};

use crate::BrainFilterError;
use crate::classify::Classifier;
use crate::config::{FilterSettings, validate_hour};

/// Category name that hides Shorts without classifying them.
pub const SHORTS_CATEGORY: &str = "shorts";

/// Local wall-clock hour, 0..=23.
pub fn current_hour() -> u8 {
    chrono::Local::now().hour() as u8
}

/// One video entry as scraped from the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct VideoEntry {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub short: bool,
}

impl VideoEntry {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Reason {
    Disabled,
    AllowedHours,
    Short,
    BlockedChannel {
        /// Already carried by the entry itself in serialized output.
        #[serde(skip)]
        channel: String,
    },
    NoTitle,
    /// Hour or allowed window outside 0..=23; fail open.
    InvalidSchedule,
    /// No model could be loaded; fail open.
    Unavailable,
    Category { category: String, score: f64 },
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reason::Disabled => f.write_str("filtering disabled"),
            Reason::AllowedHours => f.write_str("inside allowed hours"),
            Reason::Short => f.write_str("short"),
            Reason::BlockedChannel { channel } => write!(f, "blocked channel {channel}"),
            Reason::NoTitle => f.write_str("no title"),
            Reason::InvalidSchedule => f.write_str("invalid hour or allowed window"),
            Reason::Unavailable => f.write_str("classifier unavailable"),
            Reason::Category { category, score } => write!(f, "{category} ({score:.3})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub filter: bool,
    #[serde(flatten)]
    pub reason: Reason,
}

impl Verdict {
    fn allow(reason: Reason) -> Self {
        Self {
            filter: false,
            reason,
        }
    }

    fn hide(reason: Reason) -> Self {
        Self {
            filter: true,
            reason,
        }
    }
}

fn unavailable(title: &str, e: &BrainFilterError) -> Verdict {
    if e.is_load_failure() {
        log::warn!("not filtering {title:?}: model unavailable: {e}");
    } else {
        log::error!("not filtering {title:?}: {e}");
    }
    Verdict::allow(Reason::Unavailable)
}

/// Hour and window bounds must all lie in 0..=23.
fn check_schedule(hour: u8, settings: &FilterSettings) -> Result<(), BrainFilterError> {
    validate_hour("hour", hour)?;
    settings.validate()
}

/// Classify a title, loading the model on first use.
fn classify_title(classifier: &mut Classifier, title: &str, settings: &FilterSettings) -> Verdict {
    if let Err(e) = classifier.ensure_loaded() {
        return unavailable(title, &e);
    }
    let prediction = match classifier.predict(title) {
        Ok(p) => p,
        Err(e) => return unavailable(title, &e),
    };

    log::debug!(
        "{title:?} → {} ({:.3})",
        prediction.category,
        prediction.score
    );
    let filter = settings.filters_category(&prediction.category);
    Verdict {
        filter,
        reason: Reason::Category {
            category: prediction.category,
            score: prediction.score,
        },
    }
}

/// Title-only decision. `hour` defaults to the local wall-clock hour.
///
/// An hour or window bound outside 0..=23 never filters.
pub fn should_filter(
    classifier: &mut Classifier,
    title: &str,
    hour: Option<u8>,
    settings: &FilterSettings,
) -> bool {
    if !settings.enabled {
        return false;
    }
    let hour = hour.unwrap_or_else(current_hour);
    if let Err(e) = check_schedule(hour, settings) {
        log::warn!("not filtering {title:?}: {e}");
        return false;
    }
    if settings.in_allowed_window(hour) {
        return false;
    }
    classify_title(classifier, title, settings).filter
}

/// Full per-entry decision: Shorts and blocked channels first, then the title.
pub fn evaluate(
    classifier: &mut Classifier,
    entry: &VideoEntry,
    hour: u8,
    settings: &FilterSettings,
) -> Verdict {
    if !settings.enabled {
        return Verdict::allow(Reason::Disabled);
    }
    if let Err(e) = check_schedule(hour, settings) {
        log::warn!("not filtering entry: {e}");
        return Verdict::allow(Reason::InvalidSchedule);
    }
    let allowed_time = settings.in_allowed_window(hour);

    if entry.short {
        return if settings.filters_category(SHORTS_CATEGORY) && !allowed_time {
            Verdict::hide(Reason::Short)
        } else {
            Verdict::allow(Reason::Short)
        };
    }

    // Channel blocks hold even inside the allowed window
    if let Some(channel) = entry.channel.as_deref()
        && settings.is_blocked_channel(channel)
    {
        return Verdict::hide(Reason::BlockedChannel {
            channel: channel.to_string(),
        });
    }

    let Some(title) = entry.title.as_deref().filter(|t| !t.trim().is_empty()) else {
        return Verdict::allow(Reason::NoTitle);
    };

    if allowed_time {
        return Verdict::allow(Reason::AllowedHours);
    }

    classify_title(classifier, title, settings)
}
